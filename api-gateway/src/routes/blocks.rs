//! Mining, block intake, chain listing, and conflict resolution.

use std::time::Instant;

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use serde_json::Value;

use chain::{Block, BlockIngest, NodeError};

use crate::state::{SharedState, with_node};

use super::MessageResponse;

/// Success body for `POST /mine`.
#[derive(Debug, Serialize)]
pub struct MineResponse {
    pub message: String,
    pub block: Block,
    pub funds: f64,
}

/// Error body for `POST /mine`, reporting whether a wallet exists.
#[derive(Debug, Serialize)]
pub struct MineErrorResponse {
    pub message: String,
    pub wallet_set_up: bool,
}

/// Response body for `POST /resolveConflicts`.
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub message: String,
    pub replaced: bool,
}

/// `POST /mine`
///
/// Refused with 409 while the conflict flag is set; otherwise mines the
/// pending pool into a new block and broadcasts it.
pub async fn mine(
    State(state): State<SharedState>,
) -> Result<(StatusCode, Json<MineResponse>), (StatusCode, Json<MineErrorResponse>)> {
    let start = Instant::now();
    let outcome = with_node(&state, |node| {
        let block = node.mine()?;
        Ok::<_, NodeError>((block, node.balance().unwrap_or(0.0)))
    })
    .await;

    match outcome {
        Ok((block, funds)) => {
            state
                .metrics
                .node
                .mining_seconds
                .observe(start.elapsed().as_secs_f64());
            state.metrics.node.blocks_mined.inc();
            Ok((
                StatusCode::CREATED,
                Json(MineResponse {
                    message: "A new block was successfully mined!".into(),
                    block,
                    funds,
                }),
            ))
        }
        Err(NodeError::ConflictPending) => Err((
            StatusCode::CONFLICT,
            Json(MineErrorResponse {
                message: "Resolve conflicts first, block not added!".into(),
                wallet_set_up: true,
            }),
        )),
        Err(e) => {
            tracing::warn!("mining failed: {e}");
            let wallet_set_up = with_node(&state, |node| node.has_wallet()).await;
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MineErrorResponse {
                    message: "It was not possible to mine a new block!".into(),
                    wallet_set_up,
                }),
            ))
        }
    }
}

/// `POST /broadcastBlock`
///
/// Intake for blocks broadcast by peers. Replies 200 when the block was
/// appended or when we notice we are behind (which raises the local
/// conflict flag), and 409 when the block is invalid or stale. Rejecting
/// a block never raises OUR conflict flag.
pub async fn receive_block(
    State(state): State<SharedState>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<MessageResponse>), (StatusCode, Json<MessageResponse>)> {
    let Some(Json(body)) = body else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse::new("No necessary data found in the request!")),
        ));
    };
    let Some(block_value) = body.get("block") else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse::new("Some data is missing in the request!")),
        ));
    };
    let block: Block = match serde_json::from_value(block_value.clone()) {
        Ok(block) => block,
        Err(e) => {
            tracing::warn!("malformed block in broadcast: {e}");
            return Err((
                StatusCode::BAD_REQUEST,
                Json(MessageResponse::new("Some data is missing in the request!")),
            ));
        }
    };

    match with_node(&state, move |node| node.receive_block(block)).await {
        BlockIngest::Appended => {
            state.metrics.node.blocks_received.inc();
            Ok((StatusCode::OK, Json(MessageResponse::new("Block added!"))))
        }
        BlockIngest::Behind => Ok((
            StatusCode::OK,
            Json(MessageResponse::new(
                "Blockchain seems to differ from the local blockchain!",
            )),
        )),
        BlockIngest::Invalid => Err((
            StatusCode::CONFLICT,
            Json(MessageResponse::new("The broadcast block seems invalid!")),
        )),
        BlockIngest::Stale => Err((
            StatusCode::CONFLICT,
            Json(MessageResponse::new(
                "Blockchain seems to be shorter, block not added!",
            )),
        )),
    }
}

/// `POST /resolveConflicts`
///
/// Surveys every peer's chain and adopts the longest valid one.
pub async fn resolve_conflicts(State(state): State<SharedState>) -> Json<ResolveResponse> {
    let replaced = with_node(&state, |node| node.resolve()).await;
    if replaced {
        state.metrics.node.chain_replacements.inc();
    }
    Json(ResolveResponse {
        message: if replaced {
            "Chain was replaced!".into()
        } else {
            "Local chain kept!".into()
        },
        replaced,
    })
}

/// `GET /chain`
pub async fn get_chain(State(state): State<SharedState>) -> Json<Vec<Block>> {
    Json(with_node(&state, |node| node.chain()).await)
}
