//! Peer registry endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::Value;

use crate::state::{SharedState, with_node};

use super::MessageResponse;

/// Response body carrying the full peer list.
#[derive(Debug, Serialize)]
pub struct NodesResponse {
    pub all_nodes: Vec<String>,
}

/// `POST /node`
///
/// Registers a peer endpoint (`host:port`).
pub async fn add_node(
    State(state): State<SharedState>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<NodesResponse>), (StatusCode, Json<MessageResponse>)> {
    let peer = body
        .as_ref()
        .and_then(|Json(body)| body.get("node"))
        .and_then(Value::as_str);
    let Some(peer) = peer else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse::new("No node data found!")),
        ));
    };

    let peer = peer.to_owned();
    let all_nodes = with_node(&state, move |node| node.add_peer_node(&peer)).await;
    Ok((StatusCode::CREATED, Json(NodesResponse { all_nodes })))
}

/// `DELETE /node/{node_url}`
///
/// Removes a peer endpoint. Unknown peers are ignored.
pub async fn remove_node(
    State(state): State<SharedState>,
    Path(node_url): Path<String>,
) -> (StatusCode, Json<NodesResponse>) {
    let all_nodes = with_node(&state, move |node| node.remove_peer_node(&node_url)).await;
    (StatusCode::OK, Json(NodesResponse { all_nodes }))
}

/// `GET /nodes`
pub async fn list_nodes(State(state): State<SharedState>) -> Json<NodesResponse> {
    let all_nodes = with_node(&state, |node| node.peer_nodes()).await;
    Json(NodesResponse { all_nodes })
}
