//! Wallet and balance endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::{SharedState, with_node};

use super::MessageResponse;

/// Response body for the wallet endpoints.
#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub public_key: String,
    pub private_key: String,
    pub funds: f64,
}

/// Response body for `GET /balance`.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub message: String,
    pub balance: f64,
}

/// Error body for `GET /balance`, reporting whether a wallet exists.
#[derive(Debug, Serialize)]
pub struct BalanceErrorResponse {
    pub message: String,
    pub wallet_set_up: bool,
}

/// `POST /wallet`
///
/// Generates a fresh key pair, saves it, and rebinds the ledger to the
/// new identity.
pub async fn create_wallet(
    State(state): State<SharedState>,
) -> Result<(StatusCode, Json<WalletResponse>), (StatusCode, Json<MessageResponse>)> {
    match with_node(&state, |node| node.create_wallet()).await {
        Ok(summary) => Ok((
            StatusCode::CREATED,
            Json(WalletResponse {
                public_key: summary.public_key,
                private_key: summary.private_key,
                funds: summary.funds,
            }),
        )),
        Err(e) => {
            tracing::warn!("wallet creation failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new(
                    "An error occurred while saving the keys!",
                )),
            ))
        }
    }
}

/// `GET /wallet`
///
/// Loads the key pair from the wallet file and rebinds the ledger.
pub async fn load_wallet(
    State(state): State<SharedState>,
) -> Result<(StatusCode, Json<WalletResponse>), (StatusCode, Json<MessageResponse>)> {
    match with_node(&state, |node| node.load_wallet()).await {
        Ok(summary) => Ok((
            StatusCode::CREATED,
            Json(WalletResponse {
                public_key: summary.public_key,
                private_key: summary.private_key,
                funds: summary.funds,
            }),
        )),
        Err(e) => {
            tracing::warn!("wallet loading failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new(
                    "An error occurred while loading the keys!",
                )),
            ))
        }
    }
}

/// `GET /balance`
pub async fn get_balance(
    State(state): State<SharedState>,
) -> Result<Json<BalanceResponse>, (StatusCode, Json<BalanceErrorResponse>)> {
    let (balance, wallet_set_up) =
        with_node(&state, |node| (node.balance(), node.has_wallet())).await;

    match balance {
        Some(balance) => Ok(Json(BalanceResponse {
            message: "Successfully retrieved the balance!".into(),
            balance,
        })),
        None => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(BalanceErrorResponse {
                message: "It was not possible to retrieve the balance!".into(),
                wallet_set_up,
            }),
        )),
    }
}
