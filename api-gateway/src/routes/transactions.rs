//! Transaction endpoints: local submission, peer broadcast intake, and
//! the pending pool listing.
//!
//! Request bodies are taken as loose JSON and validated field by field so
//! that a missing field yields 400 rather than a generic extractor
//! rejection.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use serde_json::Value;

use chain::{NodeError, Transaction};

use crate::state::{SharedState, with_node};

use super::MessageResponse;

/// Success body for `POST /transaction`.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub message: String,
    pub transaction: Transaction,
    pub funds: f64,
}

fn bad_request(message: &str) -> (StatusCode, Json<MessageResponse>) {
    (StatusCode::BAD_REQUEST, Json(MessageResponse::new(message)))
}

/// `POST /transaction`
///
/// Signs a transaction with the hosting wallet, admits it, and broadcasts
/// it to the known peers.
pub async fn add_transaction(
    State(state): State<SharedState>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<TransactionResponse>), (StatusCode, Json<MessageResponse>)> {
    if !with_node(&state, |node| node.has_wallet()).await {
        return Err(bad_request("No wallet correctly setup!"));
    }

    let Some(Json(body)) = body else {
        return Err(bad_request("No necessary data found in the request!"));
    };
    let Some(recipient) = body.get("recipient").and_then(Value::as_str) else {
        return Err(bad_request(
            "There are required fields missing in the request!",
        ));
    };
    let Some(amount) = body.get("amount").and_then(Value::as_f64) else {
        return Err(bad_request(
            "There are required fields missing in the request!",
        ));
    };

    let recipient = recipient.to_owned();
    let outcome = with_node(&state, move |node| {
        let tx = node.submit_transaction(&recipient, amount)?;
        Ok::<_, NodeError>((tx, node.balance().unwrap_or(0.0)))
    })
    .await;

    match outcome {
        Ok((transaction, funds)) => {
            state.metrics.node.transactions_admitted.inc();
            Ok((
                StatusCode::CREATED,
                Json(TransactionResponse {
                    message: "Successfully added a new transaction!".into(),
                    transaction,
                    funds,
                }),
            ))
        }
        Err(e) => {
            tracing::warn!("transaction submission failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new(
                    "An error occurred while creating a new transaction!",
                )),
            ))
        }
    }
}

/// `POST /broadcast`
///
/// Intake for transactions broadcast by peers; admits without
/// re-broadcasting.
pub async fn receive_broadcast(
    State(state): State<SharedState>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<MessageResponse>), (StatusCode, Json<MessageResponse>)> {
    let Some(Json(body)) = body else {
        return Err(bad_request("No necessary data found in the request!"));
    };
    let (Some(sender), Some(recipient), Some(signature), Some(amount)) = (
        body.get("sender").and_then(Value::as_str),
        body.get("recipient").and_then(Value::as_str),
        body.get("signature").and_then(Value::as_str),
        body.get("amount").and_then(Value::as_f64),
    ) else {
        return Err(bad_request("Some data is missing in the request!"));
    };

    let tx = Transaction::new(sender, recipient, amount, signature);
    match with_node(&state, move |node| node.receive_transaction(tx)).await {
        Ok(()) => {
            state.metrics.node.transactions_admitted.inc();
            Ok((
                StatusCode::CREATED,
                Json(MessageResponse::new("Successfully added the transaction!")),
            ))
        }
        Err(e) => {
            tracing::warn!("broadcast transaction rejected: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new("Creating a transaction failed!")),
            ))
        }
    }
}

/// `GET /transactions`
pub async fn open_transactions(State(state): State<SharedState>) -> Json<Vec<Transaction>> {
    Json(with_node(&state, |node| node.open_transactions()).await)
}
