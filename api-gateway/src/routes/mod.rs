//! HTTP route handlers, grouped by concern.

pub mod blocks;
pub mod nodes;
pub mod transactions;
pub mod ui;
pub mod wallet;

use serde::Serialize;

/// Generic `{message}` body used by error and status responses.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
