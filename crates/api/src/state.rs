//! Shared application state for the Axum HTTP server.

use std::sync::Arc;

use relay_common::config::AppConfig;
use relay_engine::confirmation::ConfirmationFlow;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// Present only in team-chat processes. Shared with the message router.
    pub confirmations: Option<Arc<ConfirmationFlow>>,
}

impl AppState {
    pub fn new(config: AppConfig, confirmations: Option<Arc<ConfirmationFlow>>) -> Self {
        Self {
            config,
            confirmations,
        }
    }
}
