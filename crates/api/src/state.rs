use std::sync::Arc;

use restora_store::ContentStore;

use crate::background::Restorations;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Content store holding originals and restoration results.
    pub store: Arc<ContentStore>,
    /// Background restoration runner (model handle, permits, job registry).
    pub restorations: Restorations,
}
