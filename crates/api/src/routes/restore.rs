//! Route definitions for the `/restore` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::restore;
use crate::state::AppState;

/// Routes mounted at the root.
///
/// ```text
/// POST   /restore           -> submit (multipart: image | hash, hide_faces)
/// GET    /restore/{hash}    -> lookup
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restore", post(restore::submit))
        .route("/restore/{hash}", get(restore::lookup))
}
