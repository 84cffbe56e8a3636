//! Raw file access to the content store.

use axum::routing::get;
use axum::Router;

use crate::handlers::files;
use crate::state::AppState;

/// ```text
/// GET    /img/{*path}       -> fetch, e.g. /img/<hash>/faces/00.png
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/img/{*path}", get(files::fetch))
}
