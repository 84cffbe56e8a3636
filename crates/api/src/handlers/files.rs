//! Serving raw files from the content store.

use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /img/{*path}
///
/// Raw bytes of a stored file. Paths that would leave the store root are
/// rejected with 400; missing files are 404.
pub async fn fetch(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<impl IntoResponse> {
    let bytes = state.store.resolve_file(&path).await?;
    Ok(([(CONTENT_TYPE, content_type_for(&path))], bytes))
}

fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for("abc/faces/00.png"), "image/png");
        assert_eq!(content_type_for("abc/photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("abc/notes"), "application/octet-stream");
    }
}
