//! Decoding uploads and re-encoding them as PNG.

use std::io::Cursor;

use image::ImageFormat;

use crate::error::{StoreError, StoreResult};

/// Decode `bytes` (PNG, JPEG or WebP) and re-encode them as PNG.
///
/// Decoding is CPU bound, so it runs on the blocking pool.
pub async fn reencode_png(bytes: Vec<u8>) -> StoreResult<Vec<u8>> {
    tokio::task::spawn_blocking(move || reencode_png_sync(&bytes))
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(format!("spawn_blocking failed: {e}"))))?
}

fn reencode_png_sync(bytes: &[u8]) -> StoreResult<Vec<u8>> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| StoreError::InvalidImage(e.to_string()))?;

    let mut out = Cursor::new(Vec::new());
    decoded
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| StoreError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}


#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::test_images::solid;
    use super::*;

    #[tokio::test]
    async fn jpeg_is_reencoded_as_png() {
        let jpeg = solid(ImageFormat::Jpeg, [200, 10, 10]);
        let png = reencode_png(jpeg).await.unwrap();

        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[tokio::test]
    async fn garbage_is_rejected() {
        let result = reencode_png(b"definitely not an image".to_vec()).await;
        assert_matches!(result, Err(StoreError::InvalidImage(_)));
    }
}
