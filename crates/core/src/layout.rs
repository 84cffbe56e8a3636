//! On-disk layout of a result directory.
//!
//! ```text
//! <root>/<hash>/original.png
//! <root>/<hash>/restored.png        (once a restoration finished)
//! <root>/<hash>/faces/00.png        (one per restored face)
//! ```
//!
//! Clients see the same names relative to the hash directory, e.g.
//! `/original.png` or `/faces/01.png`.

/// File name of the uploaded image, always re-encoded as PNG.
pub const ORIGINAL_FILE: &str = "original.png";

/// File name of the restored composite image.
pub const RESTORED_FILE: &str = "restored.png";

/// Sub-directory holding the restored face crops.
pub const FACES_DIR: &str = "faces";

/// Extension shared by every stored image.
pub const IMAGE_EXTENSION: &str = "png";

/// File name for the face at `index`: two-digit, zero-padded.
pub fn face_file_name(index: usize) -> String {
    format!("{index:02}.{IMAGE_EXTENSION}")
}

/// Recover the face index from a file name produced by [`face_file_name`].
///
/// Returns `None` for anything that is not `<digits>.png`.
pub fn parse_face_index(file_name: &str) -> Option<usize> {
    let stem = file_name.strip_suffix(".png")?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// Client-facing path of the original image.
pub fn original_ref() -> String {
    format!("/{ORIGINAL_FILE}")
}

/// Client-facing path of the restored image.
pub fn restored_ref() -> String {
    format!("/{RESTORED_FILE}")
}

/// Client-facing path of a face crop.
pub fn face_ref(file_name: &str) -> String {
    format!("/{FACES_DIR}/{file_name}")
}
