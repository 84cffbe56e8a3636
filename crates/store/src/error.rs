/// Errors from the content store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No original (or no file) exists for the requested key.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A relative path tried to leave the store root or is malformed.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Uploaded bytes could not be decoded as an image.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Encoding an image failed.
    #[error("Image encoding failed: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
