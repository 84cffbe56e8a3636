//! The restoration interface and its shared types.

use async_trait::async_trait;
use serde::Serialize;

/// Per-call options for a restoration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreOptions {
    /// Path of the pretrained weights.
    pub model_path: String,
    /// Final upsampling factor of the composite image.
    pub upscale: u32,
    /// Model architecture variant (e.g. `clean`, `original`).
    pub arch: String,
    pub channel_multiplier: u32,
    /// Face indices to leave out of enhancement and compositing.
    pub hide_faces: Vec<u32>,
}

/// Output of one restoration, all images PNG encoded.
#[derive(Debug, Clone, Default)]
pub struct Enhancement {
    /// Enhanced faces, ordered by detection index.
    pub restored_faces: Vec<Vec<u8>>,
    /// Full image with enhanced faces pasted back.
    pub restored: Vec<u8>,
}

/// Errors that can occur while running a restoration.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    /// The model process could not be started.
    #[error("Failed to start restorer: {0}")]
    Spawn(#[source] std::io::Error),

    /// The model exceeded its configured timeout and was killed.
    #[error("Restorer timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The model ran but exited unsuccessfully.
    #[error("Restorer failed with exit code {exit_code}: {stderr}")]
    Failed { exit_code: i32, stderr: String },

    /// The model's output did not follow the adapter protocol.
    #[error("Malformed restorer output: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A loaded face restoration model.
///
/// Implementations are shared across concurrently running restoration
/// tasks behind an `Arc`, so they must be safe for concurrent use.
#[async_trait]
pub trait Restorer: Send + Sync {
    /// Detect, enhance and paste back the faces in `image` (PNG bytes).
    async fn enhance(
        &self,
        image: &[u8],
        options: &RestoreOptions,
    ) -> Result<Enhancement, RestoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_timeout() {
        let err = RestoreError::Timeout { elapsed_ms: 5000 };
        assert_eq!(err.to_string(), "Restorer timed out after 5000ms");
    }

    #[test]
    fn display_failed() {
        let err = RestoreError::Failed {
            exit_code: 1,
            stderr: "CUDA out of memory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Restorer failed with exit code 1: CUDA out of memory"
        );
    }

    #[test]
    fn spawn_error_keeps_source() {
        let err = RestoreError::Spawn(std::io::Error::other("no python"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn options_serialize_flat() {
        let options = RestoreOptions {
            model_path: "weights.pth".into(),
            upscale: 2,
            arch: "clean".into(),
            channel_multiplier: 2,
            hide_faces: vec![1, 3],
        };
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["upscale"], 2);
        assert_eq!(json["arch"], "clean");
        assert_eq!(json["hide_faces"], serde_json::json!([1, 3]));
    }
}
