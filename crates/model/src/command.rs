//! [`Restorer`] backed by an external model adapter process.
//!
//! Each call gets a scratch directory under the configured work dir holding
//! `input.png` and an `out/` directory. The adapter receives one JSON object
//! on stdin:
//!
//! ```json
//! {"input": ".../input.png", "output_dir": ".../out", "model_path": "...",
//!  "upscale": 2, "arch": "clean", "channel_multiplier": 2, "hide_faces": []}
//! ```
//!
//! The same two paths are also exported as `RESTORA_INPUT` and
//! `RESTORA_OUTPUT_DIR`. The last non-empty stdout line must be a JSON
//! object naming the written PNGs (relative paths resolve against
//! `output_dir`):
//!
//! ```json
//! {"restored": "restored.png", "restored_faces": ["face_00.png"]}
//! ```
//!
//! Other keys (such as the adapter's `cropped_faces`) are ignored and their
//! files are never read.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::process::Command;
use uuid::Uuid;

use crate::restorer::{Enhancement, RestoreError, RestoreOptions, Restorer};
use crate::subprocess::run_command;

/// How to launch the model adapter.
#[derive(Debug, Clone)]
pub struct CommandConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Wall-clock limit for one restoration.
    pub timeout: Duration,
    /// Parent directory for per-call scratch directories.
    pub work_dir: PathBuf,
}

impl CommandConfig {
    /// Load the adapter configuration from environment variables.
    ///
    /// | Env Var                | Default              |
    /// |------------------------|----------------------|
    /// | `RESTORER_PROGRAM`     | `python3`            |
    /// | `RESTORER_ARGS`        | `scripts/restore.py` |
    /// | `RESTORE_TIMEOUT_SECS` | `600`                |
    /// | `RESTORER_WORK_DIR`    | system temp dir      |
    pub fn from_env() -> Self {
        let program = std::env::var("RESTORER_PROGRAM").unwrap_or_else(|_| "python3".into());

        let args: Vec<String> = std::env::var("RESTORER_ARGS")
            .unwrap_or_else(|_| "scripts/restore.py".into())
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let timeout_secs: u64 = std::env::var("RESTORE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("RESTORE_TIMEOUT_SECS must be a valid u64");

        let work_dir = std::env::var("RESTORER_WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir());

        Self {
            program,
            args,
            timeout: Duration::from_secs(timeout_secs),
            work_dir,
        }
    }
}

#[derive(Serialize)]
struct AdapterRequest<'a> {
    input: &'a Path,
    output_dir: &'a Path,
    #[serde(flatten)]
    options: &'a RestoreOptions,
}

#[derive(Debug, Deserialize)]
struct AdapterResponse {
    restored: PathBuf,
    #[serde(default)]
    restored_faces: Vec<PathBuf>,
}

/// Runs the model adapter once per restoration.
pub struct CommandRestorer {
    config: CommandConfig,
}

impl CommandRestorer {
    pub fn new(config: CommandConfig) -> Self {
        Self { config }
    }

    async fn run_in(
        &self,
        scratch: &Path,
        image: &[u8],
        options: &RestoreOptions,
    ) -> Result<Enhancement, RestoreError> {
        let input = scratch.join("input.png");
        let output_dir = scratch.join("out");
        fs::create_dir_all(&output_dir).await?;
        fs::write(&input, image).await?;

        let payload = serde_json::to_vec(&AdapterRequest {
            input: &input,
            output_dir: &output_dir,
            options,
        })
        .map_err(|e| RestoreError::Protocol(e.to_string()))?;

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .env("RESTORA_INPUT", &input)
            .env("RESTORA_OUTPUT_DIR", &output_dir);

        let output = run_command(&mut cmd, &payload, self.config.timeout).await?;
        if output.exit_code != 0 {
            return Err(RestoreError::Failed {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        tracing::debug!(duration_ms = output.duration_ms, "Restorer process finished");

        let response = parse_response(&output.stdout)?;

        Ok(Enhancement {
            restored_faces: read_all(&output_dir, &response.restored_faces).await?,
            restored: read_output(&output_dir, &response.restored).await?,
        })
    }
}

#[async_trait]
impl Restorer for CommandRestorer {
    async fn enhance(
        &self,
        image: &[u8],
        options: &RestoreOptions,
    ) -> Result<Enhancement, RestoreError> {
        let scratch = self
            .config
            .work_dir
            .join(format!("restora-{}", Uuid::new_v4()));
        fs::create_dir_all(&scratch).await?;

        let result = self.run_in(&scratch, image, options).await;

        if let Err(e) = fs::remove_dir_all(&scratch).await {
            tracing::warn!(path = %scratch.display(), error = %e, "Failed to remove scratch directory");
        }
        result
    }
}

/// Parse the last non-empty stdout line; model libraries tend to log to
/// stdout before it.
fn parse_response(stdout: &str) -> Result<AdapterResponse, RestoreError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .ok_or_else(|| RestoreError::Protocol("restorer produced no output".into()))?;

    serde_json::from_str(line).map_err(|e| RestoreError::Protocol(e.to_string()))
}

async fn read_output(output_dir: &Path, path: &Path) -> Result<Vec<u8>, RestoreError> {
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        output_dir.join(path)
    };
    fs::read(&full).await.map_err(|e| {
        RestoreError::Protocol(format!("cannot read output {}: {e}", full.display()))
    })
}

async fn read_all(output_dir: &Path, paths: &[PathBuf]) -> Result<Vec<Vec<u8>>, RestoreError> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        images.push(read_output(output_dir, path).await?);
    }
    Ok(images)
}
