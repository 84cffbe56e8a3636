use std::path::PathBuf;

use restora_model::{CommandConfig, ModelSettings};

/// Log filter used when `RUST_LOG` is unset: debug for every workspace crate.
pub const DEFAULT_LOG_FILTER: &str =
    "restora_api=debug,restora_store=debug,restora_model=debug,tower_http=debug";

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins; `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted request body (default: 50 MiB).
    pub max_upload_bytes: usize,
    /// Root of the content store (default: `results`).
    pub results_dir: PathBuf,
    /// Restorations allowed to run at once; further ones wait (default: `2`).
    pub max_concurrent_restores: usize,
    /// Model tunables passed with every restoration.
    pub model: ModelSettings,
    /// How to launch the model adapter process.
    pub restorer: CommandConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default     |
    /// |---------------------------|-------------|
    /// | `HOST`                    | `0.0.0.0`   |
    /// | `PORT`                    | `5000`      |
    /// | `CORS_ORIGINS`            | `*`         |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`        |
    /// | `MAX_UPLOAD_BYTES`        | `52428800`  |
    /// | `RESULTS_DIR`             | `results`   |
    /// | `MAX_CONCURRENT_RESTORES` | `2`         |
    ///
    /// Model and adapter settings are documented on [`ModelSettings::from_env`]
    /// and [`CommandConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (50 * 1024 * 1024).to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let results_dir =
            PathBuf::from(std::env::var("RESULTS_DIR").unwrap_or_else(|_| "results".into()));

        let max_concurrent_restores: usize = std::env::var("MAX_CONCURRENT_RESTORES")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("MAX_CONCURRENT_RESTORES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            results_dir,
            max_concurrent_restores: max_concurrent_restores.max(1),
            model: ModelSettings::from_env(),
            restorer: CommandConfig::from_env(),
        }
    }

    /// Whether any origin may call the API.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_filtered() {
        assert_eq!(
            parse_origins(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(parse_origins("*"), vec!["*".to_string()]);
    }

    #[test]
    fn default_log_filter_covers_every_crate_that_logs() {
        for target in ["restora_api", "restora_store", "restora_model", "tower_http"] {
            assert!(
                DEFAULT_LOG_FILTER.contains(&format!("{target}=debug")),
                "{target} missing from default filter"
            );
        }
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }
}
