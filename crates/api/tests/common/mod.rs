#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use tokio::sync::Notify;
use tower::ServiceExt;

use restora_api::background::Restorations;
use restora_api::config::ServerConfig;
use restora_api::router::build_app_router;
use restora_api::state::AppState;
use restora_model::{
    CommandConfig, Enhancement, ModelSettings, RestoreError, RestoreOptions, Restorer,
};
use restora_store::ContentStore;

const BOUNDARY: &str = "restora-test-boundary";

/// Build a test `ServerConfig` rooted at `results_dir`.
pub fn test_config(results_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["*".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 10 * 1024 * 1024,
        results_dir,
        max_concurrent_restores: 2,
        model: ModelSettings::default(),
        restorer: CommandConfig {
            program: "false".to_string(),
            args: vec![],
            timeout: Duration::from_secs(5),
            work_dir: std::env::temp_dir(),
        },
    }
}

/// Restorer double: echoes the input as the restored image and returns
/// `faces` small PNGs, or fails when `fail` is set.
pub struct StubRestorer {
    pub faces: usize,
    pub fail: bool,
    /// `hide_faces` of every call, in call order.
    pub calls: Mutex<Vec<Vec<u32>>>,
}

impl StubRestorer {
    pub fn with_faces(faces: usize) -> Arc<Self> {
        Arc::new(Self {
            faces,
            fail: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            faces: 0,
            fail: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Vec<u32>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Restorer for StubRestorer {
    async fn enhance(
        &self,
        image: &[u8],
        options: &RestoreOptions,
    ) -> Result<Enhancement, RestoreError> {
        self.calls.lock().unwrap().push(options.hide_faces.clone());
        if self.fail {
            return Err(RestoreError::Failed {
                exit_code: 1,
                stderr: "no faces could be aligned".to_string(),
            });
        }
        Ok(Enhancement {
            restored_faces: (0..self.faces).map(|i| png([i as u8, 0, 0])).collect(),
            restored: image.to_vec(),
        })
    }
}

/// Restorer double that parks inside `enhance`: signals `entered`, then
/// waits for `release` before echoing its input with one face.
#[derive(Default)]
pub struct GatedRestorer {
    pub entered: Notify,
    pub release: Notify,
}

impl GatedRestorer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl Restorer for GatedRestorer {
    async fn enhance(
        &self,
        image: &[u8],
        _options: &RestoreOptions,
    ) -> Result<Enhancement, RestoreError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Enhancement {
            restored_faces: vec![png([1, 1, 1])],
            restored: image.to_vec(),
        })
    }
}

/// A running test application with its own results directory.
pub struct TestApp {
    pub dir: tempfile::TempDir,
    pub router: Router,
}

impl TestApp {
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn results_dir(&self) -> PathBuf {
        self.dir.path().join("results")
    }
}

/// Build the full application router (same middleware stack as production)
/// around the given restorer.
pub async fn build_test_app(restorer: Arc<dyn Restorer>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path().join("results"));

    let store = Arc::new(ContentStore::open(&config.results_dir).await.unwrap());
    let restorations = Restorations::new(
        Arc::clone(&store),
        restorer,
        config.model.clone(),
        config.max_concurrent_restores,
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        restorations,
    };

    TestApp {
        router: build_app_router(state, &config),
        dir,
    }
}

/// Encode a small solid-colour PNG.
pub fn png(rgb: [u8; 3]) -> Vec<u8> {
    encode(ImageFormat::Png, rgb)
}

pub fn encode(format: ImageFormat, rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 6, Rgb(rgb));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// One multipart form field.
pub enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        bytes: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                name,
                filename,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(app: Router, uri: &str, parts: &[Part<'_>]) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Submit an image upload to `POST /restore`.
pub async fn submit_image(app: Router, bytes: &[u8]) -> Response<Body> {
    post_multipart(
        app,
        "/restore",
        &[Part::File {
            name: "image",
            filename: "img.png",
            bytes,
        }],
    )
    .await
}

/// Submit a hash reference to `POST /restore`.
pub async fn submit_hash(app: Router, hash: &str) -> Response<Body> {
    post_multipart(
        app,
        "/restore",
        &[Part::Text {
            name: "hash",
            value: hash,
        }],
    )
    .await
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Poll `GET /restore/{hash}` until the job leaves `pending`.
pub async fn wait_until_settled(app: &Router, hash: &str) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let json = body_json(get(app.clone(), &format!("/restore/{hash}")).await).await;
        if json["status"] != "pending" {
            return json;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "restoration for {hash} did not settle"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
