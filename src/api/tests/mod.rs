use super::*;
use crate::error::Error;
use crate::types::TaskResult;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::ServiceExt;

mod system;

const BOUNDARY: &str = "----ParallelIngestBoundary7MA4YWxk";

/// Ingester that echoes filenames, rejects `bad*` files, and tracks how many
/// loads overlap.
#[derive(Default)]
struct StubIngester {
    loaded: Mutex<Vec<(String, String)>>,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl StubIngester {
    /// `(original_filename, contents)` pairs in the order loads started
    fn loaded(&self) -> Vec<(String, String)> {
        self.loaded.lock().unwrap().clone()
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentIngester for StubIngester {
    async fn load_document(&self, path: &Path, original_filename: &str) -> Result<TaskResult> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let contents = tokio::fs::read_to_string(path).await?;
        self.loaded
            .lock()
            .unwrap()
            .push((original_filename.to_string(), contents));

        tokio::time::sleep(Duration::from_millis(10)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);

        if original_filename.starts_with("bad") {
            return Err(Error::Ingest(format!("cannot parse {original_filename}")));
        }
        Ok(TaskResult::success(format!("{original_filename} loaded")))
    }
}

/// Config whose staged files go to `dir`
fn test_config(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.ingest.temp_dir = Some(dir.path().to_path_buf());
    config
}

/// Build a multipart body from `(field, filename, contents)` parts
fn multipart_body(parts: &[(&str, &str, &str)]) -> String {
    let mut body = String::new();
    for (field, filename, contents) in parts {
        body.push_str(&format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/pdf\r\n\
             \r\n\
             {contents}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

fn upload_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).expect("Response should be valid JSON")
}

fn staged_files_left(dir: &tempfile::TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

#[tokio::test]
async fn test_api_server_stops_on_shutdown_signal() {
    let mut config = Config::default();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(start_api_server_with_shutdown(
        Arc::new(StubIngester::default()),
        Arc::new(config),
        async move {
            let _ = stop_rx.await;
        },
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    stop_tx.send(()).unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn test_api_server_rejects_invalid_config() {
    let mut config = Config::default();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    config.executor.max_workers = 0;

    let outcome = start_api_server_with_shutdown(
        Arc::new(StubIngester::default()),
        Arc::new(config),
        std::future::pending(),
    )
    .await;

    assert!(matches!(outcome, Err(Error::Config { ref key, .. }) if key.as_deref() == Some("max_workers")));
}

#[tokio::test]
async fn test_cors_enabled() {
    let mut config = Config::default();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let app = create_router(Arc::new(StubIngester::default()), Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = Config::default();
    config.api.cors_enabled = false;
    let app = create_router(Arc::new(StubIngester::default()), Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let mut config = Config::default();
    config.api.cors_origins = vec!["http://allowed.example".to_string()];
    let app = create_router(Arc::new(StubIngester::default()), Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://allowed.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://allowed.example"
    );
}

#[tokio::test]
async fn test_swagger_ui_spec_route_follows_config() {
    for enabled in [true, false] {
        let mut config = Config::default();
        config.api.swagger_ui = enabled;
        let app = create_router(Arc::new(StubIngester::default()), Arc::new(config));

        let response = app
            .oneshot(
                Request::builder()
                    .uri(SWAGGER_SPEC_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let expected = if enabled {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        };
        assert_eq!(response.status(), expected, "swagger_ui = {enabled}");
    }
}
