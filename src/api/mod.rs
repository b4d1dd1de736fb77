//! REST API server module
//!
//! Exposes single and parallel document upload over HTTP, plus health and
//! OpenAPI endpoints.

use crate::{Config, DocumentIngester, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Path the Swagger UI loads the OpenAPI document from
const SWAGGER_SPEC_PATH: &str = "/api-docs/openapi.json";

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Documents
/// - `POST /documents` - Ingest one uploaded file
/// - `POST /documents/batch` - Ingest several uploaded files in parallel
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(ingester: Arc<dyn DocumentIngester>, config: Arc<Config>) -> Router {
    let state = AppState::new(ingester, config.clone());

    let router = Router::new()
        // Documents
        .route("/documents", post(routes::ingest_document))
        .route("/documents/batch", post(routes::ingest_documents_batch))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // Merge Swagger UI routes if enabled in config (before applying state).
    // It serves its own copy of the spec so it cannot collide with /openapi.json.
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url(SWAGGER_SPEC_PATH, ApiDoc::openapi()))
    } else {
        router
    };

    // Multipart bodies are capped by the upload limit instead of axum's 2 MB default
    let router = router
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.ingest.max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` anywhere in the list, or an empty list, allows any origin.
/// Origins that are not valid header values are skipped.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Validates `config`, binds, and serves until SIGINT or SIGTERM (Ctrl+C on
/// non-unix platforms). In-flight requests are allowed to finish before this
/// returns.
///
/// # Example
///
/// ```no_run
/// use parallel_ingest::{Config, DocumentIngester, Result, TaskResult};
/// use async_trait::async_trait;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// struct Echo;
///
/// #[async_trait]
/// impl DocumentIngester for Echo {
///     async fn load_document(&self, _path: &Path, name: &str) -> Result<TaskResult> {
///         Ok(TaskResult::success(format!("{name} loaded")))
///     }
/// }
///
/// # async fn example() -> Result<()> {
/// let config = Arc::new(Config::default());
/// parallel_ingest::api::start_api_server(Arc::new(Echo), config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(ingester: Arc<dyn DocumentIngester>, config: Arc<Config>) -> Result<()> {
    start_api_server_with_shutdown(ingester, config, crate::wait_for_signal()).await
}

/// Start the API server and stop it gracefully once `shutdown` resolves.
pub async fn start_api_server_with_shutdown<S>(
    ingester: Arc<dyn DocumentIngester>,
    config: Arc<Config>,
    shutdown: S,
) -> Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    config.validate()?;
    let bind_address = config.api.bind_address;

    tracing::info!(
        address = %bind_address,
        max_workers = config.executor.max_workers,
        "Starting API server"
    );

    let app = create_router(ingester, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().unwrap_or(bind_address),
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
