//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the parallel-ingest REST API using
//! utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the parallel-ingest REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "parallel-ingest REST API",
        version = "0.1.0",
        description = "Upload documents and load them into a knowledge base, one at a time or in parallel batches",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:7864", description = "Local development server")
    ),
    paths(
        // Documents
        crate::api::routes::ingest_document,
        crate::api::routes::ingest_documents_batch,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Result types from types.rs
        crate::types::TaskResult,
        crate::types::BatchSummary,

        // Config types from config.rs
        crate::config::Config,
        crate::config::ExecutorConfig,
        crate::config::IngestConfig,
        crate::config::ApiConfig,

        // API request/response types
        crate::api::routes::BatchIngestResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "documents", description = "Document ingestion - Upload one file or a batch processed in parallel"),
        (name = "system", description = "System endpoints - Health checks and the OpenAPI spec"),
    )
)]
pub struct ApiDoc;
