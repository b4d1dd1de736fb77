//! Application state for the API server

use crate::{Config, DocumentIngester};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clones).
#[derive(Clone)]
pub struct AppState {
    /// Loads each uploaded document
    pub ingester: Arc<dyn DocumentIngester>,

    /// Configuration; an executor is built from it per batch request
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(ingester: Arc<dyn DocumentIngester>, config: Arc<Config>) -> Self {
        Self { ingester, config }
    }
}
