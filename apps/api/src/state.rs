use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::engine::JobEngine;
use crate::registry::FileRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Uploaded CV/JD binaries; append/read-only during a job's lifetime.
    pub registry: Arc<FileRegistry>,
    /// Owns the job map and per-job workers; holds the optional LLM backend.
    pub engine: Arc<JobEngine>,
    pub config: Config,
}
