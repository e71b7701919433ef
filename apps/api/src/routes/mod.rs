pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Bulk scoring API
        .route("/api/v1/bulk/upload-cvs", post(handlers::handle_upload_cvs))
        .route("/api/v1/bulk/upload-jds", post(handlers::handle_upload_jds))
        .route("/api/v1/bulk/upload-csv", post(handlers::handle_upload_csv))
        .route(
            "/api/v1/bulk/process-bulk",
            post(handlers::handle_process_bulk),
        )
        .route("/api/v1/bulk/status/:job_id", get(handlers::handle_status))
        .route(
            "/api/v1/bulk/download/:job_id",
            get(handlers::handle_download),
        )
        .route("/api/v1/bulk/template", get(handlers::handle_template))
        // Single-pair scoring
        .route("/api/v1/score", post(handlers::handle_score_pair))
        .with_state(state)
}
