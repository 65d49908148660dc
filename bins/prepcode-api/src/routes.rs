// Route table for the API

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    let code = Router::new()
        .route("/execute", post(handlers::execute_code))
        .route("/test", post(handlers::test_code))
        .route("/submit", post(handlers::submit_code))
        .route("/languages", get(handlers::list_languages))
        .route("/progress", get(handlers::get_progress));

    Router::new()
        .nest("/code", code)
        .route("/status", get(handlers::health_check))
        .route("/metrics", get(handlers::export_metrics))
}
