use axum::{routing::get, Router};

use monitoring_cell::{create_monitoring_router, WardMonitor};

pub fn create_router(monitor: WardMonitor) -> Router {
    Router::new()
        .route("/", get(|| async { "Ward Monitor API is running!" }))
        .merge(create_monitoring_router(monitor))
}
