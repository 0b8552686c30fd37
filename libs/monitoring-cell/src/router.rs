// =====================================================================================
// MONITORING CELL ROUTER
// =====================================================================================

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers::{
    get_counters, get_device, get_device_alerts, get_health_status, get_overview, get_patient,
    get_time_series, list_devices, list_patients, register_device, register_patient,
    stream_events, submit_reading, update_device_status, update_patient_severity,
    MonitoringHandlers,
};
use crate::services::WardMonitor;

/// The monitor is shared with whatever feeds readings in, so it is built by the caller.
pub fn create_monitoring_router(monitor: WardMonitor) -> Router {
    let handlers = Arc::new(MonitoringHandlers::new(monitor));

    let device_routes = Router::new()
        .route("/devices", get(list_devices).post(register_device))
        .route("/devices/{device_id}", get(get_device))
        .route("/devices/{device_id}/status", put(update_device_status))
        .route("/devices/{device_id}/readings", post(submit_reading))
        .route("/devices/{device_id}/alerts", get(get_device_alerts))
        .route("/devices/{device_id}/series/{metric}", get(get_time_series))
        .with_state(handlers.clone());

    let patient_routes = Router::new()
        .route("/patients", get(list_patients).post(register_patient))
        .route("/patients/{patient_id}", get(get_patient))
        .route("/patients/{patient_id}/severity", put(update_patient_severity))
        .with_state(handlers.clone());

    let ward_routes = Router::new()
        .route("/health", get(get_health_status))
        .route("/counters", get(get_counters))
        .route("/overview", get(get_overview))
        .route("/events", get(stream_events))
        .with_state(handlers);

    Router::new()
        .merge(device_routes)
        .merge(patient_routes)
        .merge(ward_routes)
        .layer(CorsLayer::permissive())
}
