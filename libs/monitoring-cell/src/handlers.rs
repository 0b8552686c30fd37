// =====================================================================================
// MONITORING CELL HANDLERS
// =====================================================================================

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use device_cell::{DeviceSnapshot, RegisterDeviceRequest, UpdateStatusRequest};
use patient_cell::{Patient, PatientSearchQuery, RegisterPatientRequest, UpdateSeverityRequest};
use shared_models::AppError;
use vitals_cell::{classify, Metric, VitalReading};

use crate::models::{
    AggregateCounters, EventFilter, HealthResponse, IngestResponse, MonitoringError,
    PatientView, ReadingRequest, TimeSeriesResponse, VitalAlert, WardOverview,
};
use crate::services::{EventReceiver, MonitoringDispatch, WardMonitor};

pub struct MonitoringHandlers {
    monitor: WardMonitor,
    dispatch: MonitoringDispatch,
}

impl MonitoringHandlers {
    pub fn new(monitor: WardMonitor) -> Self {
        let dispatch = monitor.dispatch();
        Self { monitor, dispatch }
    }
}

// =====================================================================================
// DEVICE ENDPOINTS
// =====================================================================================

pub async fn list_devices(
    State(handlers): State<Arc<MonitoringHandlers>>,
) -> Json<Vec<DeviceSnapshot>> {
    Json(handlers.dispatch.list_devices().await)
}

#[instrument(skip(handlers))]
pub async fn get_device(
    State(handlers): State<Arc<MonitoringHandlers>>,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceSnapshot>, MonitoringError> {
    Ok(Json(handlers.dispatch.get_device(&device_id).await?))
}

#[instrument(skip(handlers, request))]
pub async fn register_device(
    State(handlers): State<Arc<MonitoringHandlers>>,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceSnapshot>), MonitoringError> {
    let device = handlers.monitor.register_device(request).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

#[instrument(skip(handlers))]
pub async fn update_device_status(
    State(handlers): State<Arc<MonitoringHandlers>>,
    Path(device_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<DeviceSnapshot>, MonitoringError> {
    let device = handlers
        .monitor
        .set_device_status(&device_id, request.status)
        .await?;
    Ok(Json(device))
}

#[instrument(skip(handlers, request))]
pub async fn submit_reading(
    State(handlers): State<Arc<MonitoringHandlers>>,
    Path(device_id): Path<String>,
    Json(request): Json<ReadingRequest>,
) -> Result<Json<IngestResponse>, MonitoringError> {
    let metric: Metric = request.metric.parse()?;
    let reading = VitalReading {
        device_id,
        metric,
        value: request.value,
        timestamp: request.timestamp.unwrap_or_else(Utc::now),
    };

    let outcome = handlers.monitor.ingest(&reading).await?;
    let status = if outcome.accepted {
        classify(reading.metric, &reading.value).ok()
    } else {
        None
    };

    Ok(Json(IngestResponse {
        accepted: outcome.accepted,
        status,
        device: outcome.snapshot,
    }))
}

pub async fn get_device_alerts(
    State(handlers): State<Arc<MonitoringHandlers>>,
    Path(device_id): Path<String>,
) -> Result<Json<Vec<VitalAlert>>, MonitoringError> {
    Ok(Json(handlers.dispatch.vital_alerts(&device_id).await?))
}

pub async fn get_time_series(
    State(handlers): State<Arc<MonitoringHandlers>>,
    Path((device_id, metric_key)): Path<(String, String)>,
) -> Result<Json<TimeSeriesResponse>, MonitoringError> {
    let (metric, points) = handlers
        .dispatch
        .get_time_series_by_key(&device_id, &metric_key)
        .await?;

    Ok(Json(TimeSeriesResponse {
        device_id,
        metric,
        unit: metric.unit(),
        capacity: handlers.dispatch.history_capacity(),
        points,
    }))
}

// =====================================================================================
// PATIENT ENDPOINTS
// =====================================================================================

pub async fn list_patients(
    State(handlers): State<Arc<MonitoringHandlers>>,
    Query(query): Query<PatientSearchQuery>,
) -> Json<Vec<PatientView>> {
    Json(handlers.dispatch.search_patients(query).await)
}

pub async fn get_patient(
    State(handlers): State<Arc<MonitoringHandlers>>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientView>, MonitoringError> {
    Ok(Json(handlers.dispatch.get_patient(&patient_id).await?))
}

#[instrument(skip(handlers, request))]
pub async fn register_patient(
    State(handlers): State<Arc<MonitoringHandlers>>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<(StatusCode, Json<Patient>), MonitoringError> {
    let patient = handlers.monitor.register_patient(request).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

#[instrument(skip(handlers))]
pub async fn update_patient_severity(
    State(handlers): State<Arc<MonitoringHandlers>>,
    Path(patient_id): Path<String>,
    Json(request): Json<UpdateSeverityRequest>,
) -> Result<Json<Patient>, MonitoringError> {
    let patient = handlers
        .monitor
        .update_patient_severity(&patient_id, request.severity)
        .await?;
    info!(patient_id = %patient.id, severity = %patient.severity, "Patient severity updated");
    Ok(Json(patient))
}

// =====================================================================================
// WARD ENDPOINTS
// =====================================================================================

pub async fn get_counters(
    State(handlers): State<Arc<MonitoringHandlers>>,
) -> Json<AggregateCounters> {
    Json(handlers.dispatch.get_counters().await)
}

pub async fn get_overview(
    State(handlers): State<Arc<MonitoringHandlers>>,
) -> Json<WardOverview> {
    Json(handlers.dispatch.overview().await)
}

pub async fn get_health_status(
    State(handlers): State<Arc<MonitoringHandlers>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        devices: handlers.dispatch.device_count().await,
        patients: handlers.dispatch.patient_count().await,
        subscribers: handlers.dispatch.subscriber_count(),
        device_channels: handlers.dispatch.device_channel_count().await,
        timestamp: Utc::now(),
    })
}

// =====================================================================================
// EVENT STREAM
// =====================================================================================

pub async fn stream_events(
    ws: WebSocketUpgrade,
    State(handlers): State<Arc<MonitoringHandlers>>,
    Query(filter): Query<EventFilter>,
) -> Result<Response, MonitoringError> {
    let receiver = match filter.device_id.as_deref() {
        Some(device_id) => handlers.dispatch.subscribe_device(device_id).await?,
        None => handlers.dispatch.subscribe(),
    };

    Ok(ws.on_upgrade(move |socket| forward_events(socket, receiver)))
}

async fn forward_events(socket: WebSocket, mut receiver: EventReceiver) {
    let connection_id = Uuid::new_v4();
    let (mut sender, mut incoming) = socket.split();
    info!(%connection_id, "Event subscriber connected");

    let mut send_task = tokio::spawn(async move {
        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%connection_id, skipped, "Event subscriber lagging, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(%connection_id, "Failed to serialize monitor event: {}", e);
                    continue;
                }
            };

            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = incoming.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    debug!(%connection_id, "Event subscriber disconnected");
}

// =====================================================================================
// ERROR RESPONSE IMPLEMENTATION
// =====================================================================================

impl From<MonitoringError> for AppError {
    fn from(error: MonitoringError) -> Self {
        match error {
            MonitoringError::UnknownDevice(_) | MonitoringError::NotFound(_) => {
                AppError::NotFound(error.to_string())
            }
            MonitoringError::UnsupportedMetric(_) | MonitoringError::InvalidReading(_) => {
                AppError::BadRequest(error.to_string())
            }
            MonitoringError::Validation(message) => AppError::ValidationError(message),
            MonitoringError::Conflict(message) => AppError::Conflict(message),
        }
    }
}

impl IntoResponse for MonitoringError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
