// =====================================================================================
// MONITORING CELL - WARD AGGREGATION, NOTIFICATION & DISPATCH
// =====================================================================================
//
// This cell ties devices and patients into one ward view:
// - Ingestion entry point that notifies subscribers and raises vital alerts
// - Dashboard counters and per-device out-of-range badges
// - Patient projection joined with linked device vitals
// - Read-only dispatch boundary and the HTTP/WebSocket surface over it
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export commonly used types
pub use models::{
    AggregateCounters, AlertEvent, DeviceAlerts, LatestVitals, MonitorEvent, MonitoringError,
    PatientView, VitalAlert, WardOverview,
};

pub use services::{
    compute_counters, vital_alerts, EventReceiver, MonitoringDispatch, NotificationService,
    WardMonitor,
};

pub use handlers::MonitoringHandlers;
pub use router::create_monitoring_router;
