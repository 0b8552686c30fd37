use monitoring_cell::MonitoringError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Ingest queue full, batch for device {0} rejected")]
    QueueFull(String),

    #[error("Ingest queue closed")]
    QueueClosed,

    #[error("Seed data rejected: {0}")]
    Seed(#[from] MonitoringError),
}
