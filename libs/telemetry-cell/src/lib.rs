// =====================================================================================
// TELEMETRY CELL - READING SOURCES, SCHEDULING & INGESTION QUEUE
// =====================================================================================
//
// This cell feeds the ward monitor:
// - Pluggable reading sources, with a simulator for bedside monitors
// - A shared scheduler that honors each device's sampling interval
// - Bounded per-device ingestion lanes drained by a worker pool
// - The demo ward used when no real devices are attached
//
// =====================================================================================

pub mod error;
pub mod models;
pub mod services;

pub use error::TelemetryError;
pub use models::{DeviceBatch, DriverConfig, DriverStats, DriverStatsSnapshot};
pub use services::{
    enqueue, lane_for, seed_demo_ward, DriverHandle, DueSchedule, SimulatedVitalSource,
    TelemetryDriver, VitalReadingSource,
};
