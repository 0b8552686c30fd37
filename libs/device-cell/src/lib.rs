// =====================================================================================
// DEVICE CELL - DEVICE REGISTRY & STATE STORE
// =====================================================================================
//
// Owns the latest snapshot of every registered bedside device. Snapshots change only
// through ingestion (vitals) and explicit status transitions driven from outside.
//
// =====================================================================================

pub mod error;
pub mod models;
pub mod services;

pub use error::DeviceError;
pub use models::*;
pub use services::{DeviceStateStore, IngestOutcome};
