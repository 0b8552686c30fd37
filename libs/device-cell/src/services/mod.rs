pub mod store;

pub use store::{DeviceStateStore, IngestOutcome};
