pub mod driver;
pub mod schedule;
pub mod seed;
pub mod source;

pub use driver::{enqueue, lane_for, DriverHandle, TelemetryDriver};
pub use schedule::DueSchedule;
pub use seed::{demo_devices, demo_patients, seed_demo_ward};
pub use source::{SimulatedVitalSource, VitalReadingSource};
