pub mod aggregator;
pub mod dispatch;
pub mod notifications;
pub mod ward;

pub use aggregator::{compute_counters, device_alerts, patient_views, vital_alerts};
pub use dispatch::MonitoringDispatch;
pub use notifications::{EventReceiver, NotificationService};
pub use ward::WardMonitor;
