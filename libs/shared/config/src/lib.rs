use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub history_capacity: usize,
    pub tick_interval_seconds: u64,
    pub honor_sampling_intervals: bool,
    pub ingest_queue_capacity: usize,
    pub notification_channel_capacity: usize,
    pub simulation_enabled: bool,
    pub seed_demo_ward: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            history_capacity: 6,
            tick_interval_seconds: 5,
            honor_sampling_intervals: true,
            ingest_queue_capacity: 256,
            notification_channel_capacity: 1000,
            simulation_enabled: true,
            seed_demo_ward: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            bind_address: env::var("MONITOR_BIND_ADDR").unwrap_or_else(|_| {
                warn!("MONITOR_BIND_ADDR not set, using default");
                defaults.bind_address.clone()
            }),
            history_capacity: parse_var("HISTORY_CAPACITY", defaults.history_capacity),
            tick_interval_seconds: parse_var("TICK_INTERVAL_SECONDS", defaults.tick_interval_seconds),
            honor_sampling_intervals: parse_var(
                "HONOR_SAMPLING_INTERVALS",
                defaults.honor_sampling_intervals,
            ),
            ingest_queue_capacity: parse_var("INGEST_QUEUE_CAPACITY", defaults.ingest_queue_capacity),
            notification_channel_capacity: parse_var(
                "NOTIFICATION_CHANNEL_CAPACITY",
                defaults.notification_channel_capacity,
            ),
            simulation_enabled: parse_var("SIMULATION_ENABLED", defaults.simulation_enabled),
            seed_demo_ward: parse_var("SEED_DEMO_WARD", defaults.seed_demo_ward),
        };

        if !config.is_valid() {
            warn!("Telemetry configuration has zero-sized capacities or tick, falling back to defaults for those values");
            return config.with_valid_sizes();
        }

        config
    }

    /// Capacities and the tick must be non-zero for the pipeline to make progress.
    pub fn is_valid(&self) -> bool {
        self.history_capacity > 0
            && self.tick_interval_seconds > 0
            && self.ingest_queue_capacity > 0
            && self.notification_channel_capacity > 0
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds)
    }

    fn with_valid_sizes(mut self) -> Self {
        let defaults = Self::default();
        if self.history_capacity == 0 {
            self.history_capacity = defaults.history_capacity;
        }
        if self.tick_interval_seconds == 0 {
            self.tick_interval_seconds = defaults.tick_interval_seconds;
        }
        if self.ingest_queue_capacity == 0 {
            self.ingest_queue_capacity = defaults.ingest_queue_capacity;
        }
        if self.notification_channel_capacity == 0 {
            self.notification_channel_capacity = defaults.notification_channel_capacity;
        }
        self
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {:?}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
