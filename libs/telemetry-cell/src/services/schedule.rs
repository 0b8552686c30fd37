use std::collections::HashMap;
use std::time::{Duration, Instant};

use device_cell::DeviceSnapshot;

/// Ticks land a little early or late; a device counts as due within this margin.
const SCHEDULE_SLACK: Duration = Duration::from_millis(250);

/// Decides which devices emit on a tick. Only online devices are ever due.
#[derive(Debug, Default)]
pub struct DueSchedule {
    next_due: HashMap<String, Instant>,
}

impl DueSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Devices due at `now`. When intervals are honored each device is due once its own
    /// sampling interval has elapsed since it last emitted; otherwise every online device
    /// is due on every tick.
    pub fn due<'a>(
        &mut self,
        devices: &'a [DeviceSnapshot],
        now: Instant,
        honor_intervals: bool,
    ) -> Vec<&'a DeviceSnapshot> {
        let mut due = Vec::new();

        for device in devices.iter().filter(|d| d.status.is_online()) {
            if !honor_intervals {
                due.push(device);
                continue;
            }

            let is_due = match self.next_due.get(&device.id) {
                Some(next) => next.saturating_duration_since(now) <= SCHEDULE_SLACK,
                None => true,
            };
            if is_due {
                self.next_due
                    .insert(device.id.clone(), now + device.sampling_interval.as_duration());
                due.push(device);
            }
        }

        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use device_cell::{DeviceStatus, DeviceType, SamplingInterval};

    fn device(id: &str, seconds: u32, status: DeviceStatus) -> DeviceSnapshot {
        DeviceSnapshot {
            id: id.to_string(),
            name: id.to_string(),
            device_type: DeviceType::HeartRateMonitor,
            serial_number: String::new(),
            sampling_interval: SamplingInterval::try_from(seconds).unwrap(),
            status,
            last_update: None,
            patient_id: None,
            patient_name: None,
            vitals: Default::default(),
            registered_at: Utc::now(),
        }
    }

    fn ids(due: Vec<&DeviceSnapshot>) -> Vec<&str> {
        due.into_iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn honors_each_device_interval() {
        let devices = vec![
            device("fast", 1, DeviceStatus::Online),
            device("slow", 5, DeviceStatus::Online),
        ];
        let start = Instant::now();
        let mut schedule = DueSchedule::new();

        assert_eq!(ids(schedule.due(&devices, start, true)), vec!["fast", "slow"]);

        for second in 1..5 {
            let now = start + Duration::from_secs(second);
            assert_eq!(ids(schedule.due(&devices, now, true)), vec!["fast"]);
        }

        let now = start + Duration::from_secs(5);
        assert_eq!(ids(schedule.due(&devices, now, true)), vec!["fast", "slow"]);
    }

    #[test]
    fn early_tick_within_slack_still_fires() {
        let devices = vec![device("slow", 5, DeviceStatus::Online)];
        let start = Instant::now();
        let mut schedule = DueSchedule::new();
        schedule.due(&devices, start, true);

        let slightly_early = start + Duration::from_millis(4_900);
        assert_eq!(ids(schedule.due(&devices, slightly_early, true)), vec!["slow"]);
    }

    #[test]
    fn skips_devices_that_are_not_online() {
        let devices = vec![
            device("on", 5, DeviceStatus::Online),
            device("off", 5, DeviceStatus::Offline),
            device("svc", 5, DeviceStatus::Maintenance),
        ];
        let mut schedule = DueSchedule::new();

        assert_eq!(ids(schedule.due(&devices, Instant::now(), true)), vec!["on"]);
        assert_eq!(ids(schedule.due(&devices, Instant::now(), false)), vec!["on"]);
    }

    #[test]
    fn fixed_tick_emits_every_time() {
        let devices = vec![device("slow", 60, DeviceStatus::Online)];
        let start = Instant::now();
        let mut schedule = DueSchedule::new();

        for second in 0..3 {
            let now = start + Duration::from_secs(second);
            assert_eq!(ids(schedule.due(&devices, now, false)), vec!["slow"]);
        }
    }
}
