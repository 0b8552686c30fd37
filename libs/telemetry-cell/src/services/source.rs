use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use device_cell::DeviceSnapshot;
use vitals_cell::{BloodPressure, Metric, VitalReading, VitalValue};

/// Anything that can produce readings for a device: a simulator, a gateway poller.
#[async_trait]
pub trait VitalReadingSource: Send + Sync {
    async fn sample(&self, device: &DeviceSnapshot, at: DateTime<Utc>) -> Vec<VitalReading>;
}

/// Generates plausible vitals for every metric a device type reports.
pub struct SimulatedVitalSource {
    rng: Mutex<StdRng>,
}

impl SimulatedVitalSource {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for SimulatedVitalSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VitalReadingSource for SimulatedVitalSource {
    async fn sample(&self, device: &DeviceSnapshot, at: DateTime<Utc>) -> Vec<VitalReading> {
        let mut rng = match self.rng.lock() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        };

        device
            .device_type
            .metrics()
            .iter()
            .filter_map(|&metric| {
                simulated_value(&mut *rng, metric)
                    .map(|value| VitalReading::new(device.id.clone(), metric, value, at))
            })
            .collect()
    }
}

/// One simulated value, or `None` for metrics the simulator leaves alone: pain and
/// consciousness are charted by staff, and a device keeps whatever rhythm it last
/// reported.
pub fn simulated_value<R: Rng + ?Sized>(rng: &mut R, metric: Metric) -> Option<VitalValue> {
    let value: VitalValue = match metric {
        Metric::HeartRate => whole(rng, 65, 84).into(),
        Metric::BloodPressure => BloodPressure::new(whole(rng, 110, 129), whole(rng, 70, 84))
            .with_mean(whole(rng, 85, 99))
            .into(),
        Metric::Temperature => tenths(rng, 980, 1000).into(),
        Metric::OxygenSaturation => whole(rng, 96, 99).into(),
        Metric::RespiratoryRate => whole(rng, 14, 19).into(),
        Metric::BloodGlucose => whole(rng, 85, 104).into(),
        Metric::Capnography => whole(rng, 30, 39).into(),
        Metric::PerfusionIndex => tenths(rng, 5, 15).into(),
        Metric::PulseVariability => whole(rng, 5, 14).into(),
        Metric::EcgRhythm | Metric::PainLevel | Metric::ConsciousnessLevel => return None,
    };
    Some(value)
}

fn whole<R: Rng + ?Sized>(rng: &mut R, low: u32, high: u32) -> f64 {
    f64::from(rng.gen_range(low..=high))
}

fn tenths<R: Rng + ?Sized>(rng: &mut R, low: u32, high: u32) -> f64 {
    f64::from(rng.gen_range(low..=high)) / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_cell::{classify, AlertStatus};

    #[test]
    fn simulated_numeric_values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let hr = simulated_value(&mut rng, Metric::HeartRate).unwrap();
            assert_eq!(classify(Metric::HeartRate, &hr).unwrap(), AlertStatus::Normal);

            let temp = simulated_value(&mut rng, Metric::Temperature)
                .and_then(|v| v.primary())
                .unwrap();
            assert!((98.0..=100.0).contains(&temp));
            assert!((temp * 10.0 - (temp * 10.0).round()).abs() < 1e-9);

            let perfusion = simulated_value(&mut rng, Metric::PerfusionIndex)
                .and_then(|v| v.primary())
                .unwrap();
            assert!((0.5..=1.5).contains(&perfusion));
        }
    }

    #[test]
    fn charted_metrics_and_rhythm_are_not_simulated() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            assert!(simulated_value(&mut rng, Metric::EcgRhythm).is_none());
        }
        assert!(simulated_value(&mut rng, Metric::PainLevel).is_none());
        assert!(simulated_value(&mut rng, Metric::ConsciousnessLevel).is_none());
    }
}
