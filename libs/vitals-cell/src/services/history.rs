// =====================================================================================
// TIME-SERIES HISTORY
// =====================================================================================

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::{Metric, Sample};

pub const DEFAULT_HISTORY_CAPACITY: usize = 6;

/// Fixed-capacity FIFO. Pushing onto a full buffer evicts exactly the oldest entry.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T: Clone> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends `item`, returning the evicted entry when the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(item);
        evicted
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

type SeriesKey = (String, Metric);

/// Per-(device, metric) trend history. Every series has the same capacity, fixed at
/// construction.
#[derive(Debug, Clone)]
pub struct TimeSeriesStore {
    capacity: usize,
    series: Arc<RwLock<HashMap<SeriesKey, RingBuffer<Sample>>>>,
}

impl TimeSeriesStore {
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            warn!("History capacity of 0 requested, using 1");
        }

        Self {
            capacity: capacity.max(1),
            series: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn append(&self, device_id: &str, metric: Metric, sample: Sample) {
        let mut series = self.series.write().await;
        let buffer = series
            .entry((device_id.to_string(), metric))
            .or_insert_with(|| RingBuffer::new(self.capacity));

        if let Some(evicted) = buffer.push(sample) {
            debug!(
                device_id = %device_id,
                metric = %metric,
                evicted_at = %evicted.timestamp,
                "Evicted oldest sample"
            );
        }
    }

    /// Copy of the series in insertion order. Unknown keys give an empty series.
    pub async fn snapshot(&self, device_id: &str, metric: Metric) -> Vec<Sample> {
        let series = self.series.read().await;
        series
            .get(&(device_id.to_string(), metric))
            .map(RingBuffer::to_vec)
            .unwrap_or_default()
    }

    /// Number of (device, metric) series currently tracked.
    pub async fn tracked_series(&self) -> usize {
        self.series.read().await.len()
    }
}

impl Default for TimeSeriesStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
