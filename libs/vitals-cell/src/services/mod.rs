pub mod classifier;
pub mod history;

pub use classifier::{classify, classify_key, classify_numeric, classify_rhythm, reference_range, ReferenceRange};
pub use history::{RingBuffer, TimeSeriesStore, DEFAULT_HISTORY_CAPACITY};
