//! Aggregates computed over fetched data windows.

mod hist;
mod partition;
mod stats;

pub use hist::{categorical_hist, numeric_hist, range_hist, HistBin, Histogram, HistogramKind};
pub use partition::{categorical_partitioning, PartitionOptions};
pub use stats::{compute_stats, Statistics};

/// Default histogram bin count for `len` entries.
pub fn default_bins(len: usize) -> usize {
    ((len as f64).sqrt().round() as usize).max(1)
}
