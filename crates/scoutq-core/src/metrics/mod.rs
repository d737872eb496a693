//! Search metrics.
//!
//! Lock-free counters for the search paths, per-index query counts and a
//! page-fetch latency histogram, exported in Prometheus text format.

mod histogram;
mod registry;

pub use histogram::LatencyHistogram;
pub use registry::{new_shared_metrics, SearchMetrics, SharedSearchMetrics};
