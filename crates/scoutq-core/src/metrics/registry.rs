//! Search metrics registry.
//!
//! A scan fallback is the degraded path: every search that could not use an
//! index bumps `scoutq_scan_fallbacks_total`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use super::histogram::LatencyHistogram;

/// Counters for search execution.
pub struct SearchMetrics {
    started_at: Instant,

    searches: AtomicU64,
    queries_by_index: RwLock<BTreeMap<String, AtomicU64>>,
    scan_fallbacks: AtomicU64,
    text_scans: AtomicU64,
    store_errors: AtomicU64,
    items_returned: AtomicU64,

    latency: LatencyHistogram,
}

impl SearchMetrics {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            searches: AtomicU64::new(0),
            queries_by_index: RwLock::new(BTreeMap::new()),
            scan_fallbacks: AtomicU64::new(0),
            text_scans: AtomicU64::new(0),
            store_errors: AtomicU64::new(0),
            items_returned: AtomicU64::new(0),
            latency: LatencyHistogram::new(),
        }
    }

    /// Record a completed page fetch.
    pub fn record_search(&self, items: usize, duration_us: u64) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        self.items_returned.fetch_add(items as u64, Ordering::Relaxed);
        self.latency.observe(duration_us);
    }

    /// Record an indexed query.
    pub fn record_index_query(&self, index: &str) {
        if let Some(counter) = self.queries_by_index.read().get(index) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.queries_by_index
            .write()
            .entry(index.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a search that fell back to a full scan.
    pub fn record_scan_fallback(&self) {
        self.scan_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a free-text scan.
    pub fn record_text_scan(&self) {
        self.text_scans.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed store call.
    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Get completed search count.
    pub fn searches(&self) -> u64 {
        self.searches.load(Ordering::Relaxed)
    }

    /// Get query counts by index.
    pub fn queries_by_index(&self) -> BTreeMap<String, u64> {
        self.queries_by_index
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }

    /// Get scan fallback count.
    pub fn scan_fallbacks(&self) -> u64 {
        self.scan_fallbacks.load(Ordering::Relaxed)
    }

    /// Get free-text scan count.
    pub fn text_scans(&self) -> u64 {
        self.text_scans.load(Ordering::Relaxed)
    }

    /// Get failed store call count.
    pub fn store_errors(&self) -> u64 {
        self.store_errors.load(Ordering::Relaxed)
    }

    /// Get total items returned.
    pub fn items_returned(&self) -> u64 {
        self.items_returned.load(Ordering::Relaxed)
    }

    /// Page-fetch latency histogram.
    pub fn latency(&self) -> &LatencyHistogram {
        &self.latency
    }

    /// Get average search latency in microseconds.
    pub fn avg_latency_us(&self) -> u64 {
        self.latency.avg_us()
    }

    /// Get max search latency in microseconds.
    pub fn max_latency_us(&self) -> u64 {
        self.latency.max_us()
    }

    /// Get P99 search latency in microseconds.
    pub fn p99_latency_us(&self) -> u64 {
        self.latency.percentile(0.99)
    }

    /// Export to Prometheus text format.
    pub fn to_prometheus(&self) -> String {
        let mut out = String::new();

        out.push_str("# HELP scoutq_uptime_seconds Process uptime in seconds\n");
        out.push_str("# TYPE scoutq_uptime_seconds gauge\n");
        out.push_str(&format!("scoutq_uptime_seconds {}\n\n", self.uptime_secs()));

        out.push_str("# HELP scoutq_searches_total Completed page fetches\n");
        out.push_str("# TYPE scoutq_searches_total counter\n");
        out.push_str(&format!("scoutq_searches_total {}\n\n", self.searches()));

        out.push_str("# HELP scoutq_index_queries_total Indexed queries by index\n");
        out.push_str("# TYPE scoutq_index_queries_total counter\n");
        for (index, count) in self.queries_by_index() {
            out.push_str(&format!(
                "scoutq_index_queries_total{{index=\"{}\"}} {}\n",
                index, count
            ));
        }
        out.push('\n');

        out.push_str("# HELP scoutq_scan_fallbacks_total Searches that fell back to a full scan\n");
        out.push_str("# TYPE scoutq_scan_fallbacks_total counter\n");
        out.push_str(&format!("scoutq_scan_fallbacks_total {}\n\n", self.scan_fallbacks()));

        out.push_str("# HELP scoutq_text_scans_total Free-text searches\n");
        out.push_str("# TYPE scoutq_text_scans_total counter\n");
        out.push_str(&format!("scoutq_text_scans_total {}\n\n", self.text_scans()));

        out.push_str("# HELP scoutq_store_errors_total Failed store calls\n");
        out.push_str("# TYPE scoutq_store_errors_total counter\n");
        out.push_str(&format!("scoutq_store_errors_total {}\n\n", self.store_errors()));

        out.push_str("# HELP scoutq_items_returned_total Items returned across all pages\n");
        out.push_str("# TYPE scoutq_items_returned_total counter\n");
        out.push_str(&format!(
            "scoutq_items_returned_total {}\n\n",
            self.items_returned()
        ));

        self.latency.write_prometheus(
            &mut out,
            "scoutq_search_duration_us",
            "Page fetch duration in microseconds",
        );
        out.push('\n');

        out.push_str("# HELP scoutq_search_duration_us_max Slowest page fetch in microseconds\n");
        out.push_str("# TYPE scoutq_search_duration_us_max gauge\n");
        out.push_str(&format!(
            "scoutq_search_duration_us_max {}\n",
            self.max_latency_us()
        ));

        out
    }
}

impl Default for SearchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics handle.
pub type SharedSearchMetrics = Arc<SearchMetrics>;

/// Create a new shared metrics registry.
pub fn new_shared_metrics() -> SharedSearchMetrics {
    Arc::new(SearchMetrics::new())
}
