//! Fixed-bucket latency histogram.

use std::sync::atomic::{AtomicU64, Ordering};

/// Upper bucket bounds in microseconds.
const BOUNDS_US: [u64; 10] = [
    250, 500, 1_000, 2_500, 5_000, 10_000, 50_000, 250_000, 1_000_000, 5_000_000,
];

/// Page-fetch latency histogram.
///
/// Each observation lands in exactly one slot: the first bucket whose bound is
/// at least the value, or the overflow slot past the last bound.
pub struct LatencyHistogram {
    counts: [AtomicU64; BOUNDS_US.len() + 1],
    sum_us: AtomicU64,
    count: AtomicU64,
    max_us: AtomicU64,
}

impl LatencyHistogram {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self {
            counts: std::array::from_fn(|_| AtomicU64::new(0)),
            sum_us: AtomicU64::new(0),
            count: AtomicU64::new(0),
            max_us: AtomicU64::new(0),
        }
    }

    /// Record one duration in microseconds.
    pub fn observe(&self, value_us: u64) {
        self.sum_us.fetch_add(value_us, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.max_us.fetch_max(value_us, Ordering::Relaxed);

        let slot = BOUNDS_US
            .iter()
            .position(|&bound| value_us <= bound)
            .unwrap_or(BOUNDS_US.len());
        self.counts[slot].fetch_add(1, Ordering::Relaxed);
    }

    /// Number of observations.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Sum of observations in microseconds.
    pub fn sum_us(&self) -> u64 {
        self.sum_us.load(Ordering::Relaxed)
    }

    /// Largest observation in microseconds.
    pub fn max_us(&self) -> u64 {
        self.max_us.load(Ordering::Relaxed)
    }

    /// Mean observation in microseconds, 0 when empty.
    pub fn avg_us(&self) -> u64 {
        match self.count() {
            0 => 0,
            count => self.sum_us() / count,
        }
    }

    /// Approximate percentile (`0.99` for P99): the bound of the bucket holding it.
    ///
    /// Observations past the last bound report the largest observed value.
    pub fn percentile(&self, p: f64) -> u64 {
        let total = self.count();
        if total == 0 {
            return 0;
        }
        let target = ((total as f64 * p).ceil() as u64).max(1);

        let mut seen = 0;
        for (bound, count) in BOUNDS_US.iter().zip(&self.counts) {
            seen += count.load(Ordering::Relaxed);
            if seen >= target {
                return *bound;
            }
        }
        self.max_us()
    }

    /// Cumulative `(upper bound, count <= bound)` pairs, ending with `(None, total)`
    /// for the `+Inf` bucket.
    pub fn cumulative(&self) -> Vec<(Option<u64>, u64)> {
        let mut seen = 0;
        let mut out: Vec<(Option<u64>, u64)> = BOUNDS_US
            .iter()
            .zip(&self.counts)
            .map(|(bound, count)| {
                seen += count.load(Ordering::Relaxed);
                (Some(*bound), seen)
            })
            .collect();
        seen += self.counts[BOUNDS_US.len()].load(Ordering::Relaxed);
        out.push((None, seen));
        out
    }

    /// Render as a Prometheus histogram named `name`.
    pub fn write_prometheus(&self, out: &mut String, name: &str, help: &str) {
        out.push_str(&format!("# HELP {} {}\n", name, help));
        out.push_str(&format!("# TYPE {} histogram\n", name));
        for (bound, count) in self.cumulative() {
            let le = bound.map_or_else(|| "+Inf".to_string(), |b| b.to_string());
            out.push_str(&format!("{}_bucket{{le=\"{}\"}} {}\n", name, le, count));
        }
        out.push_str(&format!("{}_sum {}\n", name, self.sum_us()));
        out.push_str(&format!("{}_count {}\n", name, self.count()));
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}
