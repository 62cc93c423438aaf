//! Off-hot-path bookkeeping: latency percentiles and venue-selection counters.
//!
//! The ring itself (`buffer.rs`) never takes a lock. This does, but it is only touched
//! once per `add`/`sample` call and never gates the data path.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

const HISTORY_CAP: usize = 4096;

/// p50/p95/p99 over the retained latency history, in nanoseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatencyPercentiles {
    pub p50_ns: u64,
    pub p95_ns: u64,
    pub p99_ns: u64,
}

#[derive(Default)]
struct Inner {
    add_latencies_ns: VecDeque<u64>,
    sample_latencies_ns: VecDeque<u64>,
    venue_counts: FxHashMap<u8, u64>,
}

/// Rolling telemetry for a `ReplayBuffer`.
pub struct Telemetry {
    inner: Mutex<Inner>,
}

impl Telemetry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub(crate) fn record_add(&self, elapsed_ns: u64) {
        let mut inner = self.inner.lock();
        push_bounded(&mut inner.add_latencies_ns, elapsed_ns);
    }

    pub(crate) fn record_sample(&self, elapsed_ns: u64) {
        let mut inner = self.inner.lock();
        push_bounded(&mut inner.sample_latencies_ns, elapsed_ns);
    }

    pub(crate) fn record_venue(&self, venue: u8) {
        let mut inner = self.inner.lock();
        *inner.venue_counts.entry(venue).or_insert(0) += 1;
    }

    /// Percentiles over recent `add` calls.
    #[must_use]
    pub fn add_percentiles(&self) -> LatencyPercentiles {
        percentiles_of(&self.inner.lock().add_latencies_ns)
    }

    /// Percentiles over recent `sample` calls.
    #[must_use]
    pub fn sample_percentiles(&self) -> LatencyPercentiles {
        percentiles_of(&self.inner.lock().sample_latencies_ns)
    }

    /// Number of times each venue id has appeared in a sampled batch.
    #[must_use]
    pub fn venue_counts(&self) -> FxHashMap<u8, u64> {
        self.inner.lock().venue_counts.clone()
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

fn push_bounded(history: &mut VecDeque<u64>, value: u64) {
    history.push_back(value);
    if history.len() > HISTORY_CAP {
        history.pop_front();
    }
}

fn percentiles_of(history: &VecDeque<u64>) -> LatencyPercentiles {
    if history.is_empty() {
        return LatencyPercentiles::default();
    }
    let mut sorted: Vec<u64> = history.iter().copied().collect();
    sorted.sort_unstable();
    let at = |q: f64| {
        let idx = ((sorted.len() - 1) as f64 * q).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    };
    LatencyPercentiles {
        p50_ns: at(0.50),
        p95_ns: at(0.95),
        p99_ns: at(0.99),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_are_monotonic() {
        let telemetry = Telemetry::new();
        for i in 1..=100u64 {
            telemetry.record_add(i * 1000);
        }
        let p = telemetry.add_percentiles();
        assert!(p.p50_ns <= p.p95_ns);
        assert!(p.p95_ns <= p.p99_ns);
    }

    #[test]
    fn venue_counts_accumulate() {
        let telemetry = Telemetry::new();
        telemetry.record_venue(1);
        telemetry.record_venue(1);
        telemetry.record_venue(2);
        let counts = telemetry.venue_counts();
        assert_eq!(counts[&1], 2);
        assert_eq!(counts[&2], 1);
    }

    #[test]
    fn empty_history_yields_zero_percentiles() {
        let telemetry = Telemetry::new();
        let p = telemetry.sample_percentiles();
        assert_eq!(p.p50_ns, 0);
    }
}
