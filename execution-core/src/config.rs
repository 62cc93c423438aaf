//! Recognized configuration options. Nothing here is loaded from a file — callers build
//! this struct however they like (env vars, a config crate, hardcoded defaults) and pass
//! it to [`crate::ExecutionCore::new`].

use common::constants::network::DEFAULT_LATENCY_CEILING_US;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Per-venue latency range, `(low_us, high_us)`, informational for external collaborators
/// wiring up their own latency priors; the core's own latency model lives in `latency-sim`.
pub type VenueLatencyRange = (f64, f64);

/// Thresholds, in microseconds, past which a slice is considered degraded for a given
/// strategy family.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatencyPenalties {
    /// Threshold applied when no more specific strategy threshold matches.
    pub general_threshold_us: f64,
    /// Threshold for arbitrage-style strategies, typically the tightest.
    pub arbitrage_threshold_us: f64,
    /// Threshold for momentum-style strategies.
    pub momentum_threshold_us: f64,
}

impl Default for LatencyPenalties {
    fn default() -> Self {
        Self {
            general_threshold_us: DEFAULT_LATENCY_CEILING_US,
            arbitrage_threshold_us: 2_000.0,
            momentum_threshold_us: 5_000.0,
        }
    }
}

/// Replay-buffer sizing and sampling parameters, passed straight to
/// [`replay_buffer::ReplayBuffer::new`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Ring capacity.
    pub capacity: usize,
    /// Priority exponent `alpha`.
    pub alpha: f64,
    /// Initial importance-sampling exponent `beta`.
    pub beta: f64,
    /// Per-sample-call annealing step applied to `beta`.
    pub beta_increment: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            capacity: 100_000,
            alpha: 0.6,
            beta: 0.4,
            beta_increment: 0.001,
        }
    }
}

/// Top-level configuration recognized by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Default slice quantity used when a caller doesn't specify one explicitly.
    pub default_quantity: i64,
    /// Fallback taker fee, per share, used only when a venue's own capability row is absent.
    pub fee_rate: f64,
    /// Fallback maker rebate, per share.
    pub rebate_rate: f64,
    /// Informational per-venue latency priors, keyed by venue name; not consumed by the
    /// simulator itself (see `latency-sim`'s own calibrated table).
    pub venue_latency: FxHashMap<String, VenueLatencyRange>,
    /// Per-strategy, per-venue routing weight hints for external collaborators.
    pub venue_weights: FxHashMap<String, FxHashMap<String, f64>>,
    /// Historical win rates per strategy. Never read by the core; retained only because
    /// backtest collaborators expect to find it in the same config blob.
    pub win_rates: FxHashMap<String, f64>,
    /// Degraded-latency thresholds per strategy family.
    pub latency_penalties: LatencyPenalties,
    /// Replay buffer sizing.
    pub replay: ReplayConfig,
    /// Latency ceiling past which a dispatched slice is flagged as degraded.
    pub latency_ceiling_us: f64,
    /// Seed for the book simulator's RNG.
    pub book_seed: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_quantity: 100,
            fee_rate: 0.0020,
            rebate_rate: 0.0015,
            venue_latency: FxHashMap::default(),
            venue_weights: FxHashMap::default(),
            win_rates: FxHashMap::default(),
            latency_penalties: LatencyPenalties::default(),
            replay: ReplayConfig::default(),
            latency_ceiling_us: DEFAULT_LATENCY_CEILING_US,
            book_seed: 42,
        }
    }
}
