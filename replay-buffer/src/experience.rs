//! The plain-data row stored per ring slot. No pointers into live entities: just numbers.

use common::Ts;
use serde::{Deserialize, Serialize};

/// Routing-specific context recorded alongside a transition, used for diagnostics and by
/// the priority/telemetry calculations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExperienceMetadata {
    /// Venue (or sentinel action) the policy selected.
    pub venue: u8,
    /// Latency predicted before dispatch, in microseconds.
    pub expected_latency_us: f64,
    /// Latency actually observed, in microseconds.
    pub actual_latency_us: f64,
    /// Whether the slice filled.
    pub fill_success: bool,
    /// Market impact incurred, in bps.
    pub market_impact_bps: f64,
    /// `max(0, expected_latency - best_venue_latency) / 1000`, a bps-like proxy.
    pub opportunity_cost: f64,
}

/// One `(state, action, reward, next_state, done)` transition plus routing metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    /// State vector at decision time.
    pub state: Vec<f32>,
    /// Action taken: a venue id, or one of the two sentinel actions (hold/cancel).
    pub action: u8,
    /// Reward received for this transition.
    pub reward: f64,
    /// State vector after the transition.
    pub next_state: Vec<f32>,
    /// Whether the parent order reached a terminal state.
    pub done: bool,
    /// When this transition was recorded.
    pub ts: Ts,
    /// Routing metadata.
    pub metadata: ExperienceMetadata,
}

impl Experience {
    /// `p = |reward| + 0.1`, scaled by a latency factor and an impact factor.
    /// `latency_factor = 2 - min(2, actual_latency_us / 1000)`.
    /// `impact_factor = 1 + market_impact_bps / 10_000`.
    #[must_use]
    pub fn raw_priority(&self) -> f64 {
        let latency_factor = 2.0 - (self.metadata.actual_latency_us / 1_000.0).min(2.0);
        let impact_factor = 1.0 + self.metadata.market_impact_bps / 10_000.0;
        (self.reward.abs() + 0.1) * latency_factor * impact_factor
    }
}
