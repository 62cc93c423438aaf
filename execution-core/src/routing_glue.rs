//! Glue between an external routing policy and the replay buffer. The policy itself is
//! opaque to this crate: it could be a bandit, a trained network, or a fixed heuristic, as
//! long as it implements [`Policy`].

use std::sync::Arc;

use common::ParentOrderId;
use replay_buffer::{Experience, ExperienceMetadata, ReplayBuffer};
use venue_model::Venue;

use crate::scheduler::DispatchRecord;

/// A routing policy: given a feature vector, pick a venue (or sentinel action) and report a
/// confidence/score. State construction (ticks, book imbalance, recent fills) is an external
/// concern; this crate only ever sees the vector a caller hands it.
pub trait Policy {
    /// Choose an action for `state`, returning `(action, score)`. `action` is interpreted as
    /// an index into [`Venue::ALL`] modulo its length, so any `u8` is a valid action.
    fn decide(&mut self, state: &[f32]) -> (u8, f32);
}

/// A policy that always selects the same fixed venue, mainly useful for tests and as a
/// trivial default before a real policy is wired in.
#[derive(Debug, Clone, Copy)]
pub struct FixedVenuePolicy {
    /// Venue returned by every call to `decide`.
    pub venue: Venue,
}

impl Policy for FixedVenuePolicy {
    fn decide(&mut self, _state: &[f32]) -> (u8, f32) {
        (self.venue.index() as u8, 1.0)
    }
}

/// Wraps a [`Policy`] and a shared [`ReplayBuffer`], turning completed dispatches into
/// prioritized transitions.
pub struct RoutingGlue<P: Policy> {
    policy: P,
    buffer: Arc<ReplayBuffer>,
}

impl<P: Policy> RoutingGlue<P> {
    /// Build routing glue around a policy and a shared buffer.
    #[must_use]
    pub fn new(policy: P, buffer: Arc<ReplayBuffer>) -> Self {
        Self { policy, buffer }
    }

    /// Shared handle to the replay buffer, for a training loop to sample from concurrently.
    #[must_use]
    pub fn buffer(&self) -> Arc<ReplayBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Ask the policy for a venue given the caller-supplied state vector.
    pub fn choose_venue(&mut self, state: &[f32]) -> (Venue, f32) {
        let (action, score) = self.policy.decide(state);
        let venue = Venue::ALL[action as usize % Venue::ALL.len()];
        (venue, score)
    }

    /// Turn a completed dispatch into an `Experience` and push it into the buffer.
    ///
    /// `fastest_base_latency_us` is the fastest configured base latency across all venues
    /// (see [`latency_sim::LatencySimulator::fastest_base_latency_us`]); `opportunity_cost`
    /// measures how much latency a different venue choice could have saved.
    ///
    /// `expected_latency_us` and `actual_latency_us` are both taken from the same latency
    /// draw: a pure simulation has no independent "real" observation to compare the
    /// prediction against, unlike a live system feeding back realized fills.
    pub fn record(
        &self,
        parent_id: ParentOrderId,
        state: Vec<f32>,
        next_state: Vec<f32>,
        done: bool,
        dispatch: &DispatchRecord,
        fastest_base_latency_us: f64,
    ) -> usize {
        let _ = parent_id; // carried for callers that want to correlate by parent, unused here
        let latency_us = dispatch.latency.predicted_us;
        let opportunity_cost = (latency_us - fastest_base_latency_us).max(0.0) / 1_000.0;

        let metadata = ExperienceMetadata {
            venue: dispatch.slice.target_venue.index() as u8,
            expected_latency_us: latency_us,
            actual_latency_us: latency_us,
            fill_success: dispatch.result.success,
            market_impact_bps: dispatch.result.temporary_impact_bps,
            opportunity_cost,
        };

        let experience = Experience {
            state,
            action: dispatch.slice.target_venue.index() as u8,
            reward: dispatch.reward,
            next_state,
            done,
            ts: dispatch.result.exec_ts,
            metadata,
        };

        self.buffer.add(experience)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderType, Px, Qty, Side, SliceId, Symbol, Ts};
    use latency_sim::{ContributingFactors, LatencyMeasurement};
    use replay_buffer::ReplayBuffer;
    use slicer::OrderSlice;

    use crate::parent_order::ExecutionResult;

    fn dummy_dispatch() -> DispatchRecord {
        let slice = OrderSlice {
            id: SliceId(1),
            parent_id: ParentOrderId(1),
            symbol: Symbol::new(1),
            side: Side::Buy,
            qty: Qty::new(100.0),
            target_venue: Venue::Nyse,
            order_type: OrderType::Market,
            limit_price: None,
            scheduled_ts: Ts::ZERO,
            urgency: 0.5,
            hidden_qty: Qty::ZERO,
        };
        let result = ExecutionResult {
            slice_id: slice.id,
            executed_qty: Qty::new(100.0),
            avg_price: Px::new(100.0),
            exec_ts: Ts::ZERO,
            venue: Venue::Nyse,
            fees: 0.1,
            rebate: 0.0,
            slippage_bps: 1.0,
            temporary_impact_bps: 2.0,
            permanent_impact_bps: 0.6,
            success: true,
            error: None,
            degraded: false,
        };
        let latency = LatencyMeasurement {
            predicted_us: 200.0,
            confidence_interval: (180.0, 220.0),
            contributing_factors: ContributingFactors {
                time_of_day: 1.0,
                congestion: 1.0,
                market: 1.0,
                jitter: 1.0,
                congestion_effect: 0.0,
            },
            route_quality: 0.8,
            confidence: 0.75,
        };
        DispatchRecord {
            parent_id: ParentOrderId(1),
            slice,
            result,
            latency,
            reward: 12.0,
            parent_done: true,
        }
    }

    #[test]
    fn fixed_policy_always_returns_its_venue() {
        let mut glue = RoutingGlue::new(FixedVenuePolicy { venue: Venue::Iex }, Arc::new(ReplayBuffer::new(16, 0.6, 0.4, 0.001)));
        let (venue, _score) = glue.choose_venue(&[0.0; 4]);
        assert_eq!(venue, Venue::Iex);
    }

    #[test]
    fn record_pushes_an_experience_into_the_buffer() {
        let buffer = Arc::new(ReplayBuffer::new(16, 0.6, 0.4, 0.001));
        let glue = RoutingGlue::new(FixedVenuePolicy { venue: Venue::Nyse }, Arc::clone(&buffer));
        let dispatch = dummy_dispatch();

        let idx = glue.record(ParentOrderId(1), vec![0.0; 4], vec![0.0; 4], true, &dispatch, 120.0);
        assert_eq!(idx, 0);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn opportunity_cost_is_zero_when_already_fastest() {
        let buffer = Arc::new(ReplayBuffer::new(16, 0.6, 0.4, 0.001));
        let glue = RoutingGlue::new(FixedVenuePolicy { venue: Venue::Nyse }, Arc::clone(&buffer));
        let mut dispatch = dummy_dispatch();
        dispatch.latency.predicted_us = 100.0;

        glue.record(ParentOrderId(1), vec![], vec![], false, &dispatch, 150.0);
        // fastest_base_latency_us (150) > actual (100): no opportunity cost to report.
        let batch = buffer.sample(1, &mut rand::thread_rng());
        assert_eq!(batch.experiences[0].metadata.opportunity_cost, 0.0);
    }
}
