//! The public surface: submit parent orders under one of the four strategies, cancel them,
//! query status, and step the dispatch loop.

use std::sync::Arc;

use common::{ParentOrderId, Px, Qty, Side, Symbol};
use replay_buffer::ReplayBuffer;
use serde::Serialize;
use slicer::{IcebergParams, SmartRoutingParams, StrategyParams, TwapParams, VwapParams};
use venue_model::Venue;

use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::parent_order::ParentStatus;
use crate::routing_glue::{Policy, RoutingGlue};
use crate::scheduler::{DispatchRecord, Scheduler};

/// A read-only snapshot of a parent order's progress, decoupled from the mutable
/// [`crate::parent_order::ParentOrder`] it's taken from.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParentStatusView {
    /// The parent's id.
    pub id: ParentOrderId,
    /// Current FSM state.
    pub status: ParentStatus,
    /// Quantity filled so far.
    pub filled_qty: Qty,
    /// Quantity remaining.
    pub remaining_qty: Qty,
    /// Notional-weighted average fill price.
    pub avg_exec_price: Px,
    /// Signed implementation shortfall, in bps, positive means costlier than arrival.
    pub implementation_shortfall_bps: f64,
}

/// Composes the scheduler (parents, books, latency/congestion) with routing glue (an
/// opaque policy feeding a shared replay buffer). This is the type external callers drive.
pub struct ExecutionCore<P: Policy> {
    scheduler: Scheduler,
    routing: RoutingGlue<P>,
}

impl<P: Policy> ExecutionCore<P> {
    /// Build a core from a configuration and a routing policy, allocating a fresh replay
    /// buffer sized from `config.replay`.
    #[must_use]
    pub fn new(config: CoreConfig, policy: P) -> Self {
        let replay = config.replay;
        let buffer = Arc::new(ReplayBuffer::new(replay.capacity, replay.alpha, replay.beta, replay.beta_increment));
        Self {
            scheduler: Scheduler::new(config),
            routing: RoutingGlue::new(policy, buffer),
        }
    }

    /// Shared handle to the replay buffer, for an external training loop to sample from.
    #[must_use]
    pub fn replay_buffer(&self) -> Arc<ReplayBuffer> {
        self.routing.buffer()
    }

    /// Seed (or re-seed) a `(symbol, venue)` book before routing orders against it.
    pub fn seed_book(&mut self, symbol: Symbol, venue: Venue, mid: Px, mean_level_size: f64) {
        self.scheduler.seed_book(symbol, venue, mid, mean_level_size);
    }

    /// Submit a TWAP-sliced parent order.
    pub fn submit_twap(&mut self, symbol: Symbol, side: Side, total_qty: Qty, params: TwapParams) -> CoreResult<ParentOrderId> {
        self.scheduler.submit(symbol, side, total_qty, StrategyParams::Twap(params))
    }

    /// Submit a VWAP-sliced parent order.
    pub fn submit_vwap(&mut self, symbol: Symbol, side: Side, total_qty: Qty, params: VwapParams) -> CoreResult<ParentOrderId> {
        self.scheduler.submit(symbol, side, total_qty, StrategyParams::Vwap(params))
    }

    /// Submit an Iceberg-sliced parent order.
    pub fn submit_iceberg(&mut self, symbol: Symbol, side: Side, total_qty: Qty, params: IcebergParams) -> CoreResult<ParentOrderId> {
        self.scheduler.submit(symbol, side, total_qty, StrategyParams::Iceberg(params))
    }

    /// Submit a Smart-Routing parent order.
    pub fn submit_smart(
        &mut self,
        symbol: Symbol,
        side: Side,
        total_qty: Qty,
        params: SmartRoutingParams,
    ) -> CoreResult<ParentOrderId> {
        self.scheduler.submit(symbol, side, total_qty, StrategyParams::SmartRouting(params))
    }

    /// Cancel a parent order.
    pub fn cancel(&mut self, id: ParentOrderId) -> CoreResult<()> {
        self.scheduler.cancel(id)
    }

    /// Snapshot a parent order's current status.
    pub fn status(&self, id: ParentOrderId) -> CoreResult<ParentStatusView> {
        let parent = self
            .scheduler
            .parent(id)
            .ok_or(crate::error::CoreError::ParentNotFound(id))?;
        Ok(ParentStatusView {
            id: parent.id,
            status: parent.status,
            filled_qty: parent.filled_qty(),
            remaining_qty: parent.remaining_qty(),
            avg_exec_price: parent.avg_exec_price(),
            implementation_shortfall_bps: parent.implementation_shortfall_bps(),
        })
    }

    /// Number of slices still pending dispatch across all parents.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.scheduler.pending_len()
    }

    /// Dispatch the next scheduled slice, if any, and record the resulting transition into
    /// the replay buffer. `state`/`next_state` are caller-supplied feature vectors: building
    /// them from live ticks is outside this core's scope.
    pub fn dispatch_next(&mut self, state: Vec<f32>, next_state: Vec<f32>) -> Option<DispatchRecord> {
        let record = self.scheduler.dispatch_next()?;
        let fastest = self.scheduler.fastest_base_latency_us();
        self.routing
            .record(record.parent_id, state, next_state, record.parent_done, &record, fastest);
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing_glue::FixedVenuePolicy;

    fn core() -> ExecutionCore<FixedVenuePolicy> {
        let mut core = ExecutionCore::new(CoreConfig::default(), FixedVenuePolicy { venue: Venue::Nyse });
        for venue in Venue::ALL {
            core.seed_book(Symbol::new(1), venue, Px::new(100.0), 1_000.0);
        }
        core
    }

    #[test]
    fn submit_then_status_reports_pending() {
        let mut core = core();
        let id = core
            .submit_twap(
                Symbol::new(1),
                Side::Buy,
                Qty::new(300.0),
                TwapParams {
                    duration_secs: 30.0,
                    slice_interval_secs: 10.0,
                    randomize_timing: false,
                    randomize_size: false,
                },
            )
            .unwrap();
        let view = core.status(id).unwrap();
        assert_eq!(view.status, ParentStatus::Pending);
        assert_eq!(view.filled_qty, Qty::ZERO);
    }

    #[test]
    fn dispatching_drains_the_parent_and_populates_replay_buffer() {
        let mut core = core();
        let id = core
            .submit_twap(
                Symbol::new(1),
                Side::Buy,
                Qty::new(300.0),
                TwapParams {
                    duration_secs: 30.0,
                    slice_interval_secs: 10.0,
                    randomize_timing: false,
                    randomize_size: false,
                },
            )
            .unwrap();

        while core.dispatch_next(vec![0.0; 4], vec![0.0; 4]).is_some() {}

        let view = core.status(id).unwrap();
        assert!(view.status.is_terminal());
        assert!(core.replay_buffer().len() > 0);
    }

    #[test]
    fn status_of_unknown_parent_errors() {
        let core = core();
        assert!(core.status(ParentOrderId(12_345)).is_err());
    }
}
