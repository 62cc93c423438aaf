//! Owns every parent order, the dispatch heap, and the simulated venues they trade
//! against. Single-owner, single-threaded by design: see the crate-level docs for why
//! this mirrors [`orderbook_sim::BookSimulator`]'s plain-mutable-state choice rather than
//! locking each parent individually.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use common::{Clock, IdGenerator, ParentOrderId, Px, Qty, Side, Symbol, Ts};
use latency_sim::{CongestionEngine, LatencyMeasurement, LatencySimulator, MarketConditions, TradingSession};
use orderbook_sim::BookSimulator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use rustc_hash::FxHashMap;
use slicer::{OrderSlice, SliceRequest, StrategyParams};
use tracing::{error, warn};
use venue_model::{SymbolClassifier, Venue, VenueTable};

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::parent_order::{ExecutionFailure, ExecutionResult, ParentOrder, ParentStatus};

/// Ordering key for the dispatch heap. Ties break on parent creation order, then slice
/// index, so that two slices scheduled for the same instant dispatch in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapKey {
    scheduled_ts: Ts,
    parent_creation_ts: Ts,
    slice_index: usize,
    parent_id: ParentOrderId,
}

impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.scheduled_ts, self.parent_creation_ts, self.slice_index, self.parent_id.0).cmp(&(
            other.scheduled_ts,
            other.parent_creation_ts,
            other.slice_index,
            other.parent_id.0,
        ))
    }
}

/// Everything produced by dispatching a single slice, handed back to the caller so it can
/// feed the routing glue / replay buffer without the scheduler needing to know about either.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRecord {
    /// Parent the dispatched slice belonged to.
    pub parent_id: ParentOrderId,
    /// The slice that was dispatched.
    pub slice: OrderSlice,
    /// What happened when it was dispatched.
    pub result: ExecutionResult,
    /// The latency draw used to gate and time this dispatch.
    pub latency: LatencyMeasurement,
    /// Reward computed from `result` and `latency` per the fixed formula below.
    pub reward: f64,
    /// Whether this dispatch moved the parent into a terminal state.
    pub parent_done: bool,
}

/// Pure reward function: `base + latency_bonus + 0.1*pnl_bps + accuracy_bonus - 10*temp_impact_bps`.
///
/// `expected_latency_us` is the latency the policy was told to expect for this slice. Within
/// a pure simulation there is no independently observed "real" latency to compare the
/// prediction against, so callers in this crate pass the same draw used to gate the
/// dispatch for both `actual` and `expected` — `accuracy_bonus` collapses to its maximum in
/// that case, which is intentional rather than a bug in the formula.
#[must_use]
pub fn compute_reward(result: &ExecutionResult, latency: &LatencyMeasurement, expected_latency_us: f64) -> f64 {
    let actual_latency_us = latency.predicted_us;

    let base = if result.success { 10.0 } else { -5.0 };
    let latency_bonus = if actual_latency_us < 500.0 {
        5.0
    } else if actual_latency_us < 1_000.0 {
        2.0
    } else if actual_latency_us < 2_000.0 {
        0.5
    } else {
        -2.0
    };
    let pnl_bps = -result.slippage_bps;
    let accuracy_bonus = (2.0 - (actual_latency_us - expected_latency_us).abs() / 500.0).max(0.0);

    base + latency_bonus + 0.1 * pnl_bps + accuracy_bonus - 10.0 * result.temporary_impact_bps
}

/// Owns parent orders, the dispatch heap and every simulated dependency (books, latency,
/// congestion, venue/symbol tables). Exclusively driven by [`crate::api::ExecutionCore`].
pub struct Scheduler {
    parents: FxHashMap<ParentOrderId, ParentOrder>,
    heap: BinaryHeap<Reverse<HeapKey>>,
    cancelled: FxHashSet<ParentOrderId>,
    book_sim: BookSimulator,
    latency_sim: LatencySimulator,
    congestion: CongestionEngine,
    venues: VenueTable,
    classifier: SymbolClassifier,
    session: TradingSession,
    ids: IdGenerator,
    clock: Clock,
    rng: StdRng,
    config: CoreConfig,
}

impl Scheduler {
    /// Build a scheduler with the default venue table, symbol classifier and standard
    /// trading session, seeded deterministically from `config.book_seed`.
    #[must_use]
    pub fn new(config: CoreConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.book_seed);
        Self {
            parents: FxHashMap::default(),
            heap: BinaryHeap::new(),
            cancelled: FxHashSet::default(),
            book_sim: BookSimulator::new(config.book_seed),
            latency_sim: LatencySimulator::with_defaults(),
            congestion: CongestionEngine::new(),
            venues: VenueTable::default_table(),
            classifier: SymbolClassifier::well_known(),
            session: TradingSession::standard(Ts::ZERO),
            ids: IdGenerator::new(),
            clock: Clock::new(),
            rng,
            config,
        }
    }

    /// Seed (or re-seed) a `(symbol, venue)` book. Exposed so callers wire in real or
    /// synthetic market data before routing orders against it.
    pub fn seed_book(&mut self, symbol: Symbol, venue: Venue, mid: Px, mean_level_size: f64) {
        self.book_sim.seed_book(symbol, venue, mid, mean_level_size);
    }

    /// Smallest configured base latency across all venues, used by routing glue to score
    /// how much latency a different venue choice could have saved.
    #[must_use]
    pub fn fastest_base_latency_us(&self) -> f64 {
        self.latency_sim.fastest_base_latency_us()
    }

    /// Advance the congestion engine by one tick at `now`.
    pub fn tick_congestion(&mut self, now: Ts) {
        let burst_mult = self.session.burst_probability_multiplier(now);
        self.congestion.tick(now, burst_mult, &mut self.rng);
    }

    /// Read-only access to a parent, for status queries.
    #[must_use]
    pub fn parent(&self, id: ParentOrderId) -> Option<&ParentOrder> {
        self.parents.get(&id)
    }

    /// Number of slices still pending dispatch (including those belonging to cancelled
    /// parents, which are only dropped lazily as the heap is popped).
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.heap.len()
    }

    /// Slice up and admit a new parent order, seeding its arrival/benchmark price from the
    /// primary (highest-liquidity) venue's current mid.
    pub fn submit(&mut self, symbol: Symbol, side: Side, total_qty: Qty, strategy: StrategyParams) -> CoreResult<ParentOrderId> {
        let parent_id = self.ids.next_parent_id();
        let creation_ts = self.clock.now();

        if total_qty.as_f64() <= 0.0 {
            let mut rejected = self.blank_parent(parent_id, symbol, side, total_qty, strategy, creation_ts, Px::ZERO);
            rejected.reject();
            self.parents.insert(parent_id, rejected);
            return Err(CoreError::Rejected {
                parent_id,
                reason: "total_qty must be positive".to_owned(),
            });
        }

        let primary_venue = self.venues.by_liquidity_desc()[0];
        let arrival_price = match self.book_sim.quote(symbol, primary_venue) {
            Some(view) => match (view.best_bid, view.best_ask) {
                (Some(b), Some(a)) => Px::from_i64((b.as_i64() + a.as_i64()) / 2),
                (Some(b), None) => b,
                (None, Some(a)) => a,
                (None, None) => Px::ZERO,
            },
            None => {
                warn!(%symbol, venue = %primary_venue, "no book seeded for primary venue; arrival price defaulting to zero");
                Px::ZERO
            }
        };

        let class = self.classifier.classify(symbol);
        let req = SliceRequest {
            parent_id,
            symbol,
            side,
            total_qty,
            creation_ts,
        };
        let slices = strategy.slice(&req, &self.venues, class, self.session.length_secs, &mut self.rng);

        let mut parent = self.blank_parent(parent_id, symbol, side, total_qty, strategy, creation_ts, arrival_price);
        parent.slices = slices.clone();

        for (index, slice) in slices.iter().enumerate() {
            self.heap.push(Reverse(HeapKey {
                scheduled_ts: slice.scheduled_ts,
                parent_creation_ts: creation_ts,
                slice_index: index,
                parent_id,
            }));
        }

        self.parents.insert(parent_id, parent);
        Ok(parent_id)
    }

    fn blank_parent(
        &self,
        id: ParentOrderId,
        symbol: Symbol,
        side: Side,
        total_qty: Qty,
        strategy: StrategyParams,
        creation_ts: Ts,
        arrival_price: Px,
    ) -> ParentOrder {
        ParentOrder {
            id,
            symbol,
            side,
            total_qty,
            strategy,
            status: ParentStatus::Pending,
            arrival_price,
            benchmark_price: arrival_price,
            slices: Vec::new(),
            executions: Vec::new(),
            creation_ts,
        }
    }

    /// Cancel a parent, dropping its unfired slices lazily the next time the heap is
    /// drained past them. Returns `false` if the parent doesn't exist or is already
    /// terminal.
    pub fn cancel(&mut self, id: ParentOrderId) -> CoreResult<()> {
        let parent = self.parents.get_mut(&id).ok_or(CoreError::ParentNotFound(id))?;
        if parent.status.is_terminal() {
            return Err(CoreError::AlreadyTerminal(id));
        }
        parent.cancel();
        self.cancelled.insert(id);
        Ok(())
    }

    /// Pop and dispatch the next scheduled slice, if any. Slices belonging to cancelled
    /// or already-terminal parents are skipped without counting as a dispatch.
    pub fn dispatch_next(&mut self) -> Option<DispatchRecord> {
        loop {
            let Reverse(key) = self.heap.pop()?;

            if self.cancelled.contains(&key.parent_id) {
                continue;
            }
            let Some(parent) = self.parents.get(&key.parent_id) else {
                continue;
            };
            if parent.status.is_terminal() {
                continue;
            }
            let Some(slice) = parent.slices.get(key.slice_index).copied() else {
                continue;
            };

            return Some(self.execute_slice(key.parent_id, slice));
        }
    }

    fn execute_slice(&mut self, parent_id: ParentOrderId, slice: OrderSlice) -> DispatchRecord {
        let now = slice.scheduled_ts;
        let market = MarketConditions::default();

        let latency = self
            .latency_sim
            .predict(slice.target_venue, now, self.session, market, &self.congestion, &mut self.rng);
        let loss_prob = self
            .latency_sim
            .packet_loss_probability(slice.target_venue, now, self.session, market, &self.congestion);

        let degraded = latency.predicted_us > self.config.latency_penalties.general_threshold_us;

        let result = if self.rng.gen::<f64>() < loss_prob {
            ExecutionResult::failure(slice.id, slice.target_venue, now, ExecutionFailure::PacketLoss, degraded)
        } else {
            let venue_caps = self.venues.capabilities(slice.target_venue);
            let remaining = self
                .parents
                .get(&parent_id)
                .map_or(Qty::ZERO, ParentOrder::remaining_qty);
            let total_qty = slice.qty.saturating_add(slice.hidden_qty).min(remaining);
            let outcome = self.book_sim.simulate_fill(
                slice.symbol,
                slice.target_venue,
                slice.side,
                total_qty,
                slice.order_type,
                venue_caps,
            );

            if outcome.success {
                ExecutionResult {
                    slice_id: slice.id,
                    executed_qty: outcome.filled_qty.min(slice.qty),
                    avg_price: outcome.avg_price,
                    exec_ts: now,
                    venue: slice.target_venue,
                    fees: outcome.fees,
                    rebate: outcome.rebate,
                    slippage_bps: outcome.slippage_bps,
                    temporary_impact_bps: outcome.temporary_impact_bps,
                    permanent_impact_bps: outcome.permanent_impact_bps,
                    success: true,
                    error: None,
                    degraded,
                }
            } else {
                ExecutionResult::failure(slice.id, slice.target_venue, now, ExecutionFailure::EmptyBook, degraded)
            }
        };

        let reward = compute_reward(&result, &latency, latency.predicted_us);

        let parent_done = if let Some(parent) = self.parents.get_mut(&parent_id) {
            parent.mark_dispatched();
            parent.record_execution(result);
            parent.status.is_terminal()
        } else {
            // The heap never holds a key for a parent that doesn't exist; reaching this
            // would mean the parents map was mutated out from under the scheduler.
            error!(%parent_id, "dispatched slice for a parent missing from the parent map");
            unreachable!("dispatched slice for unknown parent {parent_id}");
        };

        DispatchRecord {
            parent_id,
            slice,
            result,
            latency,
            reward,
            parent_done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicer::TwapParams;

    fn seeded_scheduler() -> Scheduler {
        let mut scheduler = Scheduler::new(CoreConfig::default());
        let symbol = Symbol::new(1);
        for venue in Venue::ALL {
            scheduler.seed_book(symbol, venue, Px::new(100.0), 1_000.0);
        }
        scheduler
    }

    #[test]
    fn submit_rejects_nonpositive_quantity() {
        let mut scheduler = seeded_scheduler();
        let err = scheduler
            .submit(
                Symbol::new(1),
                Side::Buy,
                Qty::ZERO,
                StrategyParams::Twap(TwapParams {
                    duration_secs: 60.0,
                    slice_interval_secs: 10.0,
                    randomize_timing: false,
                    randomize_size: false,
                }),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::Rejected { .. }));
    }

    #[test]
    fn submit_populates_heap_and_dispatch_drains_it() {
        let mut scheduler = seeded_scheduler();
        let parent_id = scheduler
            .submit(
                Symbol::new(1),
                Side::Buy,
                Qty::new(500.0),
                StrategyParams::Twap(TwapParams {
                    duration_secs: 60.0,
                    slice_interval_secs: 10.0,
                    randomize_timing: false,
                    randomize_size: false,
                }),
            )
            .unwrap();

        let total_slices = scheduler.parent(parent_id).unwrap().slices.len();
        assert!(total_slices > 0);

        let mut dispatched = 0;
        while scheduler.dispatch_next().is_some() {
            dispatched += 1;
        }
        assert_eq!(dispatched, total_slices);
        assert!(scheduler.parent(parent_id).unwrap().status.is_terminal());
    }

    #[test]
    fn cancelling_a_parent_drops_its_future_slices_lazily() {
        let mut scheduler = seeded_scheduler();
        let parent_id = scheduler
            .submit(
                Symbol::new(1),
                Side::Buy,
                Qty::new(500.0),
                StrategyParams::Twap(TwapParams {
                    duration_secs: 60.0,
                    slice_interval_secs: 10.0,
                    randomize_timing: false,
                    randomize_size: false,
                }),
            )
            .unwrap();

        scheduler.cancel(parent_id).unwrap();
        assert_eq!(scheduler.parent(parent_id).unwrap().status, ParentStatus::Cancelled);

        // Every remaining heap entry for this parent is skipped, never executed.
        while scheduler.dispatch_next().is_some() {}
        assert!(scheduler
            .parent(parent_id)
            .unwrap()
            .executions
            .is_empty());
    }

    #[test]
    fn cancel_unknown_parent_errors() {
        let mut scheduler = seeded_scheduler();
        let err = scheduler.cancel(ParentOrderId(9_999)).unwrap_err();
        assert!(matches!(err, CoreError::ParentNotFound(_)));
    }
}
