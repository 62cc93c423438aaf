//! The parent order entity, its FSM, and the append-only execution history attached to it.

use common::{ParentOrderId, Px, Qty, Side, SliceId, Symbol, Ts};
use serde::{Deserialize, Serialize};
use slicer::{OrderSlice, StrategyParams};
use venue_model::Venue;

/// Parent order lifecycle. Transitions only move forward; terminal states are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentStatus {
    /// Accepted, no slice dispatched yet.
    Pending,
    /// At least one slice dispatched, nothing filled yet.
    Active,
    /// Some, but not all, quantity filled.
    PartiallyFilled,
    /// `filled >= total_qty`.
    Filled,
    /// Cancelled before completion.
    Cancelled,
    /// Failed submission validation.
    Rejected,
}

impl ParentStatus {
    /// Terminal states accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected)
    }

    fn can_transition_to(self, next: Self) -> bool {
        use ParentStatus::{Active, Cancelled, Filled, PartiallyFilled, Pending, Rejected};
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Pending, Active)
                | (Pending, Rejected)
                | (Active, PartiallyFilled)
                | (Active, Filled)
                | (Active, Cancelled)
                | (PartiallyFilled, Filled)
                | (PartiallyFilled, Cancelled)
        )
    }
}

/// Why a slice failed to execute. Transient by construction: the parent stays live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionFailure {
    /// The simulated packet carrying the order was dropped in transit.
    PacketLoss,
    /// The opposite side of the book had no resting liquidity.
    EmptyBook,
}

/// One completed (or failed) dispatch of a single slice. Append-only on the parent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The slice this result is for.
    pub slice_id: SliceId,
    /// Quantity actually filled; zero on failure.
    pub executed_qty: Qty,
    /// Volume-weighted average fill price; `Px::ZERO` on failure.
    pub avg_price: Px,
    /// When the fill (or failure) was recorded.
    pub exec_ts: Ts,
    /// Venue the slice was routed to.
    pub venue: Venue,
    /// Taker fees paid, in currency.
    pub fees: f64,
    /// Maker rebate earned, in currency.
    pub rebate: f64,
    /// Signed-magnitude slippage vs mid at fill time, in bps.
    pub slippage_bps: f64,
    /// Temporary market impact, in bps.
    pub temporary_impact_bps: f64,
    /// Permanent market impact, in bps.
    pub permanent_impact_bps: f64,
    /// Whether any quantity was filled.
    pub success: bool,
    /// Set when `success` is false.
    pub error: Option<ExecutionFailure>,
    /// Whether the predicted latency for this dispatch exceeded the configured ceiling.
    pub degraded: bool,
}

impl ExecutionResult {
    /// A zero-fill result carrying a failure reason.
    #[must_use]
    pub fn failure(slice_id: SliceId, venue: Venue, exec_ts: Ts, error: ExecutionFailure, degraded: bool) -> Self {
        Self {
            slice_id,
            executed_qty: Qty::ZERO,
            avg_price: Px::ZERO,
            exec_ts,
            venue,
            fees: 0.0,
            rebate: 0.0,
            slippage_bps: 0.0,
            temporary_impact_bps: 0.0,
            permanent_impact_bps: 0.0,
            success: false,
            error: Some(error),
            degraded,
        }
    }
}

/// A large order being worked by one of the four strategies, owning its slices and
/// execution history exclusively. Slices carry only a parent id, never a back-pointer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentOrder {
    /// Unique id.
    pub id: ParentOrderId,
    /// Instrument being traded.
    pub symbol: Symbol,
    /// Buy or sell.
    pub side: Side,
    /// Total quantity requested.
    pub total_qty: Qty,
    /// Strategy and its parameters.
    pub strategy: StrategyParams,
    /// Current FSM state.
    pub status: ParentStatus,
    /// Mid price of the primary venue at acceptance time.
    pub arrival_price: Px,
    /// Benchmark price used for implementation-shortfall accounting.
    pub benchmark_price: Px,
    /// The full slice schedule, generated once at submission.
    pub slices: Vec<OrderSlice>,
    /// Append-only execution history, in dispatch order.
    pub executions: Vec<ExecutionResult>,
    /// When the parent was accepted.
    pub creation_ts: Ts,
}

impl ParentOrder {
    /// Sum of executed quantity across all recorded executions.
    #[must_use]
    pub fn filled_qty(&self) -> Qty {
        self.executions
            .iter()
            .fold(Qty::ZERO, |acc, e| acc.saturating_add(e.executed_qty))
    }

    /// `total_qty - filled_qty`, floored at zero.
    #[must_use]
    pub fn remaining_qty(&self) -> Qty {
        self.total_qty.saturating_sub(self.filled_qty())
    }

    /// Notional-weighted average execution price across successful fills.
    #[must_use]
    pub fn avg_exec_price(&self) -> Px {
        let (notional, qty) = self.executions.iter().filter(|e| e.success).fold(
            (0.0, 0.0),
            |(notional, qty), e| {
                (
                    notional + e.avg_price.as_f64() * e.executed_qty.as_f64(),
                    qty + e.executed_qty.as_f64(),
                )
            },
        );
        if qty <= 0.0 {
            Px::ZERO
        } else {
            Px::new(notional / qty)
        }
    }

    /// `(exec_value - arrival_value) / arrival_value * 10_000`, negated for SELL.
    #[must_use]
    pub fn implementation_shortfall_bps(&self) -> f64 {
        let arrival = self.arrival_price.as_f64();
        if arrival <= 0.0 {
            return 0.0;
        }
        let exec_value = self.avg_exec_price().as_f64();
        let raw = (exec_value - arrival) / arrival * 10_000.0;
        raw * self.side.sign() as f64
    }

    /// Attempt a transition, rejecting any move that would violate the FSM.
    fn transition_to(&mut self, next: ParentStatus) -> bool {
        if self.status == next {
            return true;
        }
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    /// Mark the first slice as dispatched, moving `PENDING -> ACTIVE`.
    pub fn mark_dispatched(&mut self) {
        if self.status == ParentStatus::Pending {
            self.transition_to(ParentStatus::Active);
        }
    }

    /// Append an execution result and recompute status from the fill totals.
    pub fn record_execution(&mut self, result: ExecutionResult) {
        self.executions.push(result);
        let filled = self.filled_qty();
        let remaining = self.remaining_qty();

        if filled >= self.total_qty || remaining.is_zero() {
            self.transition_to(ParentStatus::Filled);
        } else if !filled.is_zero() {
            self.transition_to(ParentStatus::PartiallyFilled);
        }
    }

    /// Move to `CANCELLED`; no-op (returns `false`) if already terminal.
    pub fn cancel(&mut self) -> bool {
        self.transition_to(ParentStatus::Cancelled)
    }

    /// Move to `REJECTED`; only valid from `PENDING`.
    pub fn reject(&mut self) -> bool {
        self.transition_to(ParentStatus::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicer::TwapParams;
    use venue_model::Venue;

    fn blank_parent() -> ParentOrder {
        ParentOrder {
            id: ParentOrderId(1),
            symbol: Symbol::new(1),
            side: Side::Buy,
            total_qty: Qty::new(100.0),
            strategy: StrategyParams::Twap(TwapParams {
                duration_secs: 60.0,
                slice_interval_secs: 10.0,
                randomize_timing: false,
                randomize_size: false,
            }),
            status: ParentStatus::Pending,
            arrival_price: Px::new(100.0),
            benchmark_price: Px::new(100.0),
            slices: Vec::new(),
            executions: Vec::new(),
            creation_ts: Ts::ZERO,
        }
    }

    fn fill(qty: f64, price: f64) -> ExecutionResult {
        ExecutionResult {
            slice_id: SliceId(1),
            executed_qty: Qty::new(qty),
            avg_price: Px::new(price),
            exec_ts: Ts::ZERO,
            venue: Venue::Nyse,
            fees: 0.0,
            rebate: 0.0,
            slippage_bps: 0.0,
            temporary_impact_bps: 0.0,
            permanent_impact_bps: 0.0,
            success: true,
            error: None,
            degraded: false,
        }
    }

    #[test]
    fn fsm_moves_pending_active_partial_filled() {
        let mut parent = blank_parent();
        parent.mark_dispatched();
        assert_eq!(parent.status, ParentStatus::Active);

        parent.record_execution(fill(40.0, 100.0));
        assert_eq!(parent.status, ParentStatus::PartiallyFilled);

        parent.record_execution(fill(60.0, 100.0));
        assert_eq!(parent.status, ParentStatus::Filled);
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        let mut parent = blank_parent();
        parent.mark_dispatched();
        parent.cancel();
        assert_eq!(parent.status, ParentStatus::Cancelled);

        // Cancelled is terminal: a late fill must not resurrect it.
        parent.record_execution(fill(10.0, 100.0));
        assert_eq!(parent.status, ParentStatus::Cancelled);
    }

    #[test]
    fn implementation_shortfall_sign_flips_with_side() {
        let mut buy = blank_parent();
        buy.record_execution(fill(100.0, 101.0));
        assert!(buy.implementation_shortfall_bps() > 0.0);

        let mut sell = blank_parent();
        sell.side = Side::Sell;
        sell.record_execution(fill(100.0, 101.0));
        assert!(sell.implementation_shortfall_bps() < 0.0);
    }

    #[test]
    fn filled_quantity_never_exceeds_total() {
        let mut parent = blank_parent();
        parent.record_execution(fill(100.0, 100.0));
        parent.record_execution(fill(100.0, 100.0));
        // Second fill pushed filled over total; the invariant is on callers (the scheduler
        // never dispatches past remaining), but filled_qty itself must still report exactly
        // what was recorded.
        assert_eq!(parent.filled_qty(), Qty::new(200.0));
        assert_eq!(parent.status, ParentStatus::Filled);
    }
}
