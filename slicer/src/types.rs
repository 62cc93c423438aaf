//! Slicer input/output types. All four strategies share these shapes; the enum of
//! strategies is a closed variant set dispatched by tag (see [`StrategyParams::slice`]).

use common::{OrderType, ParentOrderId, Px, Qty, Side, SliceId, Symbol, Ts};
use serde::{Deserialize, Serialize};
use venue_model::Venue;

/// What a slicer needs from a parent order; deliberately narrower than the scheduler's
/// full runtime view so this crate never has to know about parent status or history.
#[derive(Debug, Clone, Copy)]
pub struct SliceRequest {
    /// Owning parent order.
    pub parent_id: ParentOrderId,
    /// Instrument to trade.
    pub symbol: Symbol,
    /// Side of the parent order.
    pub side: Side,
    /// Total quantity to work.
    pub total_qty: Qty,
    /// When the parent was accepted; slice schedules are relative to this.
    pub creation_ts: Ts,
}

/// A scheduled child order produced by a slicer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderSlice {
    /// Id, deterministic in `(parent_id, index)` so identical `(request, seed)` pairs
    /// always produce identical slice lists.
    pub id: SliceId,
    /// Owning parent; slices never carry a back-pointer beyond this id.
    pub parent_id: ParentOrderId,
    /// Instrument to trade.
    pub symbol: Symbol,
    /// Side, inherited from the parent.
    pub side: Side,
    /// Displayed (visible) quantity for this slice.
    pub qty: Qty,
    /// Venue this slice is routed to.
    pub target_venue: Venue,
    /// Market or limit.
    pub order_type: OrderType,
    /// Limit price, set for LIMIT slices.
    pub limit_price: Option<Px>,
    /// When the scheduler should dispatch this slice.
    pub scheduled_ts: Ts,
    /// Urgency in `[0, 1]`, used by the scheduler/policy to bias behavior.
    pub urgency: f64,
    /// Additional quantity held back from display (iceberg-style).
    pub hidden_qty: Qty,
}

/// Deterministic slice id: `parent_id * 1_000_000 + index + 1`, avoiding any dependence on
/// shared generator state so re-slicing the same request always yields the same ids.
#[must_use]
pub fn derive_slice_id(parent_id: ParentOrderId, index: usize) -> SliceId {
    SliceId(parent_id.0 * 1_000_000 + index as u64 + 1)
}

/// TWAP parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TwapParams {
    /// Total duration to work the order over, in seconds.
    pub duration_secs: f64,
    /// Target interval between slices, in seconds.
    pub slice_interval_secs: f64,
    /// Jitter slice timing by up to ±25% of the interval.
    pub randomize_timing: bool,
    /// Jitter slice size by ×Uniform(0.8, 1.2).
    pub randomize_size: bool,
}

/// VWAP parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VwapParams {
    /// Total duration to work the order over, in seconds.
    pub duration_secs: f64,
    /// Target participation rate (informational; allocation follows the volume curve).
    pub participation_rate: f64,
    /// Ceiling on participation rate.
    pub max_participation: f64,
}

/// Iceberg parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IcebergParams {
    /// Quantity shown per slice.
    pub display_size: Qty,
    /// Fraction of the display consumed before the display should be topped up; informs
    /// runtime replenishment, not slice generation.
    pub refresh_threshold: f64,
}

/// Smart-Routing parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SmartRoutingParams {
    /// Maximum number of venues to split the order across.
    pub max_venues: usize,
    /// Weight given to cost (fees/rebates) vs. other scoring factors, in `[0, 1]`.
    pub cost_sensitivity: f64,
    /// Minimum fraction of the parent quantity any selected venue must receive.
    pub min_venue_allocation: f64,
}

/// The closed set of supported execution strategies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum StrategyParams {
    /// Time-weighted average price.
    Twap(TwapParams),
    /// Volume-weighted average price.
    Vwap(VwapParams),
    /// Iceberg (displayed + hidden quantity).
    Iceberg(IcebergParams),
    /// Cost/latency/liquidity-aware smart order routing.
    SmartRouting(SmartRoutingParams),
}

impl StrategyParams {
    /// Human-readable tag, dispatched on below rather than downcast on any subtype.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Twap(_) => "twap",
            Self::Vwap(_) => "vwap",
            Self::Iceberg(_) => "iceberg",
            Self::SmartRouting(_) => "smart_routing",
        }
    }
}
