//! Iceberg: repeated displays of a fixed visible size, carrying the balance as hidden qty.

use crate::types::{derive_slice_id, IcebergParams, OrderSlice, SliceRequest};
use common::constants::trading::MAX_ICEBERG_SLICES;
use common::{OrderType, Qty};
use rand::Rng;
use venue_model::ICEBERG_FRIENDLY_VENUES;

/// Produce an Iceberg slice schedule, capped at [`MAX_ICEBERG_SLICES`] displays two seconds
/// apart, each routed to a random hidden-order-friendly venue.
#[must_use]
pub fn slices(req: &SliceRequest, params: &IcebergParams, rng: &mut impl Rng) -> Vec<OrderSlice> {
    let mut out = Vec::new();
    let mut remaining = req.total_qty;
    let mut i = 0usize;

    while !remaining.is_zero() && i < MAX_ICEBERG_SLICES {
        let visible = params.display_size.min(remaining);
        let hidden = remaining
            .saturating_sub(visible)
            .min(Qty::new(3.0 * params.display_size.as_f64()));
        let venue =
            ICEBERG_FRIENDLY_VENUES[rng.gen_range(0..ICEBERG_FRIENDLY_VENUES.len())];

        out.push(OrderSlice {
            id: derive_slice_id(req.parent_id, i),
            parent_id: req.parent_id,
            symbol: req.symbol,
            side: req.side,
            qty: visible,
            target_venue: venue,
            order_type: OrderType::Limit,
            limit_price: None,
            scheduled_ts: req.creation_ts.plus_secs_f64(i as f64 * 2.0),
            urgency: 0.6,
            hidden_qty: hidden,
        });

        remaining = remaining.saturating_sub(visible);
        i += 1;
    }
    out
}
