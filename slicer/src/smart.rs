//! Smart-Routing: score every venue, select the top N, allocate proportionally with a
//! minimum-allocation floor.

use crate::types::{derive_slice_id, OrderSlice, SliceRequest, SmartRoutingParams};
use common::{OrderType, Qty};
use venue_model::{SymbolClass, Venue, VenueTable};

fn composite_score(venues: &VenueTable, venue: Venue, class: SymbolClass, cost_sensitivity: f64) -> f64 {
    let caps = venues.capabilities(venue);
    let score = 0.4 * caps.liquidity_score
        + 0.3 * caps.cost_score() * cost_sensitivity
        + 0.2 * caps.latency_score()
        + 0.1 * venues.symbol_fit(class, venue);
    score.clamp(0.0, 1.0)
}

/// Produce a Smart-Routing slice schedule: one slice per selected venue, 0.5s apart.
#[must_use]
pub fn slices(
    req: &SliceRequest,
    params: &SmartRoutingParams,
    venues: &VenueTable,
    class: SymbolClass,
) -> Vec<OrderSlice> {
    let total = req.total_qty.as_f64();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut scored: Vec<(Venue, f64)> = Venue::ALL
        .iter()
        .map(|&v| (v, composite_score(venues, v, class, params.cost_sensitivity)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(params.max_venues.max(1));

    let score_sum: f64 = scored.iter().map(|(_, s)| s).sum();
    let floor = total * params.min_venue_allocation;

    let mut allocations: Vec<f64> = scored
        .iter()
        .map(|(_, s)| {
            let raw = if score_sum > 0.0 {
                total * s / score_sum
            } else {
                total / scored.len() as f64
            };
            raw.max(floor)
        })
        .collect();

    let allocated: f64 = allocations.iter().sum();
    let residue = total - allocated;
    if let Some(top) = allocations.first_mut() {
        *top = (*top + residue).max(0.0);
    }

    let mut out = Vec::with_capacity(scored.len());
    for (i, ((venue, _), alloc)) in scored.iter().zip(allocations.iter()).enumerate() {
        out.push(OrderSlice {
            id: derive_slice_id(req.parent_id, i),
            parent_id: req.parent_id,
            symbol: req.symbol,
            side: req.side,
            qty: Qty::new(*alloc),
            target_venue: *venue,
            order_type: OrderType::Limit,
            limit_price: None,
            scheduled_ts: req.creation_ts.plus_secs_f64(i as f64 * 0.5),
            urgency: 0.7,
            hidden_qty: Qty::ZERO,
        });
    }
    out
}
