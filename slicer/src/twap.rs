//! TWAP: evenly spaced slices, round-robined across the top-3 venues by liquidity.

use crate::types::{derive_slice_id, OrderSlice, SliceRequest, TwapParams};
use common::constants::trading::{MAX_TWAP_SLICES, MIN_TWAP_SLICE_QTY};
use common::{OrderType, Qty, Ts};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use venue_model::VenueTable;

/// Produce a TWAP slice schedule. Pure: never mutates `req`; identical `(req, params)` and
/// identical RNG draws (or `randomize_* = false`) always yield identical output.
#[must_use]
pub fn slices(
    req: &SliceRequest,
    params: &TwapParams,
    venues: &VenueTable,
    rng: &mut impl Rng,
) -> Vec<OrderSlice> {
    let total = req.total_qty.as_f64();
    if total <= 0.0 {
        return Vec::new();
    }

    let n_by_duration = ((params.duration_secs / params.slice_interval_secs).floor() as usize)
        .clamp(1, MAX_TWAP_SLICES);
    let mut n = n_by_duration;
    while n > 1 && total / n as f64 < MIN_TWAP_SLICE_QTY {
        n -= 1;
    }

    let base_size = total / n as f64;
    let top3 = venues.by_liquidity_desc();
    let size_jitter = Uniform::new(0.8, 1.2);
    let timing_jitter = Uniform::new(-0.25, 0.25);

    let mut out = Vec::with_capacity(n);
    let mut remaining = req.total_qty;
    for i in 0..n {
        let is_last = i == n - 1;
        let size = if is_last {
            remaining
        } else {
            let raw = if params.randomize_size {
                base_size * size_jitter.sample(rng)
            } else {
                base_size
            };
            Qty::new(raw).min(remaining)
        };
        remaining = remaining.saturating_sub(size);

        let jitter_secs = if params.randomize_timing && i > 0 {
            timing_jitter.sample(rng) * params.slice_interval_secs
        } else {
            0.0
        };
        let scheduled_ts = req
            .creation_ts
            .plus_secs_f64(i as f64 * params.slice_interval_secs + jitter_secs);

        out.push(OrderSlice {
            id: derive_slice_id(req.parent_id, i),
            parent_id: req.parent_id,
            symbol: req.symbol,
            side: req.side,
            qty: size,
            target_venue: top3[i % top3.len().min(3)],
            order_type: OrderType::Market,
            limit_price: None,
            scheduled_ts,
            urgency: 0.3,
            hidden_qty: Qty::ZERO,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ParentOrderId, Side, Symbol};
    use venue_model::Venue;

    fn req(qty: f64) -> SliceRequest {
        SliceRequest {
            parent_id: ParentOrderId(1),
            symbol: Symbol::new(1),
            side: Side::Buy,
            total_qty: Qty::new(qty),
            creation_ts: Ts::from_nanos(0),
        }
    }

    #[test]
    fn deterministic_schedule_matches_scenario() {
        let venues = VenueTable::default_table();
        let params = TwapParams {
            duration_secs: 600.0,
            slice_interval_secs: 30.0,
            randomize_timing: false,
            randomize_size: false,
        };
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let out = slices(&req(1_000.0), &params, &venues, &mut rng);

        assert_eq!(out.len(), 20);
        for s in &out {
            assert_eq!(s.qty, Qty::new(50.0));
        }
        assert_eq!(out[0].target_venue, Venue::Nyse);
        assert_eq!(out[1].target_venue, Venue::Nasdaq);
        assert_eq!(out[2].target_venue, Venue::Arca);
        assert_eq!(out[3].target_venue, Venue::Nyse);
        assert_eq!(out[19].scheduled_ts, Ts::from_nanos(570 * 1_000_000_000));
    }

    #[test]
    fn identical_seed_yields_identical_slices() {
        let venues = VenueTable::default_table();
        let params = TwapParams {
            duration_secs: 300.0,
            slice_interval_secs: 30.0,
            randomize_timing: true,
            randomize_size: true,
        };
        let mut rng1 = rand::rngs::mock::StepRng::new(42, 7);
        let mut rng2 = rand::rngs::mock::StepRng::new(42, 7);
        let a = slices(&req(500.0), &params, &venues, &mut rng1);
        let b = slices(&req(500.0), &params, &venues, &mut rng2);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.qty, y.qty);
            assert_eq!(x.scheduled_ts, y.scheduled_ts);
            assert_eq!(x.target_venue, y.target_venue);
        }
    }

    #[test]
    fn small_quantity_reduces_slice_count_never_below_min() {
        let venues = VenueTable::default_table();
        let params = TwapParams {
            duration_secs: 600.0,
            slice_interval_secs: 30.0,
            randomize_timing: false,
            randomize_size: false,
        };
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let out = slices(&req(40.0), &params, &venues, &mut rng);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].qty, Qty::new(40.0));
    }

    #[test]
    fn qty_of_one_yields_single_slice() {
        let venues = VenueTable::default_table();
        let params = TwapParams {
            duration_secs: 600.0,
            slice_interval_secs: 30.0,
            randomize_timing: false,
            randomize_size: false,
        };
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let out = slices(&req(1.0), &params, &venues, &mut rng);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].qty, Qty::new(1.0));
    }
}
