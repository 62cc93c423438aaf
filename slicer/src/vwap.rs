//! VWAP: allocate along a U-shaped intraday volume curve, bucketed into 5-minute windows.

use crate::twap;
use crate::types::{derive_slice_id, OrderSlice, SliceRequest, TwapParams, VwapParams};
use common::constants::time::VWAP_BUCKET_MINUTES;
use common::{OrderType, Qty, Ts};
use rand::Rng;
use venue_model::{SymbolClass, Venue};

/// U-shaped intraday base weight: peaks at the open and close, troughs at midday.
fn u_shape(x: f64) -> f64 {
    1.0 + 3.0 * (2.0 * x - 1.0).powi(2)
}

fn symbol_multiplier(class: SymbolClass) -> f64 {
    match class {
        SymbolClass::Etf => 1.1,
        SymbolClass::Tech => 1.3,
        SymbolClass::LargeCap => 1.0,
        SymbolClass::Other => 0.7,
    }
}

/// Produce a VWAP slice schedule. Falls back to TWAP when no bucket in the requested
/// window falls inside trading hours (the volume curve is undefined out of hours).
#[must_use]
pub fn slices(
    req: &SliceRequest,
    params: &VwapParams,
    class: SymbolClass,
    session_length_secs: f64,
    rng: &mut impl Rng,
) -> Vec<OrderSlice> {
    let total = req.total_qty.as_f64();
    if total <= 0.0 {
        return Vec::new();
    }

    let bucket_secs = (VWAP_BUCKET_MINUTES * 60) as f64;
    let num_buckets = ((params.duration_secs / bucket_secs).ceil() as usize).max(1);

    let mut weights = Vec::with_capacity(num_buckets);
    for k in 0..num_buckets {
        let bucket_start_secs = k as f64 * bucket_secs;
        if bucket_start_secs >= session_length_secs {
            continue;
        }
        let x = (bucket_start_secs / session_length_secs).clamp(0.0, 1.0);
        weights.push(u_shape(x) * symbol_multiplier(class));
    }

    if weights.is_empty() {
        let fallback = TwapParams {
            duration_secs: params.duration_secs,
            slice_interval_secs: bucket_secs,
            randomize_timing: false,
            randomize_size: false,
        };
        return twap::slices(req, &fallback, &venue_model::VenueTable::default_table(), rng);
    }

    let weight_sum: f64 = weights.iter().sum();
    let normalized: Vec<f64> = weights.iter().map(|w| w / weight_sum).collect();

    let mut out = Vec::with_capacity(normalized.len());
    let mut remaining = req.total_qty;
    let last_idx = normalized.len() - 1;
    for (i, w) in normalized.iter().enumerate() {
        let qty = if i == last_idx {
            remaining
        } else {
            Qty::new(total * w).min(remaining)
        };
        remaining = remaining.saturating_sub(qty);

        let venue = if *w > 0.15 {
            Venue::Nyse
        } else if *w > 0.10 {
            Venue::Nasdaq
        } else {
            let rest = [Venue::Arca, Venue::Iex, Venue::Cboe];
            rest[rng.gen_range(0..rest.len())]
        };

        out.push(OrderSlice {
            id: derive_slice_id(req.parent_id, i),
            parent_id: req.parent_id,
            symbol: req.symbol,
            side: req.side,
            qty,
            target_venue: venue,
            order_type: OrderType::Limit,
            limit_price: None,
            scheduled_ts: req.creation_ts.plus_secs_f64(i as f64 * bucket_secs),
            urgency: 0.4,
            hidden_qty: Qty::ZERO,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ParentOrderId, Side, Symbol};

    fn req(qty: f64) -> SliceRequest {
        SliceRequest {
            parent_id: ParentOrderId(9),
            symbol: Symbol::new(2),
            side: Side::Buy,
            total_qty: Qty::new(qty),
            creation_ts: Ts::from_nanos(0),
        }
    }

    #[test]
    fn allocations_sum_to_total() {
        let params = VwapParams {
            duration_secs: 3_600.0,
            participation_rate: 0.1,
            max_participation: 0.3,
        };
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let out = slices(&req(1_200.0), &params, SymbolClass::Tech, 23_400.0, &mut rng);
        let total: i64 = out.iter().map(|s| s.qty.as_i64()).sum();
        assert_eq!(total, Qty::new(1_200.0).as_i64());
    }

    #[test]
    fn falls_back_to_twap_out_of_hours() {
        let params = VwapParams {
            duration_secs: 600.0,
            participation_rate: 0.1,
            max_participation: 0.3,
        };
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let req = SliceRequest {
            parent_id: ParentOrderId(1),
            symbol: Symbol::new(2),
            side: Side::Buy,
            total_qty: Qty::new(100.0),
            creation_ts: Ts::from_nanos(0),
        };
        // session_length_secs = 0 means every bucket starts at/after close.
        let out = slices(&req, &params, SymbolClass::Tech, 0.0, &mut rng);
        assert!(!out.is_empty());
        assert_eq!(out[0].order_type, OrderType::Market);
    }
}
