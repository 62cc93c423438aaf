//! Book seeding, fill simulation and market-impact accounting.

use crate::book::{OrderBook, OrderBookLevel, OrderBookView, DEPTH};
use common::constants::trading::{MAX_WALK_LEVELS, MIN_LEVEL_SIZE};
use common::{Px, Qty, Side, Symbol, Ts};
use rand::Rng;
use rand_distr::{Distribution, Exp, Uniform};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};
use venue_model::{Venue, VenueCapabilities};

/// Result of a single `simulate_fill` call.
#[derive(Debug, Clone, Copy)]
pub struct FillOutcome {
    /// Quantity actually filled (may be zero).
    pub filled_qty: Qty,
    /// Volume-weighted average fill price; `Px::ZERO` if nothing filled.
    pub avg_price: Px,
    /// Mid price at the moment of the fill, used by callers to derive slippage/shortfall.
    pub mid_at_fill: Px,
    /// Temporary (decaying) market impact, in bps of notional.
    pub temporary_impact_bps: f64,
    /// Permanent market impact, in bps of notional.
    pub permanent_impact_bps: f64,
    /// Signed slippage vs mid, in bps.
    pub slippage_bps: f64,
    /// Taker fees paid, in currency.
    pub fees: f64,
    /// Maker rebate earned, in currency (zero unless the slice was a passive limit).
    pub rebate: f64,
    /// Whether any quantity was filled.
    pub success: bool,
}

impl FillOutcome {
    fn failure(mid: Px) -> Self {
        Self {
            filled_qty: Qty::ZERO,
            avg_price: Px::ZERO,
            mid_at_fill: mid,
            temporary_impact_bps: 0.0,
            permanent_impact_bps: 0.0,
            slippage_bps: 0.0,
            fees: 0.0,
            rebate: 0.0,
            success: false,
        }
    }
}

/// Owns every simulated `(symbol, venue)` book. Single-owner (the scheduler task); no
/// internal synchronization.
pub struct BookSimulator {
    books: FxHashMap<(Symbol, Venue), OrderBook>,
    rng: rand::rngs::StdRng,
}

impl BookSimulator {
    /// Create a simulator with a seeded RNG, for deterministic tests and reproducible runs.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        Self {
            books: FxHashMap::default(),
            rng: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }

    /// Seed a fresh book for `(symbol, venue)` around `mid`, drawing a target spread
    /// uniformly in `[2, 8]` bps and level sizes from an exponential distribution with
    /// mean `mean_level_size`, clamped to a minimum of 100.
    pub fn seed_book(&mut self, symbol: Symbol, venue: Venue, mid: Px, mean_level_size: f64) {
        let spread_bps = Uniform::new_inclusive(2.0, 8.0).sample(&mut self.rng);
        let dollar_spread = mid.as_f64() * spread_bps / 10_000.0;
        let half_spread = dollar_spread / 2.0;

        let exp = Exp::new(1.0 / mean_level_size.max(1.0)).expect("positive mean");
        let mut draw_size = |rng: &mut rand::rngs::StdRng| -> Qty {
            let raw = exp.sample(rng).max(MIN_LEVEL_SIZE);
            Qty::new(raw)
        };

        let mut bids = [OrderBookLevel {
            price: Px::ZERO,
            size: Qty::ZERO,
            num_orders: 1,
            last_update: Ts::ZERO,
        }; DEPTH];
        let mut asks = bids;

        // Level i sits `half_spread` beyond the top plus i additional half-spread steps.
        for i in 0..DEPTH {
            let step = (i as f64) * half_spread;
            bids[i] = OrderBookLevel {
                price: Px::new(mid.as_f64() - half_spread - step),
                size: draw_size(&mut self.rng),
                num_orders: 1,
                last_update: Ts::ZERO,
            };
            asks[i] = OrderBookLevel {
                price: Px::new(mid.as_f64() + half_spread + step),
                size: draw_size(&mut self.rng),
                num_orders: 1,
                last_update: Ts::ZERO,
            };
        }

        self.books.insert(
            (symbol, venue),
            OrderBook {
                symbol,
                venue,
                target_spread_bps: spread_bps,
                mean_level_size,
                bids,
                asks,
            },
        );
    }

    /// Top-of-book quote for `(symbol, venue)`, if a book has been seeded.
    #[must_use]
    pub fn quote(&self, symbol: Symbol, venue: Venue) -> Option<OrderBookView> {
        let book = self.books.get(&(symbol, venue))?;
        let (best_bid, bid_size) = book
            .best_bid()
            .map_or((None, Qty::ZERO), |(p, q)| (Some(p), q));
        let (best_ask, ask_size) = book
            .best_ask()
            .map_or((None, Qty::ZERO), |(p, q)| (Some(p), q));
        Some(OrderBookView {
            best_bid,
            best_ask,
            bid_size,
            ask_size,
        })
    }

    /// Simulate a fill of `qty` on `side` at `(symbol, venue)`.
    ///
    /// Never panics or returns an error: an empty opposite side yields
    /// `FillOutcome { success: false, .. }`.
    pub fn simulate_fill(
        &mut self,
        symbol: Symbol,
        venue: Venue,
        side: Side,
        qty: Qty,
        order_type: common::OrderType,
        venue_caps: VenueCapabilities,
    ) -> FillOutcome {
        let Some(mid) = self.books.get(&(symbol, venue)).and_then(OrderBook::mid) else {
            warn!(%symbol, %venue, "no book seeded; fill request against an unknown book");
            return FillOutcome::failure(Px::ZERO);
        };

        let (filled, total_cost, liquidity_consumed, touched) = {
            let book = self.books.get_mut(&(symbol, venue)).expect("checked above");
            walk_levels(book, side, qty)
        };

        if filled.is_zero() {
            debug!(%symbol, %venue, ?side, "opposite side empty, fill attempt produced zero quantity");
            return FillOutcome::failure(mid);
        }

        let avg_price = Px::new(total_cost / filled.as_f64());
        let temporary_impact_bps =
            10.0 * liquidity_consumed + Exp::new(2.0).expect("rate > 0").sample(&mut self.rng);
        let permanent_impact_bps = 0.3 * temporary_impact_bps;
        let slippage_bps = if mid.as_f64() > 0.0 {
            (avg_price.as_f64() - mid.as_f64()).abs() / mid.as_f64() * 10_000.0
        } else {
            0.0
        };
        let fees = filled.as_f64() * venue_caps.taker_fee;
        let rebate = if order_type == common::OrderType::Limit && venue_caps.is_rebate_paying() {
            filled.as_f64() * venue_caps.maker_rebate
        } else {
            0.0
        };

        self.apply_post_fill_evolution(symbol, venue, side, &touched, temporary_impact_bps);

        FillOutcome {
            filled_qty: filled,
            avg_price,
            mid_at_fill: mid,
            temporary_impact_bps,
            permanent_impact_bps,
            slippage_bps,
            fees,
            rebate,
            success: true,
        }
    }

    fn apply_post_fill_evolution(
        &mut self,
        symbol: Symbol,
        venue: Venue,
        side: Side,
        touched: &[(usize, Qty)],
        temporary_impact_bps: f64,
    ) {
        let mean_level_size = self
            .books
            .get(&(symbol, venue))
            .map_or(1_000.0, |b| b.mean_level_size);

        // Refresh any directly-consumed level that fell below the minimum.
        if let Some(book) = self.books.get_mut(&(symbol, venue)) {
            let levels = match side {
                Side::Buy => &mut book.asks,
                Side::Sell => &mut book.bids,
            };
            for &(idx, _) in touched {
                refresh_if_depleted(&mut levels[idx], mean_level_size, &mut self.rng);
            }
        }

        // Cross-venue echo: reduce the top 1-2 levels of the same side, same symbol, on
        // every OTHER venue proportionally to 10% of this fill's temporary impact.
        let echo_factor = 0.1 * (temporary_impact_bps / 10_000.0);
        for other_venue in Venue::ALL {
            if other_venue == venue {
                continue;
            }
            let mean = self
                .books
                .get(&(symbol, other_venue))
                .map_or(mean_level_size, |b| b.mean_level_size);
            if let Some(book) = self.books.get_mut(&(symbol, other_venue)) {
                let levels = match side {
                    Side::Buy => &mut book.asks,
                    Side::Sell => &mut book.bids,
                };
                for level in levels.iter_mut().take(2) {
                    let reduced = (level.size.as_f64() * (1.0 - echo_factor)).max(0.0);
                    level.size = Qty::new(reduced);
                    refresh_if_depleted(level, mean, &mut self.rng);
                }
            }
        }
    }
}

fn refresh_if_depleted(
    level: &mut OrderBookLevel,
    mean_level_size: f64,
    rng: &mut rand::rngs::StdRng,
) {
    if level.size.as_f64() < MIN_LEVEL_SIZE {
        let exp = Exp::new(1.0 / mean_level_size.max(1.0)).expect("positive mean");
        level.size = Qty::new(exp.sample(rng).max(MIN_LEVEL_SIZE));
    }
}

/// Walk up to [`MAX_WALK_LEVELS`] levels on the opposite side of `side`, filling
/// `min(remaining, level.size)` at each, stopping early only on a *partial* take that still
/// absorbs more than half the level's displayed size; a level fully consumed always advances
/// to the next. Returns `(filled, total_cost, liquidity_consumed, touched)`.
fn walk_levels(book: &mut OrderBook, side: Side, qty: Qty) -> (Qty, f64, f64, Vec<(usize, Qty)>) {
    let levels = match side {
        Side::Buy => &mut book.asks,
        Side::Sell => &mut book.bids,
    };

    let mut remaining = qty;
    let mut filled = Qty::ZERO;
    let mut total_cost = 0.0;
    let mut liquidity_consumed = 0.0;
    let mut touched = Vec::with_capacity(MAX_WALK_LEVELS);

    for (idx, level) in levels.iter_mut().enumerate().take(MAX_WALK_LEVELS) {
        if remaining.is_zero() || level.size.is_zero() {
            continue;
        }
        let level_size = level.size;
        let take = remaining.min(level_size);
        let fraction_of_level = take.as_f64() / level_size.as_f64();

        level.size = level.size.saturating_sub(take);
        filled = filled.saturating_add(take);
        total_cost += take.as_f64() * level.price.as_f64();
        liquidity_consumed += fraction_of_level;
        remaining = remaining.saturating_sub(take);
        touched.push((idx, take));

        if remaining.is_zero() {
            break;
        }
        if take < level_size && fraction_of_level > 0.5 {
            break;
        }
    }

    (filled, total_cost, liquidity_consumed, touched)
}
