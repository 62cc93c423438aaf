//! A single `(symbol, venue)` book: five levels per side, sorted outward from the top.

use common::{Px, Qty, Symbol, Ts};
use venue_model::Venue;

/// One resting level of the book.
#[derive(Debug, Clone, Copy)]
pub struct OrderBookLevel {
    /// Level price.
    pub price: Px,
    /// Displayed size.
    pub size: Qty,
    /// Number of resting orders contributing to `size`.
    pub num_orders: u32,
    /// When this level was last touched by a fill, echo, or refresh.
    pub last_update: Ts,
}

/// Errors that can occur while seeding or mutating a book. These never surface to
/// `simulate_fill` callers; a crossed or invalid book is an internal invariant failure.
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    /// The requested level index doesn't exist.
    #[error("invalid level index {0}, depth is {1}")]
    InvalidLevel(usize, usize),
}

/// Number of levels quoted per side.
pub const DEPTH: usize = common::constants::trading::BOOK_DEPTH;

/// A single `(symbol, venue)` order book.
#[derive(Debug, Clone)]
pub struct OrderBook {
    pub(crate) symbol: Symbol,
    pub(crate) venue: Venue,
    pub(crate) target_spread_bps: f64,
    pub(crate) mean_level_size: f64,
    pub(crate) bids: [OrderBookLevel; DEPTH],
    pub(crate) asks: [OrderBookLevel; DEPTH],
}

impl OrderBook {
    /// Best bid (price, size), if any size remains.
    #[must_use]
    pub fn best_bid(&self) -> Option<(Px, Qty)> {
        let top = self.bids[0];
        (!top.size.is_zero()).then_some((top.price, top.size))
    }

    /// Best ask (price, size), if any size remains.
    #[must_use]
    pub fn best_ask(&self) -> Option<(Px, Qty)> {
        let top = self.asks[0];
        (!top.size.is_zero()).then_some((top.price, top.size))
    }

    /// Mid of best bid/ask; falls back to the single-sided quote if one side is empty.
    #[must_use]
    pub fn mid(&self) -> Option<Px> {
        match (self.best_bid(), self.best_ask()) {
            (Some((b, _)), Some((a, _))) => Some(Px::from_i64((b.as_i64() + a.as_i64()) / 2)),
            (Some((b, _)), None) => Some(b),
            (None, Some((a, _))) => Some(a),
            (None, None) => None,
        }
    }

    /// Read-only view of a side's levels, outward from the top.
    #[must_use]
    pub fn levels(&self, side: common::Side) -> &[OrderBookLevel; DEPTH] {
        match side {
            common::Side::Buy => &self.asks,
            common::Side::Sell => &self.bids,
        }
    }
}

/// Snapshot of the top of book, returned by [`crate::BookSimulator::quote`].
#[derive(Debug, Clone, Copy)]
pub struct OrderBookView {
    /// Best bid price, if quoted.
    pub best_bid: Option<Px>,
    /// Best ask price, if quoted.
    pub best_ask: Option<Px>,
    /// Size at the best bid.
    pub bid_size: Qty,
    /// Size at the best ask.
    pub ask_size: Qty,
}
