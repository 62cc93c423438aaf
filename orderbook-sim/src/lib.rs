//! Per-`(symbol, venue)` multi-level order book simulator with market-impact accounting.
//!
//! Unlike a live order book shared by many concurrent readers, a [`BookSimulator`] is
//! exclusively owned by the execution scheduler task (see the concurrency model), so it
//! holds plain mutable state rather than atomics or locks around each level.

mod book;
mod sim;

pub use book::{BookError, OrderBookLevel, OrderBookView};
pub use sim::{BookSimulator, FillOutcome};
