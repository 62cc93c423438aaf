//! Small shared enums used across layers so they don't have to be re-declared per crate.

use serde::{Deserialize, Serialize};

/// How a child slice should be worked at its venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Take liquidity immediately at the best available price.
    Market,
    /// Rest (or cross) at a specified limit price.
    Limit,
}
