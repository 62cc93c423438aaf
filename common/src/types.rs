//! Fixed-point price/quantity types and small value types shared across the core.
//!
//! Prices and quantities are stored as `i64` ticks scaled by [`constants::fixed_point::SCALE`]
//! (four decimal places) rather than `f64`, so that comparisons and arithmetic on the hot
//! fill path are exact and branch-free.

use crate::constants::fixed_point::SCALE;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-point price, stored as ticks of `1 / SCALE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Px(i64);

impl Px {
    /// Zero price.
    pub const ZERO: Self = Self(0);

    /// Construct from a real-valued price.
    #[inline]
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self((value * SCALE as f64).round() as i64)
    }

    /// Construct directly from ticks.
    #[inline]
    #[must_use]
    pub const fn from_i64(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Raw tick value.
    #[inline]
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Convert to a floating-point price.
    #[inline]
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    /// Saturating addition in tick space.
    #[inline]
    #[must_use]
    pub fn add_ticks(self, ticks: i64) -> Self {
        Self(self.0.saturating_add(ticks))
    }
}

impl fmt::Display for Px {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.as_f64())
    }
}

/// Fixed-point quantity, stored as ticks of `1 / SCALE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Qty(i64);

impl Qty {
    /// Zero quantity.
    pub const ZERO: Self = Self(0);

    /// Construct from a real-valued quantity.
    #[inline]
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self((value * SCALE as f64).round() as i64)
    }

    /// Construct directly from ticks.
    #[inline]
    #[must_use]
    pub const fn from_i64(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Raw tick value.
    #[inline]
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Convert to a floating-point quantity.
    #[inline]
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    /// Saturating subtraction, floored at zero.
    #[inline]
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self((self.0 - other.0).max(0))
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// True when the quantity is zero.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Minimum of two quantities.
    #[inline]
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.as_f64())
    }
}

/// Order / fill side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy / bid.
    Buy,
    /// Sell / ask.
    Sell,
}

impl Side {
    /// The opposite side.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Sign used in implementation-shortfall calculations: `+1` for BUY, `-1` for SELL.
    #[inline]
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }
}

/// Interned symbol id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub u32);

impl Symbol {
    /// Construct a symbol from a raw id.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SYM#{}", self.0)
    }
}

/// Nanosecond timestamp, monotonic within a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ts(u64);

impl Ts {
    /// The epoch (zero) timestamp.
    pub const ZERO: Self = Self(0);

    /// Construct from a raw nanosecond count.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Raw nanosecond count.
    #[inline]
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Microsecond count (truncating).
    #[inline]
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0 / 1_000
    }

    /// Millisecond count (truncating).
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0 / 1_000_000
    }

    /// `self + nanos`, saturating.
    #[inline]
    #[must_use]
    pub fn plus_nanos(self, nanos: u64) -> Self {
        Self(self.0.saturating_add(nanos))
    }

    /// `self + micros`, saturating.
    #[inline]
    #[must_use]
    pub fn plus_micros(self, micros: u64) -> Self {
        self.plus_nanos(micros.saturating_mul(1_000))
    }

    /// `self + seconds` (as `f64`, may be fractional), saturating.
    #[inline]
    #[must_use]
    pub fn plus_secs_f64(self, secs: f64) -> Self {
        self.plus_nanos((secs * 1_000_000_000.0).round() as u64)
    }

    /// Nanoseconds elapsed since `earlier`, zero if `earlier` is later.
    #[inline]
    #[must_use]
    pub fn since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Ts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}
