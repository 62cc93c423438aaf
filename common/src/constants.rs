//! Constants shared across the execution core, grouped by concern.
//!
//! Trimmed to what the core actually consumes; the retrieved reference had dozens of
//! exchange- and asset-class-specific tables (NSE lot sizes, calendar holidays, ...) that
//! have no bearing on a venue-agnostic simulation core.

/// Fixed-point scaling used by [`crate::types::Px`] and [`crate::types::Qty`].
pub mod fixed_point {
    /// Ticks per unit (four decimal places).
    pub const SCALE: i64 = 10_000;
    /// `SCALE` as `f64`, for mixed arithmetic.
    pub const SCALE_F64: f64 = 10_000.0;
}

/// Time-related constants.
pub mod time {
    /// Nanoseconds per microsecond.
    pub const NANOS_PER_MICRO: u64 = 1_000;
    /// Nanoseconds per millisecond.
    pub const NANOS_PER_MILLI: u64 = 1_000_000;
    /// Nanoseconds per second.
    pub const NANOS_PER_SEC: u64 = 1_000_000_000;
    /// Seconds per minute.
    pub const SECS_PER_MINUTE: u64 = 60;
    /// Minutes per trading sub-interval used by VWAP bucketing.
    pub const VWAP_BUCKET_MINUTES: u64 = 5;
}

/// Order-book and trading constants.
pub mod trading {
    /// Minimum resting size before a level is refreshed with a new exponential draw.
    pub const MIN_LEVEL_SIZE: f64 = 100.0;
    /// Number of levels quoted per side.
    pub const BOOK_DEPTH: usize = 5;
    /// Maximum levels walked by a single fill.
    pub const MAX_WALK_LEVELS: usize = 3;
    /// Minimum TWAP slice size.
    pub const MIN_TWAP_SLICE_QTY: f64 = 25.0;
    /// Maximum number of TWAP slices.
    pub const MAX_TWAP_SLICES: usize = 50;
    /// Maximum number of Iceberg slices.
    pub const MAX_ICEBERG_SLICES: usize = 20;
}

/// Network / latency constants.
pub mod network {
    /// Default latency ceiling (µs) beyond which a slice is flagged as degraded.
    pub const DEFAULT_LATENCY_CEILING_US: f64 = 10_000.0;
    /// Minimum interval between congestion-engine ticks (seconds).
    pub const CONGESTION_TICK_SECS: u64 = 30;
    /// Bounded FIFO capacity for active congestion events.
    pub const MAX_CONGESTION_EVENTS: usize = 100;
    /// Per-tick probability of spawning a new congestion event.
    pub const CONGESTION_SPAWN_PROB: f64 = 0.05;
}

/// Replay buffer constants.
pub mod replay {
    /// Floor applied to priorities on update so no entry becomes unsampleable.
    pub const MIN_PRIORITY: f64 = 1e-6;
}
