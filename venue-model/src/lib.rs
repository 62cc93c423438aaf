//! Immutable per-venue capability table and symbol classification.
//!
//! Everything here is pure and initialized once at process start; venues never mutate
//! after construction, matching the "no global mutable state" design note.

mod table;

pub use table::{
    SymbolClass, SymbolClassifier, Venue, VenueCapabilities, VenueTable, ICEBERG_FRIENDLY_VENUES,
};
