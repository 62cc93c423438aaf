//! Strongly-typed, process-local identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! id_type {
    ($name:ident, $prefix:literal) => {
        /// Process-local identifier.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

id_type!(ParentOrderId, "PO#");
id_type!(SliceId, "SL#");
id_type!(FillId, "FL#");

/// Monotonic, lock-free id generator. One instance is shared across all id kinds since
/// uniqueness only needs to hold within each typed id, never across types.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Create a generator starting at id 1 (0 is reserved as "unset").
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next parent-order id.
    pub fn next_parent_id(&self) -> ParentOrderId {
        ParentOrderId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Allocate the next slice id.
    pub fn next_slice_id(&self) -> SliceId {
        SliceId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Allocate the next fill id.
    pub fn next_fill_id(&self) -> FillId {
        FillId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let gen = IdGenerator::new();
        let a = gen.next_parent_id();
        let b = gen.next_slice_id();
        assert!(b.0 > a.0);
    }
}
