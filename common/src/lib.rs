//! Shared types, fixed-point arithmetic and identifiers for the execution core.

#![deny(dead_code)]
#![deny(unused)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod constants;
pub mod ids;
pub mod model;
pub mod types;

pub use clock::Clock;
pub use ids::{FillId, IdGenerator, ParentOrderId, SliceId};
pub use model::OrderType;
pub use types::{Px, Qty, Side, Symbol, Ts};
