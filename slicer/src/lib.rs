//! Pure order slicers: `ParentOrder → Vec<OrderSlice>`.
//!
//! Every function here is a pure function of its inputs (plus an injected RNG for the
//! strategies that call for randomization); none of them mutate their request or hold
//! state between calls. The scheduler owns attaching the resulting slice list to a parent.

mod dispatch;
mod iceberg;
mod smart;
mod twap;
mod types;
mod vwap;

pub use types::{
    derive_slice_id, IcebergParams, OrderSlice, SliceRequest, SmartRoutingParams, StrategyParams,
    TwapParams, VwapParams,
};
