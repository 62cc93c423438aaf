//! Order-routing and execution simulation core: slices parent orders under TWAP, VWAP,
//! Iceberg and Smart-Routing, simulates their fills against per-venue books, simulates the
//! network they travel over, and feeds the resulting transitions to an external routing
//! policy through a prioritized replay buffer.

pub mod api;
pub mod config;
pub mod error;
pub mod parent_order;
pub mod routing_glue;
pub mod scheduler;

pub use api::{ExecutionCore, ParentStatusView};
pub use config::{CoreConfig, LatencyPenalties, ReplayConfig, VenueLatencyRange};
pub use error::{CoreError, CoreResult};
pub use parent_order::{ExecutionFailure, ExecutionResult, ParentOrder, ParentStatus};
pub use routing_glue::{FixedVenuePolicy, Policy, RoutingGlue};
pub use scheduler::{compute_reward, DispatchRecord, Scheduler};
