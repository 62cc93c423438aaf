//! Per-route latency prediction, congestion modeling and packet loss.

mod congestion;
mod predict;

pub use congestion::{CongestionEngine, CongestionEvent};
pub use predict::{ContributingFactors, LatencyMeasurement, LatencySimulator, MarketConditions, TradingSession};
