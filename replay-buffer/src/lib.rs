//! Prioritized experience replay buffer backing the RL router.
//!
//! Single-writer (the scheduler), multi-reader (one or more learner tasks). The ring
//! itself never blocks either side; telemetry is kept behind a short-lived lock since it
//! sits off the hot path.

mod buffer;
mod experience;
mod telemetry;

pub use buffer::{Batch, ReplayBuffer};
pub use experience::{Experience, ExperienceMetadata};
pub use telemetry::{LatencyPercentiles, Telemetry};
