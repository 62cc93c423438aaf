//! Stochastic congestion events affecting one or more venue routes.

use common::Ts;
use rand::Rng;
use std::collections::VecDeque;
use tracing::debug;
use venue_model::Venue;

/// A transient burst of congestion affecting a handful of routes.
#[derive(Debug, Clone)]
pub struct CongestionEvent {
    /// Monotonic event id.
    pub id: u64,
    /// Destination venues affected.
    pub affected_routes: Vec<Venue>,
    /// Latency multiplier applied while active, `>= 1`.
    pub severity: f64,
    /// When the event started.
    pub start: Ts,
    /// How long the event lasts, in seconds.
    pub duration_secs: f64,
}

impl CongestionEvent {
    fn is_active_at(&self, now: Ts) -> bool {
        let elapsed_secs = now.since(self.start) as f64 / 1_000_000_000.0;
        elapsed_secs <= self.duration_secs
    }
}

/// Owns the bounded FIFO of active/recent congestion events and spawns new ones.
///
/// Single-writer (the congestion ticker task); the scheduler task only reads through
/// [`CongestionEngine::severity_for`], matching the "single mutex held for short critical
/// sections" guidance in the concurrency model.
pub struct CongestionEngine {
    events: VecDeque<CongestionEvent>,
    next_id: u64,
    last_tick: Option<Ts>,
    capacity: usize,
}

impl CongestionEngine {
    /// Minimum interval between congestion-engine ticks.
    pub const TICK_INTERVAL_SECS: u64 = common::constants::network::CONGESTION_TICK_SECS;
    /// Probability of spawning an event on a tick that fires.
    pub const SPAWN_PROB: f64 = common::constants::network::CONGESTION_SPAWN_PROB;

    /// A fresh engine with an empty event FIFO.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: VecDeque::with_capacity(common::constants::network::MAX_CONGESTION_EVENTS),
            next_id: 1,
            last_tick: None,
            capacity: common::constants::network::MAX_CONGESTION_EVENTS,
        }
    }

    /// Advance the engine: expire stale events and, if at least `TICK_INTERVAL_SECS` have
    /// elapsed since the last tick, roll for a new event with elevated burst probability
    /// near market open/close.
    pub fn tick(&mut self, now: Ts, burst_probability_multiplier: f64, rng: &mut impl Rng) {
        self.events.retain(|e| e.is_active_at(now));

        let should_roll = match self.last_tick {
            None => true,
            Some(last) => now.since(last) as f64 / 1_000_000_000.0 >= Self::TICK_INTERVAL_SECS as f64,
        };
        if !should_roll {
            return;
        }
        self.last_tick = Some(now);

        let prob = (Self::SPAWN_PROB * burst_probability_multiplier).min(1.0);
        if rng.gen::<f64>() >= prob {
            return;
        }

        let num_routes = rng.gen_range(1..=3);
        let affected_routes: Vec<Venue> = {
            let mut all = Venue::ALL.to_vec();
            let mut chosen = Vec::with_capacity(num_routes);
            for _ in 0..num_routes.min(all.len()) {
                let idx = rng.gen_range(0..all.len());
                chosen.push(all.remove(idx));
            }
            chosen
        };
        let severity = rng.gen_range(1.2..=2.5);
        let duration_secs = rng.gen_range(30.0..=300.0);

        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        debug!(id = self.next_id, ?affected_routes, severity, duration_secs, "congestion event spawned");
        self.events.push_back(CongestionEvent {
            id: self.next_id,
            affected_routes,
            severity,
            start: now,
            duration_secs,
        });
        self.next_id += 1;
    }

    /// Inject an event directly (used by tests and by operators driving scripted scenarios).
    pub fn inject(&mut self, event: CongestionEvent) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Product of severities of all events currently active on `venue`. `1.0` if none.
    #[must_use]
    pub fn severity_for(&self, venue: Venue, now: Ts) -> f64 {
        self.events
            .iter()
            .filter(|e| e.is_active_at(now) && e.affected_routes.contains(&venue))
            .map(|e| e.severity)
            .product()
    }

    /// Number of events currently active on `venue`.
    #[must_use]
    pub fn active_count_for(&self, venue: Venue, now: Ts) -> usize {
        self.events
            .iter()
            .filter(|e| e.is_active_at(now) && e.affected_routes.contains(&venue))
            .count()
    }
}

impl Default for CongestionEngine {
    fn default() -> Self {
        Self::new()
    }
}
