//! Latency prediction: `L = B * T_tod * C_route * M_market * J`.

use crate::congestion::CongestionEngine;
use common::Ts;
use rand_distr::{Distribution, LogNormal};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use venue_model::Venue;

/// Ambient market conditions supplied by the caller; defaults produce `M_market = 1.0`.
#[derive(Debug, Clone, Copy)]
pub struct MarketConditions {
    /// Realized/implied volatility, unitless.
    pub volatility: f64,
    /// Traded volume used for the `ln(volume)` term; must be `>= 1` to avoid a negative log.
    pub volume: f64,
}

impl MarketConditions {
    /// `M_market = (1 + 2*volatility) * (1 + 0.1*ln(volume))`.
    #[must_use]
    pub fn market_multiplier(self) -> f64 {
        (1.0 + 2.0 * self.volatility) * (1.0 + 0.1 * self.volume.max(1.0).ln())
    }
}

impl Default for MarketConditions {
    fn default() -> Self {
        Self {
            volatility: 0.0,
            volume: 1.0,
        }
    }
}

/// Defines the trading day window used to compute the time-of-day multiplier.
#[derive(Debug, Clone, Copy)]
pub struct TradingSession {
    /// Session open, as nanoseconds since an arbitrary but fixed reference.
    pub open: Ts,
    /// Session length in seconds (e.g. 23,400 for a 6.5h US equity day).
    pub length_secs: f64,
}

impl TradingSession {
    /// A standard 6.5-hour session starting at `open`.
    #[must_use]
    pub fn standard(open: Ts) -> Self {
        Self {
            open,
            length_secs: 6.5 * 3_600.0,
        }
    }

    fn seconds_since_open(self, now: Ts) -> Option<f64> {
        if now < self.open {
            return None;
        }
        let secs = now.since(self.open) as f64 / 1_000_000_000.0;
        (secs <= self.length_secs).then_some(secs)
    }

    /// Time-of-day latency multiplier: `1.2` in the first two hours, `0.8` over the midday
    /// lull, `2.0` in the last 30 minutes, `1.0` otherwise (including after hours).
    #[must_use]
    pub fn latency_multiplier(self, now: Ts) -> f64 {
        match self.seconds_since_open(now) {
            None => 1.0,
            Some(secs) if secs < 2.0 * 3_600.0 => 1.2,
            Some(secs) if self.length_secs - secs <= 30.0 * 60.0 => 2.0,
            Some(secs) if (secs - 2.5 * 3_600.0).abs() < 0.5 * 3_600.0 => 0.8,
            Some(_) => 1.0,
        }
    }

    /// Multiplier applied to the congestion-engine spawn probability: elevated near the
    /// open and close, where order flow bursts are most common.
    #[must_use]
    pub fn burst_probability_multiplier(self, now: Ts) -> f64 {
        match self.seconds_since_open(now) {
            None => 1.0,
            Some(secs) if secs < 2.0 * 3_600.0 => 2.0,
            Some(secs) if self.length_secs - secs <= 30.0 * 60.0 => 2.0,
            Some(_) => 1.0,
        }
    }
}

/// Breakdown of the factors that produced a [`LatencyMeasurement`].
#[derive(Debug, Clone, Copy)]
pub struct ContributingFactors {
    /// Time-of-day multiplier applied.
    pub time_of_day: f64,
    /// Congestion multiplier applied (`1.0` when no event is active).
    pub congestion: f64,
    /// Market-condition multiplier applied.
    pub market: f64,
    /// Lognormal jitter multiplier applied.
    pub jitter: f64,
    /// `(congestion - 1.0)`, i.e. the percentage latency increase attributable to congestion.
    pub congestion_effect: f64,
}

/// Predicted latency for a single route, with an error band and a routing-tiebreak score.
#[derive(Debug, Clone, Copy)]
pub struct LatencyMeasurement {
    /// Predicted latency, in microseconds.
    pub predicted_us: f64,
    /// `(low, high)` confidence interval, in microseconds.
    pub confidence_interval: (f64, f64),
    /// Factor breakdown.
    pub contributing_factors: ContributingFactors,
    /// `1/congestion * confidence * 0.8`, used to break routing ties.
    pub route_quality: f64,
    /// Rolling prediction accuracy for this route, in `[0.5, 0.95]`.
    pub confidence: f64,
}

/// Predicts and "spends" a latency budget per route.
pub struct LatencySimulator {
    base_latency_us: FxHashMap<Venue, f64>,
    packet_loss_base: FxHashMap<Venue, f64>,
    congestion_history: FxHashMap<Venue, VecDeque<f64>>,
}

impl LatencySimulator {
    const HISTORY_LEN: usize = 10;

    /// Construct with a base latency and packet-loss rate per venue.
    #[must_use]
    pub fn new(base_latency_us: FxHashMap<Venue, f64>, packet_loss_base: FxHashMap<Venue, f64>) -> Self {
        Self {
            base_latency_us,
            packet_loss_base,
            congestion_history: FxHashMap::default(),
        }
    }

    /// Defaults calibrated so NYSE is fastest and CBOE slowest, matching the venue
    /// table's latency ranking.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut base = FxHashMap::default();
        base.insert(Venue::Nyse, 120.0);
        base.insert(Venue::Nasdaq, 140.0);
        base.insert(Venue::Arca, 160.0);
        base.insert(Venue::Iex, 350.0); // IEX's speed bump is part of its design
        base.insert(Venue::Cboe, 180.0);

        let mut loss = FxHashMap::default();
        for venue in Venue::ALL {
            loss.insert(venue, 0.0005);
        }
        Self::new(base, loss)
    }

    /// Predict latency for `venue` at `now`, spending (recording) the observation into the
    /// route's rolling congestion history for future confidence calculations.
    pub fn predict(
        &mut self,
        venue: Venue,
        now: Ts,
        session: TradingSession,
        market: MarketConditions,
        congestion: &CongestionEngine,
        rng: &mut impl rand::Rng,
    ) -> LatencyMeasurement {
        let base = *self.base_latency_us.get(&venue).unwrap_or(&150.0);
        let tod = session.latency_multiplier(now);
        let c_route = congestion.severity_for(venue, now);
        let m_market = market.market_multiplier();
        let jitter = LogNormal::new(0.0, 0.1).expect("valid params").sample(rng);

        // Confidence reflects history *before* this observation, so a single newly
        // congested route is felt as a route_quality change, not smeared by its own entry.
        let history = self.congestion_history.entry(venue).or_default();
        let confidence = Self::confidence_from_history(history);

        history.push_back(c_route);
        if history.len() > Self::HISTORY_LEN {
            history.pop_front();
        }

        let predicted_us = base * tod * c_route * m_market * jitter;
        let band = predicted_us * 0.15 / confidence;
        let route_quality = (1.0 / c_route) * confidence * 0.8;

        LatencyMeasurement {
            predicted_us,
            confidence_interval: (predicted_us - band, predicted_us + band),
            contributing_factors: ContributingFactors {
                time_of_day: tod,
                congestion: c_route,
                market: m_market,
                jitter,
                congestion_effect: c_route - 1.0,
            },
            route_quality,
            confidence,
        }
    }

    fn confidence_from_history(history: &VecDeque<f64>) -> f64 {
        if history.is_empty() {
            return 0.75;
        }
        let mean_congestion: f64 = history.iter().sum::<f64>() / history.len() as f64;
        (0.75 - 0.25 * (mean_congestion - 1.0)).clamp(0.5, 0.95)
    }

    /// Smallest configured base latency across all venues, ignoring time-of-day, congestion
    /// and jitter. Used as a routing-glue reference point for "how much latency could have
    /// been saved by picking the fastest venue".
    #[must_use]
    pub fn fastest_base_latency_us(&self) -> f64 {
        self.base_latency_us
            .values()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    /// Probability this message is lost in transit:
    /// `base_loss * T_tod * M_market * (1 + 5*active_congestion_count)`, clamped to `[0, 1]`.
    #[must_use]
    pub fn packet_loss_probability(
        &self,
        venue: Venue,
        now: Ts,
        session: TradingSession,
        market: MarketConditions,
        congestion: &CongestionEngine,
    ) -> f64 {
        let base = *self.packet_loss_base.get(&venue).unwrap_or(&0.001);
        let active = congestion.active_count_for(venue, now) as f64;
        (base * session.latency_multiplier(now) * market.market_multiplier() * (1.0 + 5.0 * active))
            .clamp(0.0, 1.0)
    }
}
