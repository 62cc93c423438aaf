//! The static venue capability table and symbol-class map.

use common::Symbol;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A closed set of simulated venues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
    /// New York Stock Exchange.
    Nyse,
    /// Nasdaq.
    Nasdaq,
    /// NYSE Arca.
    Arca,
    /// Investors Exchange.
    Iex,
    /// Cboe BZX.
    Cboe,
}

impl Venue {
    /// All venues, in table order.
    pub const ALL: [Self; 5] = [Self::Nyse, Self::Nasdaq, Self::Arca, Self::Iex, Self::Cboe];

    /// Stable index into per-venue arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Nyse => 0,
            Self::Nasdaq => 1,
            Self::Arca => 2,
            Self::Iex => 3,
            Self::Cboe => 4,
        }
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Nyse => "NYSE",
            Self::Nasdaq => "NASDAQ",
            Self::Arca => "ARCA",
            Self::Iex => "IEX",
            Self::Cboe => "CBOE",
        };
        write!(f, "{name}")
    }
}

/// Venues willing to carry hidden/iceberg quantity, used by the Iceberg slicer.
pub const ICEBERG_FRIENDLY_VENUES: [Venue; 3] = [Venue::Iex, Venue::Cboe, Venue::Arca];

/// Broad symbol classes used to bias venue fit and VWAP volume curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolClass {
    /// Exchange-traded fund.
    Etf,
    /// High-volume technology name.
    Tech,
    /// Other large-cap equity.
    LargeCap,
    /// Anything not otherwise classified.
    Other,
}

/// Immutable per-venue capabilities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VenueCapabilities {
    /// Composite liquidity score in `[0, 1]`.
    pub liquidity_score: f64,
    /// Fraction of hidden-order support in `[0, 1]`.
    pub hidden_support: f64,
    /// Maker rebate, in fraction of notional (e.g. 0.0015 = 15 bps).
    pub maker_rebate: f64,
    /// Taker fee, in fraction of notional.
    pub taker_fee: f64,
    /// Latency rank, 1 = fastest.
    pub latency_rank: u8,
    /// Symbol classes this venue is best suited for.
    pub best_for: &'static [SymbolClass],
}

impl VenueCapabilities {
    /// `cost_score = 1 - (taker - rebate)`, used by Smart-Routing.
    #[must_use]
    pub fn cost_score(&self) -> f64 {
        1.0 - (self.taker_fee - self.maker_rebate)
    }

    /// `latency_score = 1 - (rank - 1) / 5`.
    #[must_use]
    pub fn latency_score(&self) -> f64 {
        1.0 - (f64::from(self.latency_rank) - 1.0) / 5.0
    }

    /// Whether this venue pays maker rebates at all.
    #[must_use]
    pub fn is_rebate_paying(&self) -> bool {
        self.maker_rebate > 0.0
    }
}

/// Immutable venue capability table, keyed by [`Venue`].
#[derive(Debug, Clone)]
pub struct VenueTable {
    capabilities: [VenueCapabilities; 5],
}

impl VenueTable {
    /// Default table, calibrated so that liquidity ranking and composite scoring match
    /// the reference end-to-end scenarios (TWAP round-robins NYSE/NASDAQ/ARCA; Smart-Routing
    /// with default cost sensitivity selects NYSE/NASDAQ/IEX).
    #[must_use]
    pub fn default_table() -> Self {
        use SymbolClass::{Etf, LargeCap, Tech};
        let mut capabilities = [VenueCapabilities {
            liquidity_score: 0.0,
            hidden_support: 0.0,
            maker_rebate: 0.0,
            taker_fee: 0.0,
            latency_rank: 1,
            best_for: &[],
        }; 5];

        capabilities[Venue::Nyse.index()] = VenueCapabilities {
            liquidity_score: 0.95,
            hidden_support: 0.2,
            maker_rebate: 0.0015,
            taker_fee: 0.0020,
            latency_rank: 1,
            best_for: &[LargeCap],
        };
        capabilities[Venue::Nasdaq.index()] = VenueCapabilities {
            liquidity_score: 0.93,
            hidden_support: 0.25,
            maker_rebate: 0.0014,
            taker_fee: 0.0018,
            latency_rank: 2,
            best_for: &[Tech],
        };
        capabilities[Venue::Arca.index()] = VenueCapabilities {
            liquidity_score: 0.85,
            hidden_support: 0.4,
            maker_rebate: 0.0012,
            taker_fee: 0.0015,
            latency_rank: 3,
            best_for: &[Etf],
        };
        capabilities[Venue::Iex.index()] = VenueCapabilities {
            liquidity_score: 0.80,
            hidden_support: 0.6,
            maker_rebate: 0.0000,
            taker_fee: 0.0009,
            latency_rank: 4,
            best_for: &[Tech, LargeCap],
        };
        capabilities[Venue::Cboe.index()] = VenueCapabilities {
            liquidity_score: 0.75,
            hidden_support: 0.5,
            maker_rebate: 0.0005,
            taker_fee: 0.0012,
            latency_rank: 5,
            best_for: &[Etf],
        };

        Self { capabilities }
    }

    /// Capabilities of a venue.
    #[must_use]
    pub fn capabilities(&self, venue: Venue) -> VenueCapabilities {
        self.capabilities[venue.index()]
    }

    /// Venues ordered by descending liquidity score.
    #[must_use]
    pub fn by_liquidity_desc(&self) -> Vec<Venue> {
        let mut venues: Vec<Venue> = Venue::ALL.to_vec();
        venues.sort_by(|a, b| {
            self.capabilities(*b)
                .liquidity_score
                .partial_cmp(&self.capabilities(*a).liquidity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        venues
    }

    /// Symbol fit in `[0, 1]`: `1.0` if the venue lists `class` among its best-for tags,
    /// a neutral `0.3` baseline otherwise.
    #[must_use]
    pub fn symbol_fit(&self, class: SymbolClass, venue: Venue) -> f64 {
        if self.capabilities(venue).best_for.contains(&class) {
            1.0
        } else {
            0.3
        }
    }
}

impl Default for VenueTable {
    fn default() -> Self {
        Self::default_table()
    }
}

/// Maps symbols to their broad class for venue-fit and VWAP purposes.
#[derive(Debug, Clone)]
pub struct SymbolClassifier {
    classes: FxHashMap<Symbol, SymbolClass>,
}

impl SymbolClassifier {
    /// A classifier pre-populated with the symbols used across the reference scenarios.
    #[must_use]
    pub fn well_known() -> Self {
        let mut classes = FxHashMap::default();
        for (id, class) in [
            (1, SymbolClass::Tech),    // AAPL
            (2, SymbolClass::Tech),    // GOOGL
            (3, SymbolClass::Tech),    // TSLA
            (4, SymbolClass::Tech),    // MSFT
            (100, SymbolClass::Etf),   // SPY
            (101, SymbolClass::Etf),   // QQQ
            (200, SymbolClass::LargeCap), // JPM
            (201, SymbolClass::LargeCap), // XOM
        ] {
            classes.insert(Symbol::new(id), class);
        }
        Self { classes }
    }

    /// Classify a symbol, defaulting to [`SymbolClass::Other`] when unknown.
    #[must_use]
    pub fn classify(&self, symbol: Symbol) -> SymbolClass {
        self.classes.get(&symbol).copied().unwrap_or(SymbolClass::Other)
    }

    /// Register or override a symbol's class.
    pub fn insert(&mut self, symbol: Symbol, class: SymbolClass) {
        self.classes.insert(symbol, class);
    }
}

impl Default for SymbolClassifier {
    fn default() -> Self {
        Self::well_known()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liquidity_ranking_matches_twap_round_robin_order() {
        let table = VenueTable::default_table();
        let top3 = table.by_liquidity_desc();
        assert_eq!(&top3[..3], &[Venue::Nyse, Venue::Nasdaq, Venue::Arca]);
    }

    #[test]
    fn composite_score_top3_is_nyse_nasdaq_iex() {
        let table = VenueTable::default_table();
        let classifier = SymbolClassifier::well_known();
        let class = classifier.classify(Symbol::new(2)); // GOOGL
        let cost_sensitivity = 0.5;

        let mut scored: Vec<(Venue, f64)> = Venue::ALL
            .iter()
            .map(|&v| {
                let caps = table.capabilities(v);
                let score = 0.4 * caps.liquidity_score
                    + 0.3 * caps.cost_score() * cost_sensitivity
                    + 0.2 * caps.latency_score()
                    + 0.1 * table.symbol_fit(class, v);
                (v, score.clamp(0.0, 1.0))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

        let top3: std::collections::HashSet<Venue> =
            scored.into_iter().take(3).map(|(v, _)| v).collect();
        let expected: std::collections::HashSet<Venue> =
            [Venue::Nyse, Venue::Nasdaq, Venue::Iex].into_iter().collect();
        assert_eq!(top3, expected);
    }

    #[test]
    fn symbol_fit_favors_best_for_tags() {
        let table = VenueTable::default_table();
        assert_eq!(table.symbol_fit(SymbolClass::Tech, Venue::Nasdaq), 1.0);
        assert_eq!(table.symbol_fit(SymbolClass::Etf, Venue::Nasdaq), 0.3);
    }
}
