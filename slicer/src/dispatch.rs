//! Tag-based dispatch across the closed strategy set. New strategies mean a new variant
//! here and a new pure slicer function, never a subtype hierarchy.

use crate::types::StrategyParams;
use crate::{iceberg, smart, twap, vwap};
use crate::types::OrderSlice;
use crate::types::SliceRequest;
use rand::Rng;
use venue_model::{SymbolClass, VenueTable};

impl StrategyParams {
    /// Dispatch to the appropriate pure slicer function for this strategy's variant.
    pub fn slice(
        &self,
        req: &SliceRequest,
        venues: &VenueTable,
        class: SymbolClass,
        session_length_secs: f64,
        rng: &mut impl Rng,
    ) -> Vec<OrderSlice> {
        match self {
            Self::Twap(p) => twap::slices(req, p, venues, rng),
            Self::Vwap(p) => vwap::slices(req, p, class, session_length_secs, rng),
            Self::Iceberg(p) => iceberg::slices(req, p, rng),
            Self::SmartRouting(p) => smart::slices(req, p, venues, class),
        }
    }
}
