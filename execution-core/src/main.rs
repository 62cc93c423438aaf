//! Demo binary: submits a TWAP parent order against a seeded book, drains the dispatch
//! loop, and prints the resulting fills and replay-buffer occupancy.

use anyhow::Result;
use common::{Px, Qty, Side, Symbol};
use execution_core::config::CoreConfig;
use execution_core::routing_glue::FixedVenuePolicy;
use execution_core::ExecutionCore;
use slicer::TwapParams;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use venue_model::Venue;

const SERVICE_NAME: &str = "execution-core";

fn main() -> Result<()> {
    init_tracing()?;
    info!("starting {} demo v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));

    let mut core = ExecutionCore::new(CoreConfig::default(), FixedVenuePolicy { venue: Venue::Nyse });

    let symbol = Symbol::new(1);
    for venue in Venue::ALL {
        core.seed_book(symbol, venue, Px::new(100.0), 1_000.0);
    }

    let parent_id = core.submit_twap(
        symbol,
        Side::Buy,
        Qty::new(1_000.0),
        TwapParams {
            duration_secs: 60.0,
            slice_interval_secs: 10.0,
            randomize_timing: true,
            randomize_size: true,
        },
    )?;
    info!(%parent_id, pending = core.pending_len(), "parent order accepted");

    while let Some(record) = core.dispatch_next(vec![0.0; 8], vec![0.0; 8]) {
        info!(
            parent_id = %record.parent_id,
            venue = %record.slice.target_venue,
            executed_qty = %record.result.executed_qty,
            avg_price = %record.result.avg_price,
            reward = record.reward,
            success = record.result.success,
            "slice dispatched"
        );
    }

    let status = core.status(parent_id)?;
    info!(
        status = ?status.status,
        filled_qty = %status.filled_qty,
        avg_exec_price = %status.avg_exec_price,
        shortfall_bps = status.implementation_shortfall_bps,
        replay_len = core.replay_buffer().len(),
        "parent order complete"
    );

    Ok(())
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", SERVICE_NAME.replace('-', "_")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true).with_line_number(true))
        .init();
    Ok(())
}
