//! End-to-end tests driving the composed core: submit, dispatch, cancel, status.

use std::sync::Arc;

use common::{ParentOrderId, Px, Qty, Side, Symbol};
use execution_core::config::{CoreConfig, LatencyPenalties};
use execution_core::error::CoreError;
use execution_core::parent_order::ParentStatus;
use execution_core::routing_glue::FixedVenuePolicy;
use execution_core::ExecutionCore;
use slicer::{IcebergParams, SmartRoutingParams, TwapParams};
use venue_model::Venue;

fn seeded_core(config: CoreConfig) -> ExecutionCore<FixedVenuePolicy> {
    let mut core = ExecutionCore::new(config, FixedVenuePolicy { venue: Venue::Nyse });
    for venue in Venue::ALL {
        core.seed_book(Symbol::new(1), venue, Px::new(100.0), 1_000.0);
        core.seed_book(Symbol::new(2), venue, Px::new(150.0), 1_000.0);
    }
    core
}

#[test]
fn filled_quantity_never_exceeds_total_across_a_full_twap_run() {
    let mut core = seeded_core(CoreConfig::default());
    let total = Qty::new(1_000.0);
    let id = core
        .submit_twap(
            Symbol::new(1),
            Side::Buy,
            total,
            TwapParams {
                duration_secs: 600.0,
                slice_interval_secs: 30.0,
                randomize_timing: false,
                randomize_size: false,
            },
        )
        .unwrap();

    while core.dispatch_next(vec![], vec![]).is_some() {}

    let view = core.status(id).unwrap();
    assert!(view.filled_qty <= total);
    assert!(view.status.is_terminal());
}

#[test]
fn slice_dispatch_timestamps_are_nondecreasing() {
    let mut core = seeded_core(CoreConfig::default());
    core.submit_twap(
        Symbol::new(1),
        Side::Buy,
        Qty::new(500.0),
        TwapParams {
            duration_secs: 100.0,
            slice_interval_secs: 10.0,
            randomize_timing: true,
            randomize_size: true,
        },
    )
    .unwrap();

    let mut last = None;
    while let Some(record) = core.dispatch_next(vec![], vec![]) {
        let ts = record.slice.scheduled_ts;
        if let Some(prev) = last {
            assert!(ts >= prev, "dispatch order went backward: {ts:?} < {prev:?}");
        }
        last = Some(ts);
    }
}

#[test]
fn submit_then_immediate_cancel_produces_zero_executions() {
    let mut core = seeded_core(CoreConfig::default());
    let id = core
        .submit_twap(
            Symbol::new(1),
            Side::Buy,
            Qty::new(500.0),
            TwapParams {
                duration_secs: 60.0,
                slice_interval_secs: 10.0,
                randomize_timing: false,
                randomize_size: false,
            },
        )
        .unwrap();

    core.cancel(id).unwrap();
    let view = core.status(id).unwrap();
    assert_eq!(view.status, ParentStatus::Cancelled);
    assert_eq!(view.filled_qty, Qty::ZERO);

    // Draining the heap must not resurrect the cancelled parent's executions.
    while core.dispatch_next(vec![], vec![]).is_some() {}
    let view = core.status(id).unwrap();
    assert_eq!(view.status, ParentStatus::Cancelled);
    assert_eq!(view.filled_qty, Qty::ZERO);
}

#[test]
fn terminal_parent_rejects_a_second_cancel() {
    let mut core = seeded_core(CoreConfig::default());
    let id = core
        .submit_twap(
            Symbol::new(1),
            Side::Buy,
            Qty::new(100.0),
            TwapParams {
                duration_secs: 10.0,
                slice_interval_secs: 10.0,
                randomize_timing: false,
                randomize_size: false,
            },
        )
        .unwrap();
    core.cancel(id).unwrap();
    let err = core.cancel(id).unwrap_err();
    assert!(matches!(err, CoreError::AlreadyTerminal(_)));
}

#[test]
fn validation_failure_still_leaves_a_queryable_rejected_parent() {
    let mut core = seeded_core(CoreConfig::default());
    let err = core
        .submit_twap(
            Symbol::new(1),
            Side::Buy,
            Qty::ZERO,
            TwapParams {
                duration_secs: 60.0,
                slice_interval_secs: 10.0,
                randomize_timing: false,
                randomize_size: false,
            },
        )
        .unwrap_err();

    let CoreError::Rejected { parent_id, .. } = err else {
        panic!("expected Rejected, got {err:?}");
    };
    let view = core.status(parent_id).unwrap();
    assert_eq!(view.status, ParentStatus::Rejected);
}

#[test]
fn degraded_flag_is_set_when_latency_exceeds_the_configured_ceiling() {
    let mut config = CoreConfig::default();
    config.latency_penalties = LatencyPenalties {
        general_threshold_us: 0.01,
        arbitrage_threshold_us: 0.01,
        momentum_threshold_us: 0.01,
    };
    let mut core = seeded_core(config);
    core.submit_twap(
        Symbol::new(1),
        Side::Buy,
        Qty::new(200.0),
        TwapParams {
            duration_secs: 20.0,
            slice_interval_secs: 10.0,
            randomize_timing: false,
            randomize_size: false,
        },
    )
    .unwrap();

    let record = core.dispatch_next(vec![], vec![]).expect("at least one slice");
    assert!(record.result.degraded);
}

#[test]
fn smart_routing_allocations_sum_to_the_parent_quantity() {
    let mut core = seeded_core(CoreConfig::default());
    let total = Qty::new(800.0);
    let id = core
        .submit_smart(
            Symbol::new(2),
            Side::Buy,
            total,
            SmartRoutingParams {
                max_venues: 3,
                cost_sensitivity: 0.5,
                min_venue_allocation: 0.1,
            },
        )
        .unwrap();

    while core.dispatch_next(vec![], vec![]).is_some() {}
    let view = core.status(id).unwrap();
    // The book walk can stop early once a level absorbs more than half its displayed size,
    // so a slice may not fill completely even against a deep book; the only invariant that
    // always holds is that the running total never overshoots the parent quantity.
    assert!(view.filled_qty <= total);
    assert!(!view.filled_qty.is_zero());
}

#[test]
fn iceberg_dispatch_never_overfills_past_the_parent_quantity() {
    let mut core = seeded_core(CoreConfig::default());
    let total = Qty::new(10_000.0);
    let id = core
        .submit_iceberg(
            Symbol::new(1),
            Side::Buy,
            total,
            IcebergParams {
                display_size: Qty::new(150.0),
                refresh_threshold: 0.3,
            },
        )
        .unwrap();

    while let Some(record) = core.dispatch_next(vec![], vec![]) {
        // Every recorded fill, including the hidden-quantity top-up a slice carries, must
        // stay within the slice's own displayed quantity and never push the parent over its
        // total, even though consecutive Iceberg slices' hidden quantities overlap.
        assert!(record.result.executed_qty <= record.slice.qty);
    }

    let view = core.status(id).unwrap();
    assert!(view.filled_qty <= total);
}

#[test]
fn replay_buffer_grows_as_slices_are_dispatched() {
    let mut core = seeded_core(CoreConfig::default());
    core.submit_twap(
        Symbol::new(1),
        Side::Buy,
        Qty::new(300.0),
        TwapParams {
            duration_secs: 30.0,
            slice_interval_secs: 10.0,
            randomize_timing: false,
            randomize_size: false,
        },
    )
    .unwrap();

    let mut dispatched = 0;
    while core.dispatch_next(vec![0.0; 4], vec![0.0; 4]).is_some() {
        dispatched += 1;
    }
    let buffer = core.replay_buffer();
    assert_eq!(buffer.len(), dispatched);
    assert!(Arc::strong_count(&buffer) >= 2);
}

#[test]
fn status_of_unknown_parent_is_not_found() {
    let core = seeded_core(CoreConfig::default());
    let err = core.status(ParentOrderId(999_999)).unwrap_err();
    assert!(matches!(err, CoreError::ParentNotFound(_)));
}
