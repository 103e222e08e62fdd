mod common;

use bevy::ecs::event::Events;
use escalation_core::{
    build_headless_app, run_tick, AuthorityTier, CountermeasureKind, CountermeasureOutcome,
    CountermeasureQueue, EscalationConfigHandle, EscalationEngine, EscalationEvent,
    EscalationEventKind, EscalationMetrics,
    PendingObservations, SimulationClock, SnapshotHistory, Treasury,
};

#[test]
fn app_initializes() {
    common::ensure_test_config();
    let mut app = build_headless_app();
    // run a single update tick to ensure schedule executes without panic
    run_tick(&mut app);

    let clock = app.world.resource::<SimulationClock>();
    assert_eq!(clock.tick, 1);
    assert_eq!(clock.now, common::HOUR);
    assert_eq!(app.world.resource::<EscalationEngine>().tick(), 1);
}

#[test]
fn app_loads_fixture_config() {
    common::ensure_test_config();
    let app = build_headless_app();
    let config = app.world.resource::<EscalationConfigHandle>().get();
    assert_eq!(config.rng_seed, 97531, "fixture config should be picked up from the env");
}

#[test]
fn observations_flow_through_schedule() {
    common::ensure_test_config();
    let mut app = build_headless_app();
    app.world
        .resource_mut::<PendingObservations>()
        .extend(std::iter::repeat(common::sensor_hit()).take(5));
    run_tick(&mut app);

    let engine = app.world.resource::<EscalationEngine>();
    assert_eq!(engine.tier(), AuthorityTier::State);
    assert!(
        app.world.resource::<PendingObservations>().is_empty(),
        "sightings are consumed by the tick"
    );

    let metrics = app.world.resource::<EscalationMetrics>();
    assert_eq!(metrics.turn, 1);
    assert_eq!(metrics.tier, AuthorityTier::State);
    assert!(metrics.events_seen >= 2, "tier escalation and audit scheduling");
    assert!(metrics.peak_ledger_level > 57.0, "five sensor hits less one hour of decay");

    let history = app.world.resource::<SnapshotHistory>();
    let snapshot = history.last_snapshot.as_ref().expect("snapshot captured");
    assert_eq!(snapshot.tier, AuthorityTier::State);
    assert_eq!(history.digests().count(), 1);
}

#[test]
fn queued_countermeasures_are_resolved() {
    common::ensure_test_config();
    let mut app = build_headless_app();
    app.insert_resource(Treasury::new(5_000.0));
    app.world
        .resource_mut::<CountermeasureQueue>()
        .submit(CountermeasureKind::Bribery);
    run_tick(&mut app);

    let reports = app
        .world
        .resource_mut::<CountermeasureQueue>()
        .drain_reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0].outcome,
        CountermeasureOutcome::RejectedInsufficientFunds
    );
}

#[test]
fn engine_events_reach_bevy_event_stream() {
    common::ensure_test_config();
    let mut app = build_headless_app();
    app.world
        .resource_mut::<PendingObservations>()
        .extend(std::iter::repeat(common::sensor_hit()).take(5));
    run_tick(&mut app);

    let events = app.world.resource::<Events<EscalationEvent>>();
    let mut reader = events.get_reader();
    let kinds: Vec<_> = reader.read(events).map(|event| event.kind.clone()).collect();
    assert!(kinds
        .iter()
        .any(|kind| matches!(kind, EscalationEventKind::TierEscalated { .. })));
    assert!(kinds
        .iter()
        .any(|kind| matches!(kind, EscalationEventKind::AuditScheduled { .. })));
    assert!(app.world.resource_mut::<EscalationEngine>().drain_events().is_empty());
}
