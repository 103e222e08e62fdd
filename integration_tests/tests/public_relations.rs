mod common;

use common::World;
use escalation_core::{
    build_headless_app, run_tick, CountermeasureKind, CountermeasureOutcome,
    CountermeasureQueue, EscalationConfig, EscalationEngine, EscalationEventKind, FundsService,
    RelationsStanding, ScriptedEntropy, Treasury,
};

fn engine() -> EscalationEngine {
    EscalationEngine::new(
        EscalationConfig::builtin(),
        Box::new(ScriptedEntropy::constant(0.0)),
    )
}

#[test]
fn goodwill_campaigns_earn_good_neighbor_standing() {
    let mut engine = engine();
    let mut world = World::new(20_000.0);
    world.observe(std::iter::repeat(common::sensor_hit()).take(2));
    world.step(&mut engine, 0.0);
    assert_eq!(engine.ledger_level(), 24.0);

    let donation = engine.donate_to_city(engine.now(), &mut world.funds);
    assert_eq!(donation.funds_delta, -5_000.0);
    assert_eq!(donation.suspicion_delta, -3.0);
    let sponsorship = engine.sponsor_event(engine.now(), &mut world.funds);
    assert_eq!(sponsorship.suspicion_delta, -8.0);

    assert_eq!(engine.ledger_level(), 13.0);
    assert_eq!(world.funds.balance(), 5_000.0);
    assert_eq!(engine.public_relations().standing(), RelationsStanding::GoodNeighbor);
    let snapshot = engine.snapshot();
    assert!(snapshot.public_relations.good_neighbor);
    assert_eq!(snapshot.countermeasures.attempts, 2);
    assert!(engine
        .drain_events()
        .iter()
        .any(|event| matches!(event.kind, EscalationEventKind::GoodNeighborEarned { .. })));
}

#[test]
fn propaganda_lapses_when_funds_run_dry() {
    let mut engine = engine();
    let mut world = World::new(4_000.0);
    let start = engine.start_propaganda(engine.now(), &mut world.funds);
    assert!(start.succeeded());
    assert_eq!(world.funds.balance(), 2_000.0);

    world.step(&mut engine, 168.0);
    assert_eq!(world.funds.balance(), 0.0);
    assert!(engine.public_relations().propaganda_active());

    world.step(&mut engine, 168.0);
    assert!(!engine.public_relations().propaganda_active());
    assert_eq!(world.funds.balance(), 0.0);

    let kinds: Vec<_> = engine.drain_events().into_iter().map(|event| event.kind).collect();
    assert!(kinds.contains(&EscalationEventKind::PropagandaPaid { cost: 2_000.0 }));
    assert!(kinds.contains(&EscalationEventKind::PropagandaLapsed));

    let restart = engine.start_propaganda(engine.now(), &mut world.funds);
    assert_eq!(restart.outcome, CountermeasureOutcome::RejectedInsufficientFunds);
}

#[test]
fn campaigns_queue_through_the_schedule() {
    common::ensure_test_config();
    let mut app = build_headless_app();
    app.insert_resource(Treasury::new(12_000.0));
    {
        let mut queue = app.world.resource_mut::<CountermeasureQueue>();
        queue.submit(CountermeasureKind::CityDonation);
        queue.submit(CountermeasureKind::CounterRumors);
        queue.submit(CountermeasureKind::StopPropaganda);
    }
    run_tick(&mut app);

    let reports = app
        .world
        .resource_mut::<CountermeasureQueue>()
        .drain_reports();
    let outcomes: Vec<_> = reports.iter().map(|report| report.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            CountermeasureOutcome::Succeeded,
            CountermeasureOutcome::RejectedInvalidState,
            CountermeasureOutcome::RejectedInvalidState,
        ]
    );
    assert_eq!(app.world.resource::<Treasury>().balance(), 7_000.0);
}
