use bevy::prelude::*;

use crate::{
    collaborators::Collaborators,
    engine::EscalationEngine,
    events::EscalationEvent,
    funds::Treasury,
    holdings::HoldingsInventory,
    resources::{CountermeasureQueue, PendingObservations, SimulationClock},
};

pub fn advance_clock(mut clock: ResMut<SimulationClock>) {
    clock.tick = clock.tick.wrapping_add(1);
    clock.now += clock.step_seconds;
}

/// Run one engine tick against the ECS-owned collaborators, then resolve queued
/// countermeasures at the same instant.
pub fn advance_escalation(
    clock: Res<SimulationClock>,
    mut engine: ResMut<EscalationEngine>,
    mut sightings: ResMut<PendingObservations>,
    holdings: Res<HoldingsInventory>,
    mut treasury: ResMut<Treasury>,
    mut queue: ResMut<CountermeasureQueue>,
) {
    {
        let mut collaborators = Collaborators::new(&mut *sightings, &*holdings, &mut *treasury);
        engine.advance(clock.step_seconds, clock.now, &mut collaborators);
    }

    for kind in queue.take_pending() {
        let report = engine.attempt(kind, clock.now, &mut *treasury);
        queue.push_report(report);
    }
}

/// Forward engine events into the Bevy event stream.
pub fn publish_escalation_events(
    mut engine: ResMut<EscalationEngine>,
    mut writer: EventWriter<EscalationEvent>,
) {
    for event in engine.drain_events() {
        tracing::debug!(
            target: "stealth::events",
            tick = event.tick,
            kind = event.kind.label(),
            "escalation.event"
        );
        writer.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collaborators::FundsService,
        config::EscalationConfig,
        countermeasures::{CountermeasureKind, CountermeasureOutcome, CountermeasureRejection},
        entropy::ScriptedEntropy,
        evidence::{ObservationCandidate, ObserverClass},
        ledger::AuthorityTier,
    };
    use bevy::prelude::World;
    use bevy_ecs::system::RunSystemOnce;

    fn world() -> World {
        let mut world = World::default();
        world.insert_resource(EscalationEngine::new(
            EscalationConfig::builtin(),
            Box::new(ScriptedEntropy::constant(0.0)),
        ));
        world.insert_resource(SimulationClock::default());
        world.insert_resource(PendingObservations::default());
        world.insert_resource(HoldingsInventory::default());
        world.insert_resource(Treasury::new(50_000.0));
        world.insert_resource(CountermeasureQueue::default());
        world
    }

    #[test]
    fn clock_advances_one_step() {
        let mut world = world();
        world.run_system_once(advance_clock);
        world.run_system_once(advance_clock);
        let clock = world.resource::<SimulationClock>();
        assert_eq!(clock.tick, 2);
        assert_eq!(clock.now, 2.0 * clock.step_seconds);
    }

    #[test]
    fn queued_sightings_reach_the_ledger() {
        let mut world = world();
        let hit = ObservationCandidate::new(ObserverClass::FixedSensor, 0.0, 1.0, 0.0);
        world
            .resource_mut::<PendingObservations>()
            .extend(std::iter::repeat(hit).take(5));
        world.run_system_once(advance_escalation);

        assert!(world.resource::<PendingObservations>().is_empty());
        let engine = world.resource::<EscalationEngine>();
        assert_eq!(engine.tick(), 1);
        assert_eq!(engine.tier(), AuthorityTier::State);
    }

    #[test]
    fn queued_countermeasures_are_reported_after_the_tick() {
        let mut world = world();
        world
            .resource_mut::<CountermeasureQueue>()
            .submit(CountermeasureKind::EvidenceTampering);
        world.run_system_once(advance_escalation);

        let reports = world.resource_mut::<CountermeasureQueue>().drain_reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, CountermeasureOutcome::RejectedInvalidState);
        assert_eq!(
            reports[0].rejection,
            Some(CountermeasureRejection::NoInvestigation)
        );
        assert_eq!(world.resource::<Treasury>().balance(), 50_000.0);
    }
}
