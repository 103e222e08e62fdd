//! Stealth and law-enforcement escalation engine.
//!
//! Turns sightings of an actor into a persistent suspicion score, audits the actor's
//! holdings, escalates through local, state and federal attention, lets the actor push
//! back with countermeasures and public-relations campaigns, and settles the campaign on
//! exactly one ending. [`EscalationEngine`] can be driven directly or through
//! the Bevy schedule assembled by [`build_headless_app`].

pub mod audit;
pub mod collaborators;
pub mod config;
pub mod countermeasures;
pub mod ending;
pub mod engine;
pub mod entropy;
pub mod escalation;
pub mod events;
pub mod evidence;
pub mod funds;
mod hashing;
pub mod holdings;
pub mod ledger;
pub mod metrics;
pub mod relations;
mod resources;
pub mod snapshot;
mod systems;

use std::sync::Arc;

use bevy::prelude::*;

pub use audit::{AuditOutcome, AuditPhase, AuditStats, HoldingsAuditor};
pub use collaborators::{Collaborators, FundsError, FundsService, HoldingsService, LineOfSight};
pub use config::{
    load_escalation_config_from_env, ConfigError, EscalationConfig, EscalationConfigHandle,
    BUILTIN_ESCALATION_CONFIG, SECONDS_PER_HOUR,
};
pub use countermeasures::{
    CountermeasureKind, CountermeasureOutcome, CountermeasureRejection, CountermeasureReport,
};
pub use ending::{Ending, EndingKind, EndingSummary, TerminalConditions};
pub use engine::{EscalationEngine, TickReport};
pub use entropy::{RandomSource, ScriptedEntropy, SeededEntropy};
pub use escalation::{Investigation, InvestigationKind, RaidState};
pub use events::{EscalationEvent, EscalationEventKind};
pub use evidence::{DetectionLevel, EvidenceEvent, ObservationCandidate, ObserverClass};
pub use funds::Treasury;
pub use holdings::{HoldingsInventory, MaterialKind};
pub use ledger::{AuthorityTier, DecayModifier, PressureBand, SuspicionLedger};
pub use metrics::EscalationMetrics;
pub use relations::{PublicRelations, PublicRelationsState, RelationsStanding};
pub use resources::{CountermeasureQueue, PendingObservations, SimulationClock};
pub use snapshot::{EscalationSnapshot, SnapshotHistory};

/// Construct a Bevy [`App`] running the escalation pipeline, configured from
/// `ESCALATION_CONFIG_PATH` (or the builtin config) and seeded from its `rng_seed`.
pub fn build_headless_app() -> App {
    let config = load_escalation_config_from_env();
    let engine = EscalationEngine::seeded(Arc::clone(&config));
    assemble_app(config, engine)
}

/// Same pipeline with an explicit config and random source.
pub fn build_headless_app_with(
    config: Arc<EscalationConfig>,
    entropy: Box<dyn RandomSource>,
) -> App {
    let engine = EscalationEngine::new(Arc::clone(&config), entropy);
    assemble_app(config, engine)
}

fn assemble_app(config: Arc<EscalationConfig>, engine: EscalationEngine) -> App {
    let mut app = App::new();

    app.insert_resource(EscalationConfigHandle::new(config))
        .insert_resource(engine)
        .insert_resource(SimulationClock::default())
        .insert_resource(PendingObservations::default())
        .insert_resource(HoldingsInventory::default())
        .insert_resource(Treasury::default())
        .insert_resource(CountermeasureQueue::default())
        .insert_resource(EscalationMetrics::default())
        .insert_resource(SnapshotHistory::default())
        .add_event::<EscalationEvent>()
        .add_plugins(MinimalPlugins)
        .add_systems(
            Update,
            (
                systems::advance_clock,
                systems::advance_escalation,
                systems::publish_escalation_events,
                metrics::collect_metrics,
                snapshot::capture_snapshot,
            )
                .chain(),
        );

    app
}

/// Execute a single escalation tick.
///
/// Runs the chained systems configured in [`build_headless_app`]
/// (clock → engine → event fan-out → metrics → snapshot).
pub fn run_tick(app: &mut App) {
    app.update();
}
