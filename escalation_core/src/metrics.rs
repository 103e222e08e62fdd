use bevy::prelude::*;

use crate::{
    engine::EscalationEngine,
    events::{EscalationEvent, EscalationEventKind},
    ledger::AuthorityTier,
};

#[derive(Resource, Debug, Clone)]
pub struct EscalationMetrics {
    pub turn: u64,
    pub ledger_level: f64,
    pub peak_ledger_level: f64,
    pub tier: AuthorityTier,
    pub throughput_multiplier: f32,
    pub investigation_progress: f64,
    pub events_seen: u64,
    pub audits_resolved: u32,
    pub countermeasures_resolved: u32,
}

impl Default for EscalationMetrics {
    fn default() -> Self {
        Self {
            turn: 0,
            ledger_level: 0.0,
            peak_ledger_level: 0.0,
            tier: AuthorityTier::Local,
            throughput_multiplier: 1.0,
            investigation_progress: 0.0,
            events_seen: 0,
            audits_resolved: 0,
            countermeasures_resolved: 0,
        }
    }
}

pub fn collect_metrics(
    engine: Res<EscalationEngine>,
    mut metrics: ResMut<EscalationMetrics>,
    mut events: EventReader<EscalationEvent>,
) {
    metrics.turn += 1;
    metrics.ledger_level = engine.ledger_level();
    metrics.peak_ledger_level = metrics.peak_ledger_level.max(engine.ledger_level());
    metrics.tier = engine.tier();
    metrics.throughput_multiplier = engine.throughput_multiplier();
    metrics.investigation_progress = engine.investigation_progress().unwrap_or(0.0);

    for event in events.read() {
        metrics.events_seen += 1;
        match event.kind {
            EscalationEventKind::AuditResolved { .. } => metrics.audits_resolved += 1,
            EscalationEventKind::CountermeasureResolved { .. } => {
                metrics.countermeasures_resolved += 1
            }
            _ => {}
        }
    }
}
