use std::collections::VecDeque;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    audit::{AuditPhase, AuditStats},
    countermeasures::CountermeasureStats,
    ending::Ending,
    engine::EscalationEngine,
    escalation::{InvestigationState, RaidState},
    hashing::fnv1a,
    ledger::{AuthorityTier, PressureBand},
    relations::PublicRelationsState,
};

/// Observable engine state at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationSnapshot {
    pub tick: u64,
    pub now: f64,
    pub elapsed: f64,
    pub ledger_level: f64,
    pub tier: AuthorityTier,
    pub pressure_band: PressureBand,
    pub audit_phase: AuditPhase,
    pub audit_stats: AuditStats,
    pub audit_immunity_until: f64,
    pub throughput_multiplier: f32,
    pub investigation: InvestigationState,
    pub raid: RaidState,
    pub bribery_ready_at: f64,
    pub countermeasures: CountermeasureStats,
    pub public_relations: PublicRelationsState,
    pub ending: Option<Ending>,
}

impl EscalationSnapshot {
    pub fn capture(engine: &EscalationEngine) -> Self {
        Self {
            tick: engine.tick(),
            now: engine.now(),
            elapsed: engine.elapsed(),
            ledger_level: engine.ledger_level(),
            tier: engine.tier(),
            pressure_band: engine.pressure_band(),
            audit_phase: engine.audit_phase(),
            audit_stats: engine.audit_stats(),
            audit_immunity_until: engine.audit_immunity_until(),
            throughput_multiplier: engine.throughput_multiplier(),
            investigation: engine.controller().investigation_state(),
            raid: engine.raid(),
            bribery_ready_at: engine.bribery_ready_at(),
            countermeasures: engine.countermeasure_stats(),
            public_relations: engine.public_relations().state().clone(),
            ending: engine.ending().copied(),
        }
    }

    pub fn encode(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }

    /// FNV-1a over the bincode encoding. Bit-identical states give identical digests.
    pub fn digest(&self) -> u64 {
        let encoded = bincode::serialize(self).expect("snapshot serialization for hashing");
        fnv1a(&encoded)
    }
}

#[derive(Resource, Debug)]
pub struct SnapshotHistory {
    pub last_snapshot: Option<EscalationSnapshot>,
    pub encoded_snapshot: Option<Vec<u8>>,
    digests: VecDeque<u64>,
    capacity: usize,
}

impl SnapshotHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            last_snapshot: None,
            encoded_snapshot: None,
            digests: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, snapshot: EscalationSnapshot) {
        if self.digests.len() >= self.capacity {
            self.digests.pop_front();
        }
        self.digests.push_back(snapshot.digest());
        match snapshot.encode() {
            Ok(bytes) => self.encoded_snapshot = Some(bytes),
            Err(err) => {
                tracing::warn!(
                    target: "stealth::snapshot",
                    tick = snapshot.tick,
                    error = %err,
                    "snapshot.encode_failed"
                );
                self.encoded_snapshot = None;
            }
        }
        self.last_snapshot = Some(snapshot);
    }

    /// Digests of the most recent ticks, oldest first.
    pub fn digests(&self) -> impl Iterator<Item = u64> + '_ {
        self.digests.iter().copied()
    }
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

pub fn capture_snapshot(engine: Res<EscalationEngine>, mut history: ResMut<SnapshotHistory>) {
    history.record(EscalationSnapshot::capture(&engine));
}
