use bevy::prelude::*;

use crate::{
    collaborators::LineOfSight,
    config::SECONDS_PER_HOUR,
    countermeasures::{CountermeasureKind, CountermeasureReport},
    evidence::ObservationCandidate,
};

/// Host clock. Advanced once per frame before the engine runs.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    pub tick: u64,
    /// Simulated seconds since campaign start.
    pub now: f64,
    pub step_seconds: f64,
}

impl SimulationClock {
    pub fn with_step_hours(hours: f64) -> Self {
        Self {
            tick: 0,
            now: 0.0,
            step_seconds: hours * SECONDS_PER_HOUR,
        }
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::with_step_hours(1.0)
    }
}

/// Sightings queued by the world for the next tick.
#[derive(Resource, Debug, Clone, Default)]
pub struct PendingObservations {
    queued: Vec<ObservationCandidate>,
}

impl PendingObservations {
    pub fn push(&mut self, candidate: ObservationCandidate) {
        self.queued.push(candidate);
    }

    pub fn extend(&mut self, candidates: impl IntoIterator<Item = ObservationCandidate>) {
        self.queued.extend(candidates);
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

impl LineOfSight for PendingObservations {
    fn candidates(&mut self, _now: f64) -> Vec<ObservationCandidate> {
        std::mem::take(&mut self.queued)
    }
}

/// Player countermeasure requests, resolved after the next engine tick.
#[derive(Resource, Debug, Clone, Default)]
pub struct CountermeasureQueue {
    pending: Vec<CountermeasureKind>,
    resolved: Vec<CountermeasureReport>,
}

impl CountermeasureQueue {
    pub fn submit(&mut self, kind: CountermeasureKind) {
        self.pending.push(kind);
    }

    pub(crate) fn take_pending(&mut self) -> Vec<CountermeasureKind> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn push_report(&mut self, report: CountermeasureReport) {
        self.resolved.push(report);
    }

    /// Reports produced since the last call.
    pub fn drain_reports(&mut self) -> Vec<CountermeasureReport> {
        std::mem::take(&mut self.resolved)
    }
}
