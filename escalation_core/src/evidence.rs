use serde::{Deserialize, Serialize};

use crate::config::EvidenceConfig;

/// Who saw the activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObserverClass {
    Civilian,
    Patrol,
    FixedSensor,
}

/// Raw sighting produced by the line-of-sight collaborator. Consumed in the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationCandidate {
    pub observer: ObserverClass,
    pub distance: f32,
    /// Ambient light at the actor, `0` dark to `1` fully lit.
    pub lighting: f32,
    /// Concealment of the actor, `1` fully hidden.
    pub stealth_modifier: f32,
}

impl ObservationCandidate {
    pub fn new(observer: ObserverClass, distance: f32, lighting: f32, stealth_modifier: f32) -> Self {
        Self {
            observer,
            distance,
            lighting,
            stealth_modifier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DetectionLevel {
    Glance,
    Notice,
    Observe,
    Report,
}

impl DetectionLevel {
    pub fn classify(quality: f32) -> Self {
        if quality >= 0.75 {
            DetectionLevel::Report
        } else if quality >= 0.5 {
            DetectionLevel::Observe
        } else if quality >= 0.25 {
            DetectionLevel::Notice
        } else {
            DetectionLevel::Glance
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvidenceEvent {
    pub quality: f32,
    pub witness: ObserverClass,
    pub timestamp: f64,
    pub level: DetectionLevel,
}

#[derive(Debug, Clone)]
pub struct EvidenceEvaluator {
    config: EvidenceConfig,
}

impl EvidenceEvaluator {
    pub fn new(config: EvidenceConfig) -> Self {
        Self { config }
    }

    /// Product of the distance, lighting and stealth factors, each clamped to `[0, 1]`.
    /// Non-finite input counts as no detection.
    pub fn evaluate(&self, candidate: &ObservationCandidate) -> f32 {
        if !candidate.distance.is_finite()
            || !candidate.lighting.is_finite()
            || !candidate.stealth_modifier.is_finite()
        {
            return 0.0;
        }

        let radius = self.config.max_radius.get(candidate.observer);
        if radius <= 0.0 {
            return 0.0;
        }
        let distance = (1.0 - candidate.distance / radius).clamp(0.0, 1.0);
        let lighting = candidate.lighting.clamp(0.0, 1.0);
        let stealth = (1.0 - candidate.stealth_modifier).clamp(0.0, 1.0);
        distance * lighting * stealth
    }

    /// Evidence for a candidate, or `None` when the observer saw nothing.
    pub fn observe(&self, candidate: &ObservationCandidate, now: f64) -> Option<EvidenceEvent> {
        let quality = self.evaluate(candidate);
        if quality <= 0.0 {
            return None;
        }
        Some(EvidenceEvent {
            quality,
            witness: candidate.observer,
            timestamp: now,
            level: DetectionLevel::classify(quality),
        })
    }

    pub fn base_amount(&self, witness: ObserverClass) -> f64 {
        f64::from(self.config.base_contribution.get(witness))
    }
}
