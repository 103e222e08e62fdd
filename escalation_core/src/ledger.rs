//! Suspicion ledger: the persistent risk score and the authority tier derived from it.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    config::{LedgerConfig, SECONDS_PER_HOUR},
    countermeasures::CountermeasureKind,
    evidence::{EvidenceEvent, ObserverClass},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityTier {
    #[default]
    Local,
    State,
    Federal,
}

impl AuthorityTier {
    pub const ALL: [AuthorityTier; 3] = [
        AuthorityTier::Local,
        AuthorityTier::State,
        AuthorityTier::Federal,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuthorityTier::Local => "local",
            AuthorityTier::State => "state",
            AuthorityTier::Federal => "federal",
        }
    }
}

/// How strongly decay applies this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecayModifier {
    Normal,
    Dampened(f64),
    Suppressed,
}

impl DecayModifier {
    pub fn factor(self) -> f64 {
        match self {
            DecayModifier::Normal => 1.0,
            DecayModifier::Dampened(factor) => factor.clamp(0.0, 1.0),
            DecayModifier::Suppressed => 0.0,
        }
    }
}

/// Origin of a ledger change, kept on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerSource {
    Evidence(ObserverClass),
    Audit,
    Countermeasure(CountermeasureKind),
    /// Delayed community campaign effects.
    PublicRelations,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub at: f64,
    pub source: LedgerSource,
    /// Change actually applied after clamping.
    pub applied: f64,
    pub level_after: f64,
}

/// Presentation bands layered over the raw level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PressureBand {
    Normal,
    Rumors,
    Scrutiny,
    Checkpoints,
    Restrictions,
}

impl PressureBand {
    pub fn classify(level: f64) -> Self {
        if level >= 81.0 {
            PressureBand::Restrictions
        } else if level >= 61.0 {
            PressureBand::Checkpoints
        } else if level >= 41.0 {
            PressureBand::Scrutiny
        } else if level >= 21.0 {
            PressureBand::Rumors
        } else {
            PressureBand::Normal
        }
    }

    pub fn effects(self) -> BandEffects {
        let (patrol_multiplier, alertness_multiplier, sensor_bonus) = match self {
            PressureBand::Normal => (1.0, 1.0, 0.0),
            PressureBand::Rumors => (1.25, 1.1, 0.05),
            PressureBand::Scrutiny => (1.5, 1.25, 0.1),
            PressureBand::Checkpoints => (2.0, 1.5, 0.15),
            PressureBand::Restrictions => (2.5, 2.0, 0.25),
        };
        BandEffects {
            patrol_multiplier,
            alertness_multiplier,
            sensor_bonus,
        }
    }
}

/// Multipliers collaborators apply to patrol density, witness alertness and sensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandEffects {
    pub patrol_multiplier: f32,
    pub alertness_multiplier: f32,
    pub sensor_bonus: f32,
}

#[derive(Debug, Clone)]
pub struct SuspicionLedger {
    level: f64,
    ceiling: f64,
    decay_per_hour: f64,
    /// Standing relief applied every tick regardless of the decay modifier.
    passive_relief_per_hour: f64,
    boundaries: [f64; 3],
    timeline: VecDeque<LedgerEntry>,
    timeline_capacity: usize,
}

impl SuspicionLedger {
    /// Expects a validated config: three strictly increasing boundaries starting at zero.
    pub fn new(config: &LedgerConfig) -> Self {
        let mut boundaries = [0.0; 3];
        for (slot, value) in boundaries.iter_mut().zip(config.tier_boundaries.iter()) {
            *slot = *value;
        }
        Self {
            level: 0.0,
            ceiling: config.ceiling,
            decay_per_hour: config.decay_per_hour,
            passive_relief_per_hour: 0.0,
            boundaries,
            timeline: VecDeque::with_capacity(config.timeline_capacity),
            timeline_capacity: config.timeline_capacity.max(1),
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    pub fn boundaries(&self) -> [f64; 3] {
        self.boundaries
    }

    pub fn passive_relief_per_hour(&self) -> f64 {
        self.passive_relief_per_hour
    }

    pub fn set_passive_relief(&mut self, per_hour: f64) {
        self.passive_relief_per_hour = if per_hour.is_finite() { per_hour.max(0.0) } else { 0.0 };
    }

    /// Add `base_amount * quality`. Returns the applied change.
    pub fn add_contribution(&mut self, base_amount: f64, quality: f32) -> f64 {
        if !base_amount.is_finite() || !quality.is_finite() {
            return 0.0;
        }
        self.shift(base_amount * f64::from(quality.clamp(0.0, 1.0)))
    }

    /// Contribution of one piece of evidence, kept on the timeline.
    pub fn record_evidence(&mut self, event: &EvidenceEvent, base_amount: f64) -> f64 {
        let applied = self.add_contribution(base_amount, event.quality);
        if applied > 0.0 {
            self.record(LedgerEntry {
                at: event.timestamp,
                source: LedgerSource::Evidence(event.witness),
                applied,
                level_after: self.level,
            });
        }
        applied
    }

    /// Signed change from an audit or countermeasure. Returns the applied change.
    pub fn apply_adjustment(&mut self, delta: f64, source: LedgerSource, at: f64) -> f64 {
        if !delta.is_finite() {
            return 0.0;
        }
        let applied = self.shift(delta);
        self.record(LedgerEntry {
            at,
            source,
            applied,
            level_after: self.level,
        });
        applied
    }

    /// Linear decay over `dt` seconds, plus any passive relief.
    pub fn tick(&mut self, dt: f64, modifier: DecayModifier) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }
        let hours = dt / SECONDS_PER_HOUR;
        let decay = (self.decay_per_hour * modifier.factor() + self.passive_relief_per_hour) * hours;
        self.level = (self.level - decay).max(0.0);
    }

    pub fn tier(&self) -> AuthorityTier {
        tier_for_level(self.level, &self.boundaries)
    }

    /// Fraction of the way from the current tier's boundary to the next one (or the
    /// ceiling for the top tier).
    pub fn tier_progress(&self) -> f64 {
        let tier = self.tier();
        let lower = self.boundaries[tier.index()];
        let upper = self
            .boundaries
            .get(tier.index() + 1)
            .copied()
            .unwrap_or(self.ceiling);
        if upper <= lower {
            return 1.0;
        }
        ((self.level - lower) / (upper - lower)).clamp(0.0, 1.0)
    }

    pub fn pressure_band(&self) -> PressureBand {
        PressureBand::classify(self.level)
    }

    pub fn timeline(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.timeline.iter()
    }

    fn shift(&mut self, delta: f64) -> f64 {
        let before = self.level;
        self.level = (self.level + delta).clamp(0.0, self.ceiling);
        self.level - before
    }

    fn record(&mut self, entry: LedgerEntry) {
        if self.timeline.len() >= self.timeline_capacity {
            self.timeline.pop_front();
        }
        self.timeline.push_back(entry);
    }
}

/// Highest tier whose lower boundary is `<= level`.
pub fn tier_for_level(level: f64, boundaries: &[f64; 3]) -> AuthorityTier {
    if level >= boundaries[2] {
        AuthorityTier::Federal
    } else if level >= boundaries[1] {
        AuthorityTier::State
    } else {
        AuthorityTier::Local
    }
}
