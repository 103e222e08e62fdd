//! Tuning for the escalation engine.
//!
//! Loaded from `escalation_config.json` with support for an environment variable
//! override. Durations are authored in game hours and converted to simulated seconds
//! at the point of use.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

use crate::{evidence::ObserverClass, ledger::AuthorityTier};

pub const BUILTIN_ESCALATION_CONFIG: &str = include_str!("data/escalation_config.json");

pub const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Root configuration for the escalation engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub rng_seed: u64,
    pub evidence: EvidenceConfig,
    pub ledger: LedgerConfig,
    pub audit: AuditConfig,
    pub investigation: InvestigationConfig,
    pub countermeasures: CountermeasureConfig,
    pub endings: EndingConfig,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            rng_seed: 0x5eed_0f_7a11,
            evidence: EvidenceConfig::default(),
            ledger: LedgerConfig::default(),
            audit: AuditConfig::default(),
            investigation: InvestigationConfig::default(),
            countermeasures: CountermeasureConfig::default(),
            endings: EndingConfig::default(),
        }
    }
}

impl EscalationConfig {
    pub fn builtin() -> Arc<Self> {
        let config = Self::from_json_str(BUILTIN_ESCALATION_CONFIG)
            .expect("builtin escalation config should parse");
        Arc::new(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EscalationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let boundaries = &self.ledger.tier_boundaries;
        if boundaries.len() != AuthorityTier::ALL.len() {
            return Err(ConfigError::Invalid(format!(
                "expected {} tier boundaries, found {}",
                AuthorityTier::ALL.len(),
                boundaries.len()
            )));
        }
        if boundaries[0] != 0.0 {
            return Err(ConfigError::Invalid(
                "the lowest tier boundary must be zero".to_string(),
            ));
        }
        if boundaries.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(ConfigError::Invalid(
                "tier boundaries must be strictly increasing".to_string(),
            ));
        }
        if self.ledger.ceiling < boundaries[boundaries.len() - 1] {
            return Err(ConfigError::Invalid(
                "ledger ceiling must reach the highest tier boundary".to_string(),
            ));
        }
        if self.ledger.decay_per_hour < 0.0 {
            return Err(ConfigError::Invalid(
                "ledger decay must not be negative".to_string(),
            ));
        }

        let audit = &self.audit;
        if audit.minor_threshold.quantity > audit.major_threshold.quantity
            || audit.minor_threshold.value > audit.major_threshold.value
        {
            return Err(ConfigError::Invalid(
                "minor audit threshold must not exceed the major threshold".to_string(),
            ));
        }

        let bribery = &self.countermeasures.bribery;
        let probabilities = [
            ("audit.minor_fail_probability", audit.minor_fail_probability),
            ("audit.major_fail_probability", audit.major_fail_probability),
            ("bribery.success.local", bribery.success_probability.local),
            ("bribery.success.state", bribery.success_probability.state),
            ("bribery.success.federal", bribery.success_probability.federal),
            (
                "tampering.success_probability",
                self.countermeasures.tampering.success_probability,
            ),
            (
                "tampering.disruption",
                self.countermeasures.tampering.disruption as f32,
            ),
            (
                "flight.forfeit_fraction",
                self.countermeasures.flight.forfeit_fraction as f32,
            ),
            (
                "settlement.funds_fraction",
                self.countermeasures.settlement.funds_fraction as f32,
            ),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must lie in [0, 1], found {value}"
                )));
            }
        }

        let ranges = [
            ("audit.warning_hours", audit.warning_hours),
            ("investigation.raid_warning_hours", self.investigation.raid_warning_hours),
            ("bribery.progress_relief", bribery.progress_relief),
            ("bribery.suspicion_relief", bribery.suspicion_relief),
            ("bribery.success_cooldown_hours", bribery.success_cooldown_hours),
            ("bribery.failure_cooldown_hours", bribery.failure_cooldown_hours),
        ];
        for (name, range) in ranges {
            if range.min > range.max || range.min < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative range with min <= max"
                )));
            }
        }

        let settlement = &self.countermeasures.settlement;
        if settlement.min_progress > settlement.max_progress {
            return Err(ConfigError::Invalid(
                "settlement progress band is empty".to_string(),
            ));
        }

        let relations = &self.countermeasures.public_relations;
        if !(0.0..=1.0).contains(&relations.propaganda_growth_modifier) {
            return Err(ConfigError::Invalid(format!(
                "public_relations.propaganda_growth_modifier must lie in [0, 1], found {}",
                relations.propaganda_growth_modifier
            )));
        }
        if relations.propaganda_period_hours <= 0.0 {
            return Err(ConfigError::Invalid(
                "public_relations.propaganda_period_hours must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-observer lookup table.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ObserverTable {
    pub civilian: f32,
    pub patrol: f32,
    pub fixed_sensor: f32,
}

impl ObserverTable {
    pub fn get(&self, observer: ObserverClass) -> f32 {
        match observer {
            ObserverClass::Civilian => self.civilian,
            ObserverClass::Patrol => self.patrol,
            ObserverClass::FixedSensor => self.fixed_sensor,
        }
    }
}

/// Per-tier lookup table.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TierTable {
    pub local: f32,
    pub state: f32,
    pub federal: f32,
}

impl TierTable {
    pub fn get(&self, tier: AuthorityTier) -> f32 {
        match tier {
            AuthorityTier::Local => self.local,
            AuthorityTier::State => self.state,
            AuthorityTier::Federal => self.federal,
        }
    }
}

/// Inclusive range sampled uniformly by the entropy source.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct SampleRange {
    pub min: f32,
    pub max: f32,
}

impl SampleRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// The range interpreted as game hours, in simulated seconds.
    pub fn in_seconds(self) -> (f64, f64) {
        (
            self.min as f64 * SECONDS_PER_HOUR,
            self.max as f64 * SECONDS_PER_HOUR,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Distance at which an observer's distance factor reaches zero.
    pub max_radius: ObserverTable,
    /// Suspicion added by a perfect-quality observation.
    pub base_contribution: ObserverTable,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            max_radius: ObserverTable {
                civilian: 160.0,
                patrol: 240.0,
                fixed_sensor: 320.0,
            },
            base_contribution: ObserverTable {
                civilian: 4.0,
                patrol: 8.0,
                fixed_sensor: 12.0,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub ceiling: f64,
    pub decay_per_hour: f64,
    /// Lower bound of each authority tier, lowest first.
    pub tier_boundaries: Vec<f64>,
    pub investigation_decay_factor: f64,
    pub audit_suppresses_decay: bool,
    pub timeline_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            ceiling: 150.0,
            decay_per_hour: 2.0,
            tier_boundaries: vec![0.0, 50.0, 100.0],
            investigation_decay_factor: 0.5,
            audit_suppresses_decay: true,
            timeline_capacity: 64,
        }
    }
}

/// Unlawful holdings reach a threshold when either dimension does.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HoldingsThreshold {
    pub quantity: f32,
    pub value: f32,
}

impl HoldingsThreshold {
    pub fn reached_by(&self, quantity: f32, value: f32) -> bool {
        quantity >= self.quantity || value >= self.value
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub trigger_tier: AuthorityTier,
    pub warning_hours: SampleRange,
    pub duration_hours: f32,
    pub immunity_hours: f32,
    pub reaudit_delay_hours: f32,
    pub minor_threshold: HoldingsThreshold,
    pub major_threshold: HoldingsThreshold,
    pub minor_fail_probability: f32,
    pub major_fail_probability: f32,
    pub pass_relief: f64,
    pub minor_suspicion: f64,
    pub major_suspicion: f64,
    pub minor_fine: f64,
    pub major_fine: f64,
    pub throughput_penalty: f32,
    pub throughput_penalty_hours: f32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            trigger_tier: AuthorityTier::State,
            warning_hours: SampleRange::new(24.0, 48.0),
            duration_hours: 1.0,
            immunity_hours: 168.0,
            reaudit_delay_hours: 72.0,
            minor_threshold: HoldingsThreshold {
                quantity: 50.0,
                value: 500.0,
            },
            major_threshold: HoldingsThreshold {
                quantity: 200.0,
                value: 2_500.0,
            },
            minor_fail_probability: 0.6,
            major_fail_probability: 0.8,
            pass_relief: 20.0,
            minor_suspicion: 10.0,
            major_suspicion: 30.0,
            minor_fine: 5_000.0,
            major_fine: 20_000.0,
            throughput_penalty: 0.5,
            throughput_penalty_hours: 72.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InvestigationConfig {
    /// Percentage points of case progress gained per game hour.
    pub progress_per_hour: f64,
    pub raid_warning_hours: SampleRange,
}

impl Default for InvestigationConfig {
    fn default() -> Self {
        Self {
            progress_per_hour: 0.5,
            raid_warning_hours: SampleRange::new(2.0, 4.0),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CountermeasureConfig {
    pub bribery: BriberyConfig,
    pub tampering: TamperingConfig,
    pub flight: FlightConfig,
    pub settlement: SettlementConfig,
    pub public_relations: PublicRelationsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BriberyConfig {
    pub cost: f64,
    pub success_probability: TierTable,
    pub progress_relief: SampleRange,
    pub suspicion_relief: SampleRange,
    pub failure_suspicion: TierTable,
    pub success_cooldown_hours: SampleRange,
    pub failure_cooldown_hours: SampleRange,
}

impl Default for BriberyConfig {
    fn default() -> Self {
        Self {
            cost: 10_000.0,
            success_probability: TierTable {
                local: 0.7,
                state: 0.4,
                federal: 0.15,
            },
            progress_relief: SampleRange::new(15.0, 30.0),
            suspicion_relief: SampleRange::new(10.0, 20.0),
            failure_suspicion: TierTable {
                local: 20.0,
                state: 20.0,
                federal: 30.0,
            },
            success_cooldown_hours: SampleRange::new(24.0, 48.0),
            failure_cooldown_hours: SampleRange::new(48.0, 96.0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TamperingConfig {
    pub cost: f64,
    pub success_probability: f32,
    pub disruption: f64,
    pub failure_suspicion: f64,
    pub failure_rate_multiplier: f64,
}

impl Default for TamperingConfig {
    fn default() -> Self {
        Self {
            cost: 15_000.0,
            success_probability: 0.6,
            disruption: 0.5,
            failure_suspicion: 25.0,
            failure_rate_multiplier: 1.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    /// Share of positive funds lost when fleeing.
    pub forfeit_fraction: f64,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            forfeit_fraction: 0.7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub min_progress: f64,
    pub max_progress: f64,
    pub funds_fraction: f64,
    pub minimum_cost: f64,
}

impl SettlementConfig {
    pub fn cost_for(&self, funds: f64) -> f64 {
        (funds * self.funds_fraction).max(self.minimum_cost)
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            min_progress: 30.0,
            max_progress: 80.0,
            funds_fraction: 0.7,
            minimum_cost: 30_000.0,
        }
    }
}

/// Community campaigns run alongside the covert countermeasures.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublicRelationsConfig {
    pub starting_relations: f64,
    pub counter_rumor_cost: f64,
    /// Counter-rumors only work once rumors are circulating.
    pub counter_rumor_min_level: f64,
    pub counter_rumor_delay_hours: f32,
    pub counter_rumor_relief: f64,
    pub donation_cost: f64,
    pub donation_relief: f64,
    pub donation_relations: f64,
    pub sponsorship_cost: f64,
    pub sponsorship_relief: f64,
    pub sponsorship_relations: f64,
    pub good_neighbor_threshold: f64,
    pub good_neighbor_relief_per_day: f64,
    pub propaganda_cost: f64,
    pub propaganda_period_hours: f32,
    /// Multiplier on evidence contributions while propaganda runs.
    pub propaganda_growth_modifier: f64,
    /// Propaganda has no effect at or above this level.
    pub propaganda_max_level: f64,
}

impl Default for PublicRelationsConfig {
    fn default() -> Self {
        Self {
            starting_relations: 50.0,
            counter_rumor_cost: 1_000.0,
            counter_rumor_min_level: 20.0,
            counter_rumor_delay_hours: 72.0,
            counter_rumor_relief: 5.0,
            donation_cost: 5_000.0,
            donation_relief: 3.0,
            donation_relations: 5.0,
            sponsorship_cost: 10_000.0,
            sponsorship_relief: 8.0,
            sponsorship_relations: 15.0,
            good_neighbor_threshold: 70.0,
            good_neighbor_relief_per_day: 0.2,
            propaganda_cost: 2_000.0,
            propaganda_period_hours: 168.0,
            propaganda_growth_modifier: 0.5,
            propaganda_max_level: 80.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndingConfig {
    /// Funds strictly below this value end the campaign in bankruptcy.
    pub bankruptcy_floor: f64,
    pub legitimate_success: LegitimateSuccessConfig,
}

impl Default for EndingConfig {
    fn default() -> Self {
        Self {
            bankruptcy_floor: -50_000.0,
            legitimate_success: LegitimateSuccessConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LegitimateSuccessConfig {
    pub enabled: bool,
    pub campaign_hours: f32,
    pub max_level: f64,
    pub min_funds: f64,
}

impl Default for LegitimateSuccessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            campaign_hours: 720.0,
            max_level: 20.0,
            min_funds: 100_000.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse escalation config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read escalation config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid escalation config: {0}")]
    Invalid(String),
}

/// Handle for accessing the escalation configuration.
#[derive(Resource, Debug, Clone)]
pub struct EscalationConfigHandle(pub Arc<EscalationConfig>);

impl EscalationConfigHandle {
    pub fn new(config: Arc<EscalationConfig>) -> Self {
        Self(config)
    }

    pub fn get(&self) -> Arc<EscalationConfig> {
        Arc::clone(&self.0)
    }
}

/// Load escalation configuration from `ESCALATION_CONFIG_PATH`, falling back to the
/// builtin document.
pub fn load_escalation_config_from_env() -> Arc<EscalationConfig> {
    let Some(path) = env::var("ESCALATION_CONFIG_PATH").ok().map(PathBuf::from) else {
        tracing::info!(
            target: "stealth::config",
            "escalation_config.loaded=builtin"
        );
        return EscalationConfig::builtin();
    };

    match EscalationConfig::from_file(&path) {
        Ok(config) => {
            tracing::info!(
                target: "stealth::config",
                path = %path.display(),
                "escalation_config.loaded=file"
            );
            Arc::new(config)
        }
        Err(err) => {
            tracing::warn!(
                target: "stealth::config",
                path = %path.display(),
                error = %err,
                "escalation_config.load_failed"
            );
            EscalationConfig::builtin()
        }
    }
}
