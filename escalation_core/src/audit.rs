//! Holdings auditor.
//!
//! Runs one audit cycle at a time: a randomised warning countdown, a fixed inspection
//! window, then an outcome drawn from the unlawful share of the actor's holdings.

use serde::{Deserialize, Serialize};

use crate::{
    collaborators::{FundsService, HoldingsService},
    config::{AuditConfig, SECONDS_PER_HOUR},
    entropy::RandomSource,
    events::EscalationEventKind,
    ledger::{LedgerSource, SuspicionLedger},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditOutcome {
    Pass,
    FailMinor,
    FailMajor,
    FailCritical,
}

impl AuditOutcome {
    pub fn is_failure(self) -> bool {
        !matches!(self, AuditOutcome::Pass)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuditOutcome::Pass => "pass",
            AuditOutcome::FailMinor => "fail_minor",
            AuditOutcome::FailMajor => "fail_major",
            AuditOutcome::FailCritical => "fail_critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum AuditPhase {
    #[default]
    Idle,
    Scheduled {
        remaining: f64,
        mandatory: bool,
    },
    InProgress {
        remaining: f64,
    },
    Resolved(AuditOutcome),
}

impl AuditPhase {
    pub fn remaining(&self) -> Option<f64> {
        match self {
            AuditPhase::Scheduled { remaining, .. } | AuditPhase::InProgress { remaining } => {
                Some(*remaining)
            }
            AuditPhase::Idle | AuditPhase::Resolved(_) => None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, AuditPhase::InProgress { .. })
    }

    fn is_open(&self) -> bool {
        matches!(self, AuditPhase::Idle | AuditPhase::Resolved(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStats {
    pub scheduled: u32,
    pub passed: u32,
    pub failed_minor: u32,
    pub failed_major: u32,
    pub failed_critical: u32,
}

impl AuditStats {
    pub fn failures(&self) -> u32 {
        self.failed_minor + self.failed_major + self.failed_critical
    }

    fn record(&mut self, outcome: AuditOutcome) {
        match outcome {
            AuditOutcome::Pass => self.passed += 1,
            AuditOutcome::FailMinor => self.failed_minor += 1,
            AuditOutcome::FailMajor => self.failed_major += 1,
            AuditOutcome::FailCritical => self.failed_critical += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThroughputPenalty {
    pub multiplier: f32,
    pub until: f64,
}

#[derive(Debug, Clone)]
pub struct HoldingsAuditor {
    config: AuditConfig,
    phase: AuditPhase,
    immunity_until: f64,
    penalty: Option<ThroughputPenalty>,
    critical_failure: bool,
    stats: AuditStats,
}

impl HoldingsAuditor {
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config,
            phase: AuditPhase::Idle,
            immunity_until: 0.0,
            penalty: None,
            critical_failure: false,
            stats: AuditStats::default(),
        }
    }

    pub fn phase(&self) -> AuditPhase {
        self.phase
    }

    pub fn stats(&self) -> AuditStats {
        self.stats
    }

    pub fn immunity_until(&self) -> f64 {
        self.immunity_until
    }

    pub fn critical_failure(&self) -> bool {
        self.critical_failure
    }

    pub fn penalty(&self) -> Option<ThroughputPenalty> {
        self.penalty
    }

    /// Production multiplier collaborators should apply at `now`.
    pub fn throughput_multiplier(&self, now: f64) -> f32 {
        match self.penalty {
            Some(penalty) if now < penalty.until => penalty.multiplier,
            _ => 1.0,
        }
    }

    /// Schedule an audit outside the tier trigger. Ignores immunity; refused while a
    /// cycle is already running or after a critical failure.
    pub fn force_schedule(
        &mut self,
        warning_seconds: f64,
        events: &mut Vec<EscalationEventKind>,
    ) -> bool {
        if self.critical_failure || !self.phase.is_open() {
            return false;
        }
        self.schedule(warning_seconds.max(0.0), true, events);
        true
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        dt: f64,
        now: f64,
        ledger: &mut SuspicionLedger,
        holdings: &dyn HoldingsService,
        funds: &mut dyn FundsService,
        rng: &mut dyn RandomSource,
        events: &mut Vec<EscalationEventKind>,
    ) {
        if self.critical_failure {
            return;
        }

        match self.phase {
            AuditPhase::Idle | AuditPhase::Resolved(_) => {
                let triggered = ledger.tier() >= self.config.trigger_tier;
                if triggered && now >= self.immunity_until {
                    let (min, max) = self.config.warning_hours.in_seconds();
                    let countdown = rng.range_f64(min, max);
                    self.schedule(countdown, false, events);
                }
            }
            AuditPhase::Scheduled {
                remaining,
                mandatory,
            } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    let duration = self.config.duration_hours as f64 * SECONDS_PER_HOUR;
                    self.phase = AuditPhase::InProgress {
                        remaining: duration,
                    };
                    tracing::info!(
                        target: "stealth::audit",
                        mandatory,
                        duration_secs = duration,
                        "audit.started"
                    );
                    events.push(EscalationEventKind::AuditStarted { duration });
                } else {
                    self.phase = AuditPhase::Scheduled {
                        remaining,
                        mandatory,
                    };
                }
            }
            AuditPhase::InProgress { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    let outcome = self.evaluate(holdings, rng);
                    self.apply_outcome(outcome, now, ledger, funds, events);
                } else {
                    self.phase = AuditPhase::InProgress { remaining };
                }
            }
        }
    }

    /// Outcome for the given holdings. Draws at most once.
    pub fn evaluate(&self, holdings: &dyn HoldingsService, rng: &mut dyn RandomSource) -> AuditOutcome {
        let quantity = holdings.unlawful_quantity();
        let value = holdings.unlawful_value();
        let clean = quantity <= 0.0 && value <= 0.0;
        if clean && holdings.suspicious_materials().is_empty() {
            return AuditOutcome::Pass;
        }

        if self.config.major_threshold.reached_by(quantity, value) {
            AuditOutcome::FailCritical
        } else if self.config.minor_threshold.reached_by(quantity, value) {
            if rng.next_unit() < self.config.major_fail_probability {
                AuditOutcome::FailMajor
            } else {
                AuditOutcome::FailMinor
            }
        } else if rng.next_unit() < self.config.minor_fail_probability {
            AuditOutcome::FailMinor
        } else {
            AuditOutcome::Pass
        }
    }

    fn apply_outcome(
        &mut self,
        outcome: AuditOutcome,
        now: f64,
        ledger: &mut SuspicionLedger,
        funds: &mut dyn FundsService,
        events: &mut Vec<EscalationEventKind>,
    ) {
        self.stats.record(outcome);
        self.phase = AuditPhase::Resolved(outcome);

        let (fine, suspicion) = match outcome {
            AuditOutcome::Pass => (0.0, -self.config.pass_relief),
            AuditOutcome::FailMinor => (self.config.minor_fine, self.config.minor_suspicion),
            AuditOutcome::FailMajor => (self.config.major_fine, self.config.major_suspicion),
            AuditOutcome::FailCritical => (0.0, 0.0),
        };
        if fine > 0.0 {
            funds.levy(fine);
        }
        let suspicion_delta = if suspicion != 0.0 {
            ledger.apply_adjustment(suspicion, LedgerSource::Audit, now)
        } else {
            0.0
        };

        tracing::info!(
            target: "stealth::audit",
            outcome = outcome.as_str(),
            fine,
            suspicion_delta,
            "audit.resolved"
        );
        events.push(EscalationEventKind::AuditResolved {
            outcome,
            fine,
            suspicion_delta,
        });

        match outcome {
            AuditOutcome::Pass => {
                self.immunity_until = now + self.config.immunity_hours as f64 * SECONDS_PER_HOUR;
            }
            AuditOutcome::FailMinor => {
                let delay = self.config.reaudit_delay_hours as f64 * SECONDS_PER_HOUR;
                self.schedule(delay, true, events);
            }
            AuditOutcome::FailMajor => {
                let until = now + self.config.throughput_penalty_hours as f64 * SECONDS_PER_HOUR;
                let penalty = ThroughputPenalty {
                    multiplier: self.config.throughput_penalty,
                    until,
                };
                self.penalty = Some(penalty);
                tracing::info!(
                    target: "stealth::audit",
                    multiplier = penalty.multiplier,
                    until,
                    "audit.throughput_penalty"
                );
                events.push(EscalationEventKind::ThroughputPenaltyImposed {
                    multiplier: penalty.multiplier,
                    until,
                });
            }
            AuditOutcome::FailCritical => {
                self.critical_failure = true;
                tracing::warn!(target: "stealth::audit", "audit.critical_failure");
            }
        }
    }

    fn schedule(&mut self, countdown: f64, mandatory: bool, events: &mut Vec<EscalationEventKind>) {
        self.phase = AuditPhase::Scheduled {
            remaining: countdown,
            mandatory,
        };
        self.stats.scheduled += 1;
        tracing::info!(
            target: "stealth::audit",
            countdown_secs = countdown,
            mandatory,
            "audit.scheduled"
        );
        events.push(EscalationEventKind::AuditScheduled {
            countdown,
            mandatory,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::LedgerConfig,
        entropy::ScriptedEntropy,
        funds::Treasury,
        holdings::{HoldingsInventory, MaterialKind},
    };

    const HOUR: f64 = SECONDS_PER_HOUR;

    fn state_level_ledger() -> SuspicionLedger {
        let mut ledger = SuspicionLedger::new(&LedgerConfig::default());
        ledger.add_contribution(50.0, 1.0);
        ledger
    }

    fn minor_holdings() -> HoldingsInventory {
        let mut inventory = HoldingsInventory::new();
        inventory.add_unlawful(MaterialKind::Plastic, 30.0);
        inventory.set_unit_value(MaterialKind::Plastic, 10.0);
        inventory
    }

    struct Harness {
        auditor: HoldingsAuditor,
        ledger: SuspicionLedger,
        holdings: HoldingsInventory,
        funds: Treasury,
        rng: ScriptedEntropy,
        events: Vec<EscalationEventKind>,
        now: f64,
    }

    impl Harness {
        fn new(holdings: HoldingsInventory, draws: Vec<f32>) -> Self {
            Self {
                auditor: HoldingsAuditor::new(AuditConfig::default()),
                ledger: state_level_ledger(),
                holdings,
                funds: Treasury::new(50_000.0),
                rng: ScriptedEntropy::new(draws),
                events: Vec::new(),
                now: 0.0,
            }
        }

        fn step(&mut self, dt: f64) {
            self.now += dt;
            self.auditor.tick(
                dt,
                self.now,
                &mut self.ledger,
                &self.holdings,
                &mut self.funds,
                &mut self.rng,
                &mut self.events,
            );
        }

        /// Schedule, start and resolve one audit.
        fn run_cycle(&mut self) {
            self.step(HOUR);
            let remaining = self.auditor.phase().remaining().expect("audit scheduled");
            self.step(remaining);
            assert!(self.auditor.phase().is_in_progress(), "audit should start");
            self.step(HOUR);
        }
    }

    #[test]
    fn scheduling_waits_for_trigger_tier() {
        let mut harness = Harness::new(HoldingsInventory::new(), vec![0.5]);
        harness.ledger = SuspicionLedger::new(&LedgerConfig::default());
        harness.step(HOUR);
        assert_eq!(harness.auditor.phase(), AuditPhase::Idle);

        harness.ledger.add_contribution(50.0, 1.0);
        harness.step(HOUR);
        match harness.auditor.phase() {
            AuditPhase::Scheduled {
                remaining,
                mandatory,
            } => {
                assert!(!mandatory);
                assert!((remaining - 36.0 * HOUR).abs() < 1.0, "warning drawn mid-range");
            }
            other => panic!("expected scheduled audit, found {other:?}"),
        }
    }

    #[test]
    fn clean_holdings_pass_and_grant_immunity() {
        let mut harness = Harness::new(HoldingsInventory::new(), vec![0.0]);
        harness.run_cycle();
        assert_eq!(harness.auditor.phase(), AuditPhase::Resolved(AuditOutcome::Pass));
        assert_eq!(harness.ledger.level(), 30.0);
        assert!(harness.auditor.immunity_until() > harness.now);

        harness.ledger.add_contribution(20.0, 1.0);
        harness.step(HOUR);
        assert_eq!(
            harness.auditor.phase(),
            AuditPhase::Resolved(AuditOutcome::Pass),
            "immunity blocks rescheduling"
        );
    }

    #[test]
    fn minor_failure_schedules_mandatory_reaudit() {
        let mut harness = Harness::new(minor_holdings(), vec![0.0, 0.4]);
        harness.run_cycle();
        assert_eq!(harness.auditor.stats().failed_minor, 1);
        assert_eq!(harness.ledger.level(), 60.0);
        assert_eq!(harness.funds.balance(), 45_000.0);
        assert_eq!(
            harness.auditor.phase(),
            AuditPhase::Scheduled {
                remaining: 72.0 * HOUR,
                mandatory: true
            }
        );
    }

    #[test]
    fn minor_holdings_can_pass_on_high_draw() {
        let mut harness = Harness::new(minor_holdings(), vec![0.0, 0.6]);
        harness.run_cycle();
        assert_eq!(harness.auditor.phase(), AuditPhase::Resolved(AuditOutcome::Pass));
    }

    #[test]
    fn major_failure_imposes_throughput_penalty() {
        let mut holdings = HoldingsInventory::new();
        holdings.add_unlawful(MaterialKind::Plastic, 100.0);
        let mut harness = Harness::new(holdings, vec![0.0, 0.1]);
        harness.run_cycle();
        assert_eq!(
            harness.auditor.phase(),
            AuditPhase::Resolved(AuditOutcome::FailMajor)
        );
        assert_eq!(harness.funds.balance(), 30_000.0);
        assert_eq!(harness.auditor.throughput_multiplier(harness.now), 0.5);
        assert_eq!(
            harness.auditor.throughput_multiplier(harness.now + 73.0 * HOUR),
            1.0
        );
    }

    #[test]
    fn either_dimension_reaches_threshold() {
        let mut holdings = HoldingsInventory::new();
        holdings.add_unlawful(MaterialKind::Copper, 170.0);
        let auditor = HoldingsAuditor::new(AuditConfig::default());
        let mut rng = ScriptedEntropy::constant(0.99);
        assert_eq!(
            auditor.evaluate(&holdings, &mut rng),
            AuditOutcome::FailCritical,
            "value 2550 reaches the major threshold even though quantity does not"
        );
    }

    #[test]
    fn critical_failure_stops_auditing() {
        let mut holdings = HoldingsInventory::new();
        holdings.add_unlawful(MaterialKind::Metal, 250.0);
        let mut harness = Harness::new(holdings, vec![0.0]);
        harness.run_cycle();
        assert!(harness.auditor.critical_failure());
        harness.step(500.0 * HOUR);
        assert_eq!(
            harness.auditor.phase(),
            AuditPhase::Resolved(AuditOutcome::FailCritical)
        );
        let mut events = Vec::new();
        assert!(!harness.auditor.force_schedule(HOUR, &mut events));
    }

    #[test]
    fn force_schedule_ignores_tier() {
        let mut auditor = HoldingsAuditor::new(AuditConfig::default());
        let mut events = Vec::new();
        assert!(auditor.force_schedule(2.0 * HOUR, &mut events));
        assert!(!auditor.force_schedule(2.0 * HOUR, &mut events), "one cycle at a time");
        assert_eq!(events.len(), 1);
    }
}
