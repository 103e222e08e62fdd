//! The escalation engine context object.
//!
//! [`EscalationEngine::advance`] runs one tick in a fixed order: evidence, ledger decay,
//! public-relations effects, tier refresh, auditor, investigation and raid, ending
//! resolution. Commands validate before they draw and become rejections once the campaign
//! has ended.

use std::sync::Arc;

use bevy::prelude::Resource;
use crossbeam_channel::Receiver;

use crate::{
    audit::{AuditPhase, AuditStats, HoldingsAuditor},
    collaborators::{Collaborators, FundsService},
    config::EscalationConfig,
    countermeasures::{
        CountermeasureContext, CountermeasureDesk, CountermeasureKind, CountermeasureRejection,
        CountermeasureReport, CountermeasureStats,
    },
    ending::{Ending, EndingResolver, EndingSummary, TerminalInputs},
    entropy::{RandomSource, SeededEntropy},
    escalation::{EscalationController, Investigation, RaidState},
    events::{EscalationEvent, EscalationEventKind, EventBus},
    evidence::EvidenceEvaluator,
    ledger::{AuthorityTier, BandEffects, DecayModifier, PressureBand, SuspicionLedger},
    relations::PublicRelations,
    snapshot::EscalationSnapshot,
};

/// What happened during one call to [`EscalationEngine::advance`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    pub evidence_events: u32,
    pub suspicion_added: f64,
    pub ending: Option<Ending>,
}

#[derive(Resource)]
pub struct EscalationEngine {
    config: Arc<EscalationConfig>,
    evaluator: EvidenceEvaluator,
    ledger: SuspicionLedger,
    auditor: HoldingsAuditor,
    controller: EscalationController,
    desk: CountermeasureDesk,
    resolver: EndingResolver,
    rng: Box<dyn RandomSource>,
    bus: EventBus,
    tick: u64,
    now: f64,
    elapsed: f64,
}

impl EscalationEngine {
    pub fn new(config: Arc<EscalationConfig>, rng: Box<dyn RandomSource>) -> Self {
        Self {
            evaluator: EvidenceEvaluator::new(config.evidence.clone()),
            ledger: SuspicionLedger::new(&config.ledger),
            auditor: HoldingsAuditor::new(config.audit.clone()),
            controller: EscalationController::new(config.investigation.clone()),
            desk: CountermeasureDesk::new(config.countermeasures.clone()),
            resolver: EndingResolver::new(config.endings.clone()),
            config,
            rng,
            bus: EventBus::default(),
            tick: 0,
            now: 0.0,
            elapsed: 0.0,
        }
    }

    /// Engine driven by a ChaCha8 stream seeded from `seed`.
    pub fn with_seed(config: Arc<EscalationConfig>, seed: u64) -> Self {
        Self::new(config, Box::new(SeededEntropy::new(seed)))
    }

    /// Engine seeded from the configuration's `rng_seed`.
    pub fn seeded(config: Arc<EscalationConfig>) -> Self {
        let seed = config.rng_seed;
        Self::with_seed(config, seed)
    }

    pub fn advance(&mut self, dt: f64, now: f64, collaborators: &mut Collaborators<'_>) -> TickReport {
        let mut report = TickReport::default();
        if self.resolver.is_ended() {
            return report;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.tick += 1;
        self.now = now;
        self.elapsed += dt;
        let mut events = Vec::new();

        for candidate in collaborators.sight.candidates(now) {
            let Some(evidence) = self.evaluator.observe(&candidate, now) else {
                continue;
            };
            let growth = self.desk.relations().growth_modifier(self.ledger.level());
            let base = self.evaluator.base_amount(evidence.witness) * growth;
            report.suspicion_added += self.ledger.record_evidence(&evidence, base);
            report.evidence_events += 1;
            tracing::debug!(
                target: "stealth::evidence",
                witness = ?evidence.witness,
                quality = evidence.quality,
                level = ?evidence.level,
                "evidence.recorded"
            );
        }

        self.ledger.tick(dt, self.decay_modifier());
        self.desk
            .relations_mut()
            .tick(now, &mut self.ledger, collaborators.funds, &mut events);

        let audit_failed = self.auditor.stats().failures() > 0;
        self.controller.refresh_tier(
            self.ledger.tier(),
            self.ledger.level(),
            now,
            audit_failed,
            self.rng.as_mut(),
            &mut events,
        );

        self.auditor.tick(
            dt,
            now,
            &mut self.ledger,
            collaborators.holdings,
            collaborators.funds,
            self.rng.as_mut(),
            &mut events,
        );

        self.controller.advance(dt, self.rng.as_mut(), &mut events);

        report.ending = self.resolve_ending(collaborators.funds.balance(), &mut events);
        self.publish(events);
        report
    }

    pub fn attempt_bribery(&mut self, now: f64, funds: &mut dyn FundsService) -> CountermeasureReport {
        self.attempt(CountermeasureKind::Bribery, now, funds)
    }

    pub fn attempt_evidence_tampering(
        &mut self,
        now: f64,
        funds: &mut dyn FundsService,
    ) -> CountermeasureReport {
        self.attempt(CountermeasureKind::EvidenceTampering, now, funds)
    }

    pub fn attempt_flight(&mut self, now: f64, funds: &mut dyn FundsService) -> CountermeasureReport {
        self.attempt(CountermeasureKind::Flight, now, funds)
    }

    pub fn negotiate_settlement(
        &mut self,
        now: f64,
        funds: &mut dyn FundsService,
    ) -> CountermeasureReport {
        self.attempt(CountermeasureKind::Settlement, now, funds)
    }

    pub fn counter_rumors(&mut self, now: f64, funds: &mut dyn FundsService) -> CountermeasureReport {
        self.attempt(CountermeasureKind::CounterRumors, now, funds)
    }

    pub fn donate_to_city(&mut self, now: f64, funds: &mut dyn FundsService) -> CountermeasureReport {
        self.attempt(CountermeasureKind::CityDonation, now, funds)
    }

    pub fn sponsor_event(&mut self, now: f64, funds: &mut dyn FundsService) -> CountermeasureReport {
        self.attempt(CountermeasureKind::EventSponsorship, now, funds)
    }

    pub fn start_propaganda(&mut self, now: f64, funds: &mut dyn FundsService) -> CountermeasureReport {
        self.attempt(CountermeasureKind::StartPropaganda, now, funds)
    }

    pub fn stop_propaganda(&mut self, now: f64, funds: &mut dyn FundsService) -> CountermeasureReport {
        self.attempt(CountermeasureKind::StopPropaganda, now, funds)
    }

    /// Run any countermeasure or public-relations command by kind.
    ///
    /// An accepted attempt relabels the tier immediately so [`Self::tier`] matches the
    /// ledger; investigations still only open on the next [`Self::advance`].
    pub fn attempt(
        &mut self,
        kind: CountermeasureKind,
        now: f64,
        funds: &mut dyn FundsService,
    ) -> CountermeasureReport {
        if self.resolver.is_ended() {
            return CountermeasureReport::rejected(kind, CountermeasureRejection::CampaignEnded);
        }

        let mut events = Vec::new();
        let report = {
            let mut ctx = CountermeasureContext {
                now,
                controller: &mut self.controller,
                ledger: &mut self.ledger,
                funds: &mut *funds,
                rng: self.rng.as_mut(),
                events: &mut events,
            };
            (kind.handler())(&mut self.desk, &mut ctx)
        };

        if !report.was_rejected() {
            self.controller
                .relabel_tier(self.ledger.tier(), self.ledger.level(), &mut events);
            self.resolve_ending(funds.balance(), &mut events);
        }
        self.publish(events);
        report
    }

    /// Schedule a mandatory audit regardless of tier or immunity.
    pub fn force_audit(&mut self, warning_seconds: f64) -> bool {
        if self.resolver.is_ended() {
            return false;
        }
        let mut events = Vec::new();
        let scheduled = self.auditor.force_schedule(warning_seconds, &mut events);
        self.publish(events);
        scheduled
    }

    pub fn subscribe(&mut self) -> Receiver<EscalationEvent> {
        self.bus.subscribe()
    }

    /// Events published since the last drain.
    pub fn drain_events(&mut self) -> Vec<EscalationEvent> {
        self.bus.drain_backlog()
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn ledger(&self) -> &SuspicionLedger {
        &self.ledger
    }

    pub fn ledger_level(&self) -> f64 {
        self.ledger.level()
    }

    /// Tier label, refreshed on every tick and after every accepted countermeasure.
    pub fn tier(&self) -> AuthorityTier {
        self.controller.tier()
    }

    pub fn pressure_band(&self) -> PressureBand {
        self.ledger.pressure_band()
    }

    pub fn band_effects(&self) -> BandEffects {
        self.ledger.pressure_band().effects()
    }

    pub fn audit_phase(&self) -> AuditPhase {
        self.auditor.phase()
    }

    pub fn audit_remaining(&self) -> Option<f64> {
        self.auditor.phase().remaining()
    }

    pub fn audit_stats(&self) -> AuditStats {
        self.auditor.stats()
    }

    pub fn audit_immunity_until(&self) -> f64 {
        self.auditor.immunity_until()
    }

    pub fn throughput_multiplier(&self) -> f32 {
        self.auditor.throughput_multiplier(self.now)
    }

    pub fn investigation(&self) -> Option<&Investigation> {
        self.controller.investigation()
    }

    pub fn investigation_progress(&self) -> Option<f64> {
        self.controller
            .investigation()
            .map(|investigation| investigation.progress)
    }

    pub fn controller(&self) -> &EscalationController {
        &self.controller
    }

    pub fn raid(&self) -> RaidState {
        self.controller.raid()
    }

    pub fn raid_countdown(&self) -> Option<f64> {
        self.controller.raid_countdown()
    }

    pub fn bribery_ready_at(&self) -> f64 {
        self.controller.bribery_ready_at()
    }

    pub fn countermeasure_stats(&self) -> CountermeasureStats {
        self.desk.stats()
    }

    pub fn public_relations(&self) -> &PublicRelations {
        self.desk.relations()
    }

    pub fn ending(&self) -> Option<&Ending> {
        self.resolver.ending()
    }

    pub fn is_ended(&self) -> bool {
        self.resolver.is_ended()
    }

    pub fn snapshot(&self) -> EscalationSnapshot {
        EscalationSnapshot::capture(self)
    }

    fn decay_modifier(&self) -> DecayModifier {
        if self.config.ledger.audit_suppresses_decay && self.auditor.phase().is_in_progress() {
            DecayModifier::Suppressed
        } else if self.controller.investigation().is_some() {
            DecayModifier::Dampened(self.config.ledger.investigation_decay_factor)
        } else {
            DecayModifier::Normal
        }
    }

    fn resolve_ending(
        &mut self,
        funds: f64,
        events: &mut Vec<EscalationEventKind>,
    ) -> Option<Ending> {
        let inputs = TerminalInputs {
            raid_executed: self.controller.raid_executed(),
            critical_audit: self.auditor.critical_failure(),
            escaped: self.desk.escaped(),
            settled: self.desk.settled(),
            funds,
            ledger_level: self.ledger.level(),
            elapsed: self.elapsed,
            investigation_active: self.controller.investigation().is_some(),
            raid_pending: self.controller.raid_countdown().is_some(),
        };
        let summary = self.summary(funds);
        let ending = self.resolver.resolve(&inputs, summary, self.tick, self.now)?;
        events.push(EscalationEventKind::EndingSet {
            ending: ending.kind,
            summary: ending.summary,
        });
        Some(ending)
    }

    fn summary(&self, funds: f64) -> EndingSummary {
        let audits = self.auditor.stats();
        let countermeasures = self.desk.stats();
        EndingSummary {
            tier_escalations: self.controller.escalations(),
            countermeasure_attempts: countermeasures.attempts,
            countermeasure_successes: countermeasures.successes,
            investigation_progress: self.investigation_progress().unwrap_or(0.0),
            ledger_level: self.ledger.level(),
            funds,
            elapsed: self.elapsed,
            audits_passed: audits.passed,
            audits_failed: audits.failures(),
        }
    }

    fn publish(&mut self, events: Vec<EscalationEventKind>) {
        for kind in events {
            self.bus.publish(EscalationEvent {
                tick: self.tick,
                at: self.now,
                kind,
            });
        }
    }
}
