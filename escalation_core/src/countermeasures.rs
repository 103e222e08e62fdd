//! Player-invoked countermeasures against an escalating case.
//!
//! Each attempt validates funds and state before touching the random source; a rejection
//! leaves every collaborator untouched. Public-relations campaigns go through the same
//! desk and report surface; their standing effects live in [`PublicRelations`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    collaborators::FundsService,
    config::CountermeasureConfig,
    entropy::RandomSource,
    escalation::EscalationController,
    events::EscalationEventKind,
    ledger::{LedgerSource, SuspicionLedger},
    relations::PublicRelations,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CountermeasureKind {
    Bribery,
    EvidenceTampering,
    Flight,
    Settlement,
    CounterRumors,
    CityDonation,
    EventSponsorship,
    StartPropaganda,
    StopPropaganda,
}

impl CountermeasureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CountermeasureKind::Bribery => "bribery",
            CountermeasureKind::EvidenceTampering => "evidence_tampering",
            CountermeasureKind::Flight => "flight",
            CountermeasureKind::Settlement => "settlement",
            CountermeasureKind::CounterRumors => "counter_rumors",
            CountermeasureKind::CityDonation => "city_donation",
            CountermeasureKind::EventSponsorship => "event_sponsorship",
            CountermeasureKind::StartPropaganda => "start_propaganda",
            CountermeasureKind::StopPropaganda => "stop_propaganda",
        }
    }

    /// The desk entry point for this kind.
    pub(crate) fn handler(
        self,
    ) -> fn(&mut CountermeasureDesk, &mut CountermeasureContext<'_>) -> CountermeasureReport {
        match self {
            CountermeasureKind::Bribery => CountermeasureDesk::bribery,
            CountermeasureKind::EvidenceTampering => CountermeasureDesk::evidence_tampering,
            CountermeasureKind::Flight => CountermeasureDesk::flight,
            CountermeasureKind::Settlement => CountermeasureDesk::settlement,
            CountermeasureKind::CounterRumors => CountermeasureDesk::counter_rumors,
            CountermeasureKind::CityDonation => CountermeasureDesk::city_donation,
            CountermeasureKind::EventSponsorship => CountermeasureDesk::event_sponsorship,
            CountermeasureKind::StartPropaganda => CountermeasureDesk::start_propaganda,
            CountermeasureKind::StopPropaganda => CountermeasureDesk::stop_propaganda,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountermeasureOutcome {
    Succeeded,
    Failed,
    RejectedInvalidState,
    RejectedInsufficientFunds,
}

#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum CountermeasureRejection {
    #[error("the campaign has already ended")]
    CampaignEnded,
    #[error("still cooling down until {until:.0}s")]
    CoolingDown { until: f64 },
    #[error("no investigation is active")]
    NoInvestigation,
    #[error("the investigation has already completed")]
    InvestigationCompleted,
    #[error("evidence tampering has already been attempted in this investigation")]
    TamperingUsed,
    #[error("no raid is imminent")]
    NoRaidPending,
    #[error("investigation progress {progress:.1} is outside the settlement band")]
    OutsideSettlementBand { progress: f64 },
    #[error("suspicion {level:.1} is too low for rumors to circulate")]
    NoRumors { level: f64 },
    #[error("a propaganda campaign is already running")]
    PropagandaActive,
    #[error("no propaganda campaign is running")]
    PropagandaInactive,
    #[error("insufficient funds: need {required:.2}, have {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },
}

impl CountermeasureRejection {
    pub fn outcome(&self) -> CountermeasureOutcome {
        match self {
            CountermeasureRejection::InsufficientFunds { .. } => {
                CountermeasureOutcome::RejectedInsufficientFunds
            }
            _ => CountermeasureOutcome::RejectedInvalidState,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountermeasureReport {
    pub kind: CountermeasureKind,
    pub outcome: CountermeasureOutcome,
    pub funds_delta: f64,
    pub suspicion_delta: f64,
    pub progress_delta: f64,
    pub rejection: Option<CountermeasureRejection>,
}

impl CountermeasureReport {
    pub fn rejected(kind: CountermeasureKind, rejection: CountermeasureRejection) -> Self {
        Self {
            kind,
            outcome: rejection.outcome(),
            funds_delta: 0.0,
            suspicion_delta: 0.0,
            progress_delta: 0.0,
            rejection: Some(rejection),
        }
    }

    fn resolved(kind: CountermeasureKind, succeeded: bool) -> Self {
        Self {
            kind,
            outcome: if succeeded {
                CountermeasureOutcome::Succeeded
            } else {
                CountermeasureOutcome::Failed
            },
            funds_delta: 0.0,
            suspicion_delta: 0.0,
            progress_delta: 0.0,
            rejection: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == CountermeasureOutcome::Succeeded
    }

    pub fn was_rejected(&self) -> bool {
        self.rejection.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountermeasureStats {
    pub attempts: u32,
    pub successes: u32,
}

/// Mutable state a countermeasure may touch.
pub struct CountermeasureContext<'a> {
    pub now: f64,
    pub controller: &'a mut EscalationController,
    pub ledger: &'a mut SuspicionLedger,
    pub funds: &'a mut dyn FundsService,
    pub rng: &'a mut dyn RandomSource,
    pub events: &'a mut Vec<EscalationEventKind>,
}

#[derive(Debug, Clone)]
pub struct CountermeasureDesk {
    config: CountermeasureConfig,
    relations: PublicRelations,
    stats: CountermeasureStats,
    escaped: bool,
    settled: bool,
}

impl CountermeasureDesk {
    pub fn new(config: CountermeasureConfig) -> Self {
        Self {
            relations: PublicRelations::new(config.public_relations.clone()),
            config,
            stats: CountermeasureStats::default(),
            escaped: false,
            settled: false,
        }
    }

    pub fn relations(&self) -> &PublicRelations {
        &self.relations
    }

    pub(crate) fn relations_mut(&mut self) -> &mut PublicRelations {
        &mut self.relations
    }

    pub fn stats(&self) -> CountermeasureStats {
        self.stats
    }

    pub fn escaped(&self) -> bool {
        self.escaped
    }

    pub fn settled(&self) -> bool {
        self.settled
    }

    pub fn bribery(&mut self, ctx: &mut CountermeasureContext<'_>) -> CountermeasureReport {
        let kind = CountermeasureKind::Bribery;
        let config = &self.config.bribery;
        let ready_at = ctx.controller.bribery_ready_at();
        if ctx.now < ready_at {
            return CountermeasureReport::rejected(
                kind,
                CountermeasureRejection::CoolingDown { until: ready_at },
            );
        }
        if let Err(rejection) = debit(ctx.funds, config.cost) {
            return CountermeasureReport::rejected(kind, rejection);
        }

        let tier = ctx.controller.tier();
        let succeeded = ctx.rng.next_unit() < config.success_probability.get(tier);
        let mut report = CountermeasureReport::resolved(kind, succeeded);
        report.funds_delta = -config.cost;

        let cooldown = if succeeded {
            let has_case = ctx.controller.investigation().is_some();
            if has_case {
                let relief = f64::from(
                    ctx.rng
                        .range(config.progress_relief.min, config.progress_relief.max),
                );
                if let Some(investigation) = ctx.controller.investigation_mut() {
                    report.progress_delta = investigation.set_back(relief);
                }
            } else {
                let relief = f64::from(
                    ctx.rng
                        .range(config.suspicion_relief.min, config.suspicion_relief.max),
                );
                report.suspicion_delta =
                    ctx.ledger
                        .apply_adjustment(-relief, LedgerSource::Countermeasure(kind), ctx.now);
            }
            config.success_cooldown_hours
        } else {
            report.suspicion_delta = ctx.ledger.apply_adjustment(
                f64::from(config.failure_suspicion.get(tier)),
                LedgerSource::Countermeasure(kind),
                ctx.now,
            );
            config.failure_cooldown_hours
        };
        let (min, max) = cooldown.in_seconds();
        ctx.controller
            .set_bribery_ready_at(ctx.now + ctx.rng.range_f64(min, max));

        self.finish(report, ctx)
    }

    pub fn evidence_tampering(
        &mut self,
        ctx: &mut CountermeasureContext<'_>,
    ) -> CountermeasureReport {
        let kind = CountermeasureKind::EvidenceTampering;
        let config = &self.config.tampering;
        let rejection = match ctx.controller.investigation() {
            None => Some(CountermeasureRejection::NoInvestigation),
            Some(investigation) if investigation.completed => {
                Some(CountermeasureRejection::InvestigationCompleted)
            }
            Some(investigation) if investigation.tampering_used => {
                Some(CountermeasureRejection::TamperingUsed)
            }
            Some(_) => None,
        };
        if let Some(rejection) = rejection {
            return CountermeasureReport::rejected(kind, rejection);
        }
        if let Err(rejection) = debit(ctx.funds, config.cost) {
            return CountermeasureReport::rejected(kind, rejection);
        }

        let succeeded = ctx.rng.next_unit() < config.success_probability;
        let mut report = CountermeasureReport::resolved(kind, succeeded);
        report.funds_delta = -config.cost;

        if let Some(investigation) = ctx.controller.investigation_mut() {
            investigation.tampering_used = true;
            if succeeded {
                investigation.disruption_factor = config.disruption;
            } else {
                investigation.rate_multiplier *= config.failure_rate_multiplier;
            }
        }
        if !succeeded {
            report.suspicion_delta = ctx.ledger.apply_adjustment(
                config.failure_suspicion,
                LedgerSource::Countermeasure(kind),
                ctx.now,
            );
        }

        self.finish(report, ctx)
    }

    pub fn flight(&mut self, ctx: &mut CountermeasureContext<'_>) -> CountermeasureReport {
        let kind = CountermeasureKind::Flight;
        if ctx.controller.raid_countdown().is_none() {
            return CountermeasureReport::rejected(kind, CountermeasureRejection::NoRaidPending);
        }

        let progress = ctx
            .controller
            .investigation()
            .map(|investigation| investigation.progress)
            .unwrap_or(0.0);
        let chance = (1.0 - progress / 100.0).clamp(0.0, 1.0);
        let succeeded = f64::from(ctx.rng.next_unit()) < chance;
        let mut report = CountermeasureReport::resolved(kind, succeeded);

        if succeeded {
            let forfeit = ctx.funds.balance().max(0.0) * self.config.flight.forfeit_fraction;
            ctx.funds.levy(forfeit);
            report.funds_delta = -forfeit;
            self.escaped = true;
        } else {
            ctx.controller.execute_raid(ctx.events);
        }

        self.finish(report, ctx)
    }

    pub fn settlement(&mut self, ctx: &mut CountermeasureContext<'_>) -> CountermeasureReport {
        let kind = CountermeasureKind::Settlement;
        let config = &self.config.settlement;
        let Some(progress) = ctx
            .controller
            .investigation()
            .map(|investigation| investigation.progress)
        else {
            return CountermeasureReport::rejected(kind, CountermeasureRejection::NoInvestigation);
        };
        if progress < config.min_progress || progress > config.max_progress {
            return CountermeasureReport::rejected(
                kind,
                CountermeasureRejection::OutsideSettlementBand { progress },
            );
        }

        let cost = config.cost_for(ctx.funds.balance());
        if let Err(rejection) = debit(ctx.funds, cost) {
            return CountermeasureReport::rejected(kind, rejection);
        }
        let mut report = CountermeasureReport::resolved(kind, true);
        report.funds_delta = -cost;
        self.settled = true;

        self.finish(report, ctx)
    }

    /// Pay for a counter-rumor campaign that lowers suspicion after a delay.
    pub fn counter_rumors(&mut self, ctx: &mut CountermeasureContext<'_>) -> CountermeasureReport {
        let kind = CountermeasureKind::CounterRumors;
        let config = self.relations.config();
        let level = ctx.ledger.level();
        if level < config.counter_rumor_min_level {
            return CountermeasureReport::rejected(kind, CountermeasureRejection::NoRumors { level });
        }
        let cost = config.counter_rumor_cost;
        if let Err(rejection) = debit(ctx.funds, cost) {
            return CountermeasureReport::rejected(kind, rejection);
        }
        self.relations.queue_counter_rumor(ctx.now);
        let mut report = CountermeasureReport::resolved(kind, true);
        report.funds_delta = -cost;

        self.finish(report, ctx)
    }

    pub fn city_donation(&mut self, ctx: &mut CountermeasureContext<'_>) -> CountermeasureReport {
        let config = self.relations.config();
        let (cost, relief, goodwill) = (
            config.donation_cost,
            config.donation_relief,
            config.donation_relations,
        );
        self.goodwill(CountermeasureKind::CityDonation, cost, relief, goodwill, ctx)
    }

    pub fn event_sponsorship(
        &mut self,
        ctx: &mut CountermeasureContext<'_>,
    ) -> CountermeasureReport {
        let config = self.relations.config();
        let (cost, relief, goodwill) = (
            config.sponsorship_cost,
            config.sponsorship_relief,
            config.sponsorship_relations,
        );
        self.goodwill(CountermeasureKind::EventSponsorship, cost, relief, goodwill, ctx)
    }

    /// Pay the first week of propaganda up front.
    pub fn start_propaganda(
        &mut self,
        ctx: &mut CountermeasureContext<'_>,
    ) -> CountermeasureReport {
        let kind = CountermeasureKind::StartPropaganda;
        if self.relations.propaganda_active() {
            return CountermeasureReport::rejected(kind, CountermeasureRejection::PropagandaActive);
        }
        let cost = self.relations.config().propaganda_cost;
        if let Err(rejection) = debit(ctx.funds, cost) {
            return CountermeasureReport::rejected(kind, rejection);
        }
        self.relations.start_propaganda(ctx.now);
        let mut report = CountermeasureReport::resolved(kind, true);
        report.funds_delta = -cost;

        self.finish(report, ctx)
    }

    pub fn stop_propaganda(&mut self, ctx: &mut CountermeasureContext<'_>) -> CountermeasureReport {
        let kind = CountermeasureKind::StopPropaganda;
        if !self.relations.propaganda_active() {
            return CountermeasureReport::rejected(
                kind,
                CountermeasureRejection::PropagandaInactive,
            );
        }
        self.relations.stop_propaganda();
        let report = CountermeasureReport::resolved(kind, true);

        self.finish(report, ctx)
    }

    fn goodwill(
        &mut self,
        kind: CountermeasureKind,
        cost: f64,
        relief: f64,
        goodwill: f64,
        ctx: &mut CountermeasureContext<'_>,
    ) -> CountermeasureReport {
        if let Err(rejection) = debit(ctx.funds, cost) {
            return CountermeasureReport::rejected(kind, rejection);
        }
        let mut report = CountermeasureReport::resolved(kind, true);
        report.funds_delta = -cost;
        report.suspicion_delta =
            ctx.ledger
                .apply_adjustment(-relief, LedgerSource::Countermeasure(kind), ctx.now);
        self.relations.improve(goodwill, ctx.ledger, ctx.events);

        self.finish(report, ctx)
    }

    fn finish(
        &mut self,
        report: CountermeasureReport,
        ctx: &mut CountermeasureContext<'_>,
    ) -> CountermeasureReport {
        self.stats.attempts += 1;
        if report.succeeded() {
            self.stats.successes += 1;
        }
        tracing::info!(
            target: "stealth::countermeasures",
            kind = report.kind.as_str(),
            outcome = ?report.outcome,
            funds_delta = report.funds_delta,
            suspicion_delta = report.suspicion_delta,
            progress_delta = report.progress_delta,
            "countermeasure.resolved"
        );
        ctx.events.push(EscalationEventKind::CountermeasureResolved {
            kind: report.kind,
            outcome: report.outcome,
            funds_delta: report.funds_delta,
            suspicion_delta: report.suspicion_delta,
            progress_delta: report.progress_delta,
        });
        report
    }
}

fn debit(funds: &mut dyn FundsService, cost: f64) -> Result<(), CountermeasureRejection> {
    let available = funds.balance();
    if available < cost {
        return Err(CountermeasureRejection::InsufficientFunds {
            required: cost,
            available,
        });
    }
    funds
        .debit(cost)
        .map_err(|_| CountermeasureRejection::InsufficientFunds {
            required: cost,
            available,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{InvestigationConfig, LedgerConfig, SECONDS_PER_HOUR},
        entropy::ScriptedEntropy,
        funds::Treasury,
        ledger::AuthorityTier,
    };

    const HOUR: f64 = SECONDS_PER_HOUR;

    struct Fixture {
        desk: CountermeasureDesk,
        controller: EscalationController,
        ledger: SuspicionLedger,
        funds: Treasury,
        rng: ScriptedEntropy,
        events: Vec<EscalationEventKind>,
        now: f64,
    }

    impl Fixture {
        fn new(funds: f64, draws: Vec<f32>) -> Self {
            Self {
                desk: CountermeasureDesk::new(CountermeasureConfig::default()),
                controller: EscalationController::new(InvestigationConfig::default()),
                ledger: SuspicionLedger::new(&LedgerConfig::default()),
                funds: Treasury::new(funds),
                rng: ScriptedEntropy::new(draws),
                events: Vec::new(),
                now: 0.0,
            }
        }

        fn open_case(&mut self, progress_hours: f64) {
            let mut rng = ScriptedEntropy::constant(0.0);
            self.controller.refresh_tier(
                AuthorityTier::Federal,
                100.0,
                self.now,
                false,
                &mut rng,
                &mut self.events,
            );
            self.controller
                .advance(progress_hours * HOUR, &mut rng, &mut self.events);
        }

        fn run(
            &mut self,
            attempt: fn(&mut CountermeasureDesk, &mut CountermeasureContext<'_>) -> CountermeasureReport,
        ) -> CountermeasureReport {
            let mut ctx = CountermeasureContext {
                now: self.now,
                controller: &mut self.controller,
                ledger: &mut self.ledger,
                funds: &mut self.funds,
                rng: &mut self.rng,
                events: &mut self.events,
            };
            attempt(&mut self.desk, &mut ctx)
        }

        fn progress(&self) -> f64 {
            self.controller
                .investigation()
                .map(|investigation| investigation.progress)
                .unwrap_or(0.0)
        }
    }

    #[test]
    fn bribery_without_case_lowers_ledger() {
        let mut fixture = Fixture::new(20_000.0, vec![0.1, 0.5, 0.0]);
        fixture.ledger.add_contribution(30.0, 1.0);
        let report = fixture.run(CountermeasureDesk::bribery);
        assert_eq!(report.outcome, CountermeasureOutcome::Succeeded);
        assert_eq!(report.funds_delta, -10_000.0);
        assert_eq!(report.suspicion_delta, -15.0);
        assert_eq!(fixture.funds.balance(), 10_000.0);
        assert_eq!(fixture.controller.bribery_ready_at(), 24.0 * HOUR);
    }

    #[test]
    fn bribery_success_sets_back_investigation() {
        let mut fixture = Fixture::new(20_000.0, vec![0.1, 0.0, 0.0]);
        fixture.open_case(80.0);
        assert_eq!(fixture.progress(), 40.0);
        let report = fixture.run(CountermeasureDesk::bribery);
        assert!(report.succeeded());
        assert_eq!(report.progress_delta, -15.0);
        assert_eq!(fixture.progress(), 25.0);
    }

    #[test]
    fn failed_bribery_still_costs_and_raises_suspicion() {
        let mut fixture = Fixture::new(20_000.0, vec![0.9, 1.0]);
        let report = fixture.run(CountermeasureDesk::bribery);
        assert_eq!(report.outcome, CountermeasureOutcome::Failed);
        assert_eq!(fixture.funds.balance(), 10_000.0);
        assert_eq!(fixture.ledger.level(), 20.0);
        assert!(fixture.controller.bribery_ready_at() > 95.0 * HOUR);

        let again = fixture.run(CountermeasureDesk::bribery);
        assert_eq!(again.outcome, CountermeasureOutcome::RejectedInvalidState);
        assert!(matches!(
            again.rejection,
            Some(CountermeasureRejection::CoolingDown { .. })
        ));
    }

    #[test]
    fn rejections_have_no_side_effects() {
        let mut fixture = Fixture::new(5_000.0, vec![0.0]);
        let report = fixture.run(CountermeasureDesk::bribery);
        assert_eq!(report.outcome, CountermeasureOutcome::RejectedInsufficientFunds);
        assert_eq!(fixture.funds.balance(), 5_000.0);
        assert_eq!(fixture.rng.consumed(), 0, "no draw before validation");
        assert!(fixture.events.is_empty());
        assert_eq!(fixture.desk.stats().attempts, 0);
    }

    #[test]
    fn tampering_is_one_shot() {
        let mut fixture = Fixture::new(40_000.0, vec![0.2]);
        fixture.open_case(10.0);
        let report = fixture.run(CountermeasureDesk::evidence_tampering);
        assert!(report.succeeded());
        let investigation = fixture.controller.investigation().copied().expect("case");
        assert_eq!(investigation.disruption_factor, 0.5);
        assert!(investigation.tampering_used);

        let again = fixture.run(CountermeasureDesk::evidence_tampering);
        assert_eq!(again.rejection, Some(CountermeasureRejection::TamperingUsed));
        assert_eq!(fixture.funds.balance(), 25_000.0);
    }

    #[test]
    fn failed_tampering_accelerates_case() {
        let mut fixture = Fixture::new(40_000.0, vec![0.7]);
        fixture.open_case(10.0);
        let report = fixture.run(CountermeasureDesk::evidence_tampering);
        assert_eq!(report.outcome, CountermeasureOutcome::Failed);
        assert_eq!(report.suspicion_delta, 25.0);
        let investigation = fixture.controller.investigation().copied().expect("case");
        assert_eq!(investigation.rate_multiplier, 1.5);
    }

    #[test]
    fn flight_requires_pending_raid() {
        let mut fixture = Fixture::new(10_000.0, vec![0.0]);
        fixture.open_case(10.0);
        let report = fixture.run(CountermeasureDesk::flight);
        assert_eq!(report.rejection, Some(CountermeasureRejection::NoRaidPending));
    }

    #[test]
    fn flight_at_full_progress_always_fails_into_raid() {
        let mut fixture = Fixture::new(10_000.0, vec![0.0]);
        fixture.open_case(200.0);
        assert!(fixture.controller.raid_countdown().is_some());
        let report = fixture.run(CountermeasureDesk::flight);
        assert_eq!(report.outcome, CountermeasureOutcome::Failed);
        assert!(fixture.controller.raid_executed());
        assert!(!fixture.desk.escaped());
    }

    #[test]
    fn flight_success_forfeits_share_of_funds() {
        let mut fixture = Fixture::new(100_000.0, vec![0.1]);
        fixture.open_case(200.0);
        if let Some(investigation) = fixture.controller.investigation_mut() {
            investigation.progress = 50.0;
        }
        let report = fixture.run(CountermeasureDesk::flight);
        assert!(report.succeeded());
        assert!(fixture.desk.escaped());
        assert!((fixture.funds.balance() - 30_000.0).abs() < 1e-6);
    }

    #[test]
    fn settlement_band_and_cost() {
        let mut fixture = Fixture::new(100_000.0, vec![]);
        fixture.open_case(40.0);
        let early = fixture.run(CountermeasureDesk::settlement);
        assert_eq!(early.outcome, CountermeasureOutcome::RejectedInvalidState);
        assert_eq!(fixture.funds.balance(), 100_000.0);

        fixture.open_case(60.0);
        assert_eq!(fixture.progress(), 50.0);
        let report = fixture.run(CountermeasureDesk::settlement);
        assert!(report.succeeded());
        assert!((report.funds_delta + 70_000.0).abs() < 1e-6);
        assert!(fixture.desk.settled());
    }

    #[test]
    fn settlement_needs_minimum_cost_in_hand() {
        let mut fixture = Fixture::new(20_000.0, vec![]);
        fixture.open_case(100.0);
        let report = fixture.run(CountermeasureDesk::settlement);
        assert_eq!(report.outcome, CountermeasureOutcome::RejectedInsufficientFunds);
        assert!(!fixture.desk.settled());
    }
    #[test]
    fn counter_rumors_need_circulating_rumors() {
        let mut fixture = Fixture::new(5_000.0, vec![]);
        fixture.ledger.add_contribution(12.0, 1.0);
        let early = fixture.run(CountermeasureDesk::counter_rumors);
        assert_eq!(early.rejection, Some(CountermeasureRejection::NoRumors { level: 12.0 }));
        assert_eq!(fixture.funds.balance(), 5_000.0);

        fixture.ledger.add_contribution(12.0, 1.0);
        let report = fixture.run(CountermeasureDesk::counter_rumors);
        assert!(report.succeeded());
        assert_eq!(report.funds_delta, -1_000.0);
        assert_eq!(report.suspicion_delta, 0.0, "relief arrives later");
        assert_eq!(fixture.desk.relations().state().pending_counters, vec![72.0 * HOUR]);
    }

    #[test]
    fn sponsorship_after_donation_earns_good_neighbor() {
        let mut fixture = Fixture::new(20_000.0, vec![]);
        fixture.ledger.add_contribution(30.0, 1.0);

        let donation = fixture.run(CountermeasureDesk::city_donation);
        assert_eq!(donation.suspicion_delta, -3.0);
        assert_eq!(fixture.desk.relations().state().community_relations, 55.0);

        let sponsorship = fixture.run(CountermeasureDesk::event_sponsorship);
        assert_eq!(sponsorship.suspicion_delta, -8.0);
        assert_eq!(fixture.ledger.level(), 19.0);
        assert_eq!(fixture.funds.balance(), 5_000.0);
        assert!(fixture.desk.relations().state().good_neighbor);
        assert!(fixture.ledger.passive_relief_per_hour() > 0.0);
        assert!(fixture
            .events
            .iter()
            .any(|event| matches!(event, EscalationEventKind::GoodNeighborEarned { .. })));

        let broke = fixture.run(CountermeasureDesk::event_sponsorship);
        assert_eq!(broke.outcome, CountermeasureOutcome::RejectedInsufficientFunds);
        assert_eq!(fixture.desk.stats().attempts, 2);
    }

    #[test]
    fn propaganda_starts_once_and_stops() {
        let mut fixture = Fixture::new(5_000.0, vec![]);
        let stop_idle = fixture.run(CountermeasureDesk::stop_propaganda);
        assert_eq!(stop_idle.rejection, Some(CountermeasureRejection::PropagandaInactive));

        let start = fixture.run(CountermeasureDesk::start_propaganda);
        assert!(start.succeeded());
        assert_eq!(fixture.funds.balance(), 3_000.0);
        let again = fixture.run(CountermeasureDesk::start_propaganda);
        assert_eq!(again.rejection, Some(CountermeasureRejection::PropagandaActive));
        assert_eq!(fixture.funds.balance(), 3_000.0);

        let stop = fixture.run(CountermeasureDesk::stop_propaganda);
        assert!(stop.succeeded());
        assert!(!fixture.desk.relations().propaganda_active());
    }
}
