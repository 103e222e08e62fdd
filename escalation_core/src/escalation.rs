//! Authority tier tracking, federal investigations and raids.

use serde::{Deserialize, Serialize};

use crate::{
    config::{InvestigationConfig, SECONDS_PER_HOUR},
    entropy::RandomSource,
    events::EscalationEventKind,
    ledger::AuthorityTier,
};

pub const MAX_PROGRESS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestigationKind {
    Surveillance,
    FinancialAudit,
    Wiretap,
    Undercover,
}

impl InvestigationKind {
    const STANDARD: [InvestigationKind; 3] = [
        InvestigationKind::Surveillance,
        InvestigationKind::FinancialAudit,
        InvestigationKind::Wiretap,
    ];

    const WITH_UNDERCOVER: [InvestigationKind; 4] = [
        InvestigationKind::Surveillance,
        InvestigationKind::FinancialAudit,
        InvestigationKind::Wiretap,
        InvestigationKind::Undercover,
    ];

    /// Undercover work is only opened once an audit has already failed.
    pub fn choose(rng: &mut dyn RandomSource, audit_failed: bool) -> Self {
        if audit_failed {
            Self::WITH_UNDERCOVER[rng.pick(Self::WITH_UNDERCOVER.len())]
        } else {
            Self::STANDARD[rng.pick(Self::STANDARD.len())]
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InvestigationKind::Surveillance => "surveillance",
            InvestigationKind::FinancialAudit => "financial_audit",
            InvestigationKind::Wiretap => "wiretap",
            InvestigationKind::Undercover => "undercover",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    pub kind: InvestigationKind,
    /// Case progress in `[0, 100]`.
    pub progress: f64,
    /// Share of progress lost to disrupted evidence, `[0, 1]`.
    pub disruption_factor: f64,
    pub rate_multiplier: f64,
    pub tampering_used: bool,
    pub completed: bool,
    pub opened_at: f64,
}

impl Investigation {
    fn open(kind: InvestigationKind, now: f64) -> Self {
        Self {
            kind,
            progress: 0.0,
            disruption_factor: 0.0,
            rate_multiplier: 1.0,
            tampering_used: false,
            completed: false,
            opened_at: now,
        }
    }

    /// Lower progress by up to `amount`. Returns the (non-positive) change.
    pub fn set_back(&mut self, amount: f64) -> f64 {
        let before = self.progress;
        self.progress = (self.progress - amount.max(0.0)).max(0.0);
        self.progress - before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum InvestigationState {
    #[default]
    Inactive,
    Active(Investigation),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum RaidState {
    #[default]
    NotScheduled,
    Countdown {
        remaining: f64,
    },
    Executed,
}

#[derive(Debug, Clone)]
pub struct EscalationController {
    config: InvestigationConfig,
    tier: AuthorityTier,
    investigation: InvestigationState,
    raid: RaidState,
    escalations: u32,
    bribery_ready_at: f64,
}

impl EscalationController {
    pub fn new(config: InvestigationConfig) -> Self {
        Self {
            config,
            tier: AuthorityTier::Local,
            investigation: InvestigationState::Inactive,
            raid: RaidState::NotScheduled,
            escalations: 0,
            bribery_ready_at: 0.0,
        }
    }

    pub fn tier(&self) -> AuthorityTier {
        self.tier
    }

    pub fn investigation(&self) -> Option<&Investigation> {
        match &self.investigation {
            InvestigationState::Active(investigation) => Some(investigation),
            InvestigationState::Inactive => None,
        }
    }

    pub fn investigation_state(&self) -> InvestigationState {
        self.investigation
    }

    pub(crate) fn investigation_mut(&mut self) -> Option<&mut Investigation> {
        match &mut self.investigation {
            InvestigationState::Active(investigation) => Some(investigation),
            InvestigationState::Inactive => None,
        }
    }

    pub fn raid(&self) -> RaidState {
        self.raid
    }

    pub fn raid_countdown(&self) -> Option<f64> {
        match self.raid {
            RaidState::Countdown { remaining } => Some(remaining),
            _ => None,
        }
    }

    pub fn raid_executed(&self) -> bool {
        matches!(self.raid, RaidState::Executed)
    }

    /// Upward tier crossings since the campaign began.
    pub fn escalations(&self) -> u32 {
        self.escalations
    }

    pub fn bribery_ready_at(&self) -> f64 {
        self.bribery_ready_at
    }

    pub(crate) fn set_bribery_ready_at(&mut self, at: f64) {
        self.bribery_ready_at = at;
    }

    /// Relabel the tier from the current ledger tier, then open an investigation if
    /// the label is `Federal` and no case exists yet. Dropping back never closes one.
    pub fn refresh_tier(
        &mut self,
        tier: AuthorityTier,
        level: f64,
        now: f64,
        audit_failed: bool,
        rng: &mut dyn RandomSource,
        events: &mut Vec<EscalationEventKind>,
    ) {
        self.relabel_tier(tier, level, events);
        if self.tier == AuthorityTier::Federal && self.investigation().is_none() {
            let kind = InvestigationKind::choose(rng, audit_failed);
            self.investigation = InvestigationState::Active(Investigation::open(kind, now));
            tracing::info!(
                target: "stealth::escalation",
                kind = kind.as_str(),
                "investigation.started"
            );
            events.push(EscalationEventKind::InvestigationStarted { kind });
        }
    }

    /// Relabel the tier and publish the crossing, without touching investigations.
    pub(crate) fn relabel_tier(
        &mut self,
        tier: AuthorityTier,
        level: f64,
        events: &mut Vec<EscalationEventKind>,
    ) {
        let previous = self.tier;
        if tier == previous {
            return;
        }
        self.tier = tier;

        if tier > previous {
            self.escalations += 1;
            tracing::info!(
                target: "stealth::escalation",
                from = previous.as_str(),
                to = tier.as_str(),
                level,
                "tier.escalated"
            );
            events.push(EscalationEventKind::TierEscalated {
                from: previous,
                to: tier,
                level,
            });
        } else {
            tracing::info!(
                target: "stealth::escalation",
                from = previous.as_str(),
                to = tier.as_str(),
                level,
                "tier.deescalated"
            );
            events.push(EscalationEventKind::TierDeescalated {
                from: previous,
                to: tier,
                level,
            });
        }
    }

    /// Count the raid down, then accrue investigation progress.
    pub fn advance(
        &mut self,
        dt: f64,
        rng: &mut dyn RandomSource,
        events: &mut Vec<EscalationEventKind>,
    ) {
        if dt <= 0.0 {
            return;
        }

        if let RaidState::Countdown { remaining } = self.raid {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                self.execute_raid(events);
            } else {
                self.raid = RaidState::Countdown { remaining };
            }
        }

        let per_hour = self.config.progress_per_hour;
        let Some(investigation) = self.investigation_mut() else {
            return;
        };
        if investigation.completed {
            return;
        }
        let rate = per_hour
            * investigation.rate_multiplier
            * (1.0 - investigation.disruption_factor).clamp(0.0, 1.0);
        let gained = rate * (dt / SECONDS_PER_HOUR);
        investigation.progress = (investigation.progress + gained).min(MAX_PROGRESS);
        if investigation.progress < MAX_PROGRESS {
            return;
        }

        investigation.completed = true;
        tracing::info!(target: "stealth::escalation", "investigation.completed");
        events.push(EscalationEventKind::InvestigationCompleted);

        let (min, max) = self.config.raid_warning_hours.in_seconds();
        let countdown = rng.range_f64(min, max);
        self.raid = RaidState::Countdown {
            remaining: countdown,
        };
        tracing::warn!(
            target: "stealth::escalation",
            countdown_secs = countdown,
            "raid.scheduled"
        );
        events.push(EscalationEventKind::RaidScheduled { countdown });
    }

    pub(crate) fn execute_raid(&mut self, events: &mut Vec<EscalationEventKind>) {
        if self.raid_executed() {
            return;
        }
        self.raid = RaidState::Executed;
        tracing::warn!(target: "stealth::escalation", "raid.executed");
        events.push(EscalationEventKind::RaidExecuted);
    }
}
