//! Campaign endings.
//!
//! Every true terminal condition is gathered into one set each tick; the highest priority
//! condition becomes the ending, and the ending never changes afterwards.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::{EndingConfig, SECONDS_PER_HOUR};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TerminalConditions: u8 {
        const RAID_EXECUTED = 1 << 0;
        const CRITICAL_AUDIT = 1 << 1;
        const BANKRUPT = 1 << 2;
        const ESCAPED = 1 << 3;
        const SETTLED = 1 << 4;
        const LEGITIMATE_SUCCESS = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndingKind {
    FederalRaid,
    CriticalAuditFailure,
    Bankruptcy,
    Escaped,
    Settled,
    LegitimateSuccess,
}

impl EndingKind {
    /// Highest priority first.
    pub const PRIORITY: [EndingKind; 6] = [
        EndingKind::FederalRaid,
        EndingKind::CriticalAuditFailure,
        EndingKind::Bankruptcy,
        EndingKind::Escaped,
        EndingKind::Settled,
        EndingKind::LegitimateSuccess,
    ];

    pub fn condition(self) -> TerminalConditions {
        match self {
            EndingKind::FederalRaid => TerminalConditions::RAID_EXECUTED,
            EndingKind::CriticalAuditFailure => TerminalConditions::CRITICAL_AUDIT,
            EndingKind::Bankruptcy => TerminalConditions::BANKRUPT,
            EndingKind::Escaped => TerminalConditions::ESCAPED,
            EndingKind::Settled => TerminalConditions::SETTLED,
            EndingKind::LegitimateSuccess => TerminalConditions::LEGITIMATE_SUCCESS,
        }
    }

    pub fn select(conditions: TerminalConditions) -> Option<EndingKind> {
        Self::PRIORITY
            .into_iter()
            .find(|kind| conditions.contains(kind.condition()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EndingKind::FederalRaid => "federal_raid",
            EndingKind::CriticalAuditFailure => "critical_audit_failure",
            EndingKind::Bankruptcy => "bankruptcy",
            EndingKind::Escaped => "escaped",
            EndingKind::Settled => "settled",
            EndingKind::LegitimateSuccess => "legitimate_success",
        }
    }

    pub fn is_victory(self) -> bool {
        matches!(self, EndingKind::LegitimateSuccess)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EndingSummary {
    pub tier_escalations: u32,
    pub countermeasure_attempts: u32,
    pub countermeasure_successes: u32,
    pub investigation_progress: f64,
    pub ledger_level: f64,
    pub funds: f64,
    pub elapsed: f64,
    pub audits_passed: u32,
    pub audits_failed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ending {
    pub kind: EndingKind,
    pub conditions: TerminalConditions,
    pub tick: u64,
    pub at: f64,
    pub summary: EndingSummary,
}

/// State the resolver inspects each tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalInputs {
    pub raid_executed: bool,
    pub critical_audit: bool,
    pub escaped: bool,
    pub settled: bool,
    pub funds: f64,
    pub ledger_level: f64,
    pub elapsed: f64,
    pub investigation_active: bool,
    pub raid_pending: bool,
}

#[derive(Debug, Clone)]
pub struct EndingResolver {
    config: EndingConfig,
    ending: Option<Ending>,
}

impl EndingResolver {
    pub fn new(config: EndingConfig) -> Self {
        Self {
            config,
            ending: None,
        }
    }

    pub fn ending(&self) -> Option<&Ending> {
        self.ending.as_ref()
    }

    pub fn is_ended(&self) -> bool {
        self.ending.is_some()
    }

    pub fn collect(&self, inputs: &TerminalInputs) -> TerminalConditions {
        let mut conditions = TerminalConditions::empty();
        conditions.set(TerminalConditions::RAID_EXECUTED, inputs.raid_executed);
        conditions.set(TerminalConditions::CRITICAL_AUDIT, inputs.critical_audit);
        conditions.set(
            TerminalConditions::BANKRUPT,
            inputs.funds < self.config.bankruptcy_floor,
        );
        conditions.set(TerminalConditions::ESCAPED, inputs.escaped);
        conditions.set(TerminalConditions::SETTLED, inputs.settled);
        conditions.set(
            TerminalConditions::LEGITIMATE_SUCCESS,
            self.legitimate_success(inputs),
        );
        conditions
    }

    /// Set the ending from the current inputs. Returns it only on the call that sets it.
    pub fn resolve(
        &mut self,
        inputs: &TerminalInputs,
        summary: EndingSummary,
        tick: u64,
        at: f64,
    ) -> Option<Ending> {
        if self.ending.is_some() {
            return None;
        }
        let conditions = self.collect(inputs);
        let kind = EndingKind::select(conditions)?;
        let ending = Ending {
            kind,
            conditions,
            tick,
            at,
            summary,
        };
        self.ending = Some(ending);
        tracing::info!(
            target: "stealth::ending",
            ending = kind.as_str(),
            conditions = ?conditions,
            tick,
            "ending.set"
        );
        Some(ending)
    }

    fn legitimate_success(&self, inputs: &TerminalInputs) -> bool {
        let goal = &self.config.legitimate_success;
        goal.enabled
            && inputs.elapsed >= goal.campaign_hours as f64 * SECONDS_PER_HOUR
            && inputs.ledger_level < goal.max_level
            && inputs.funds >= goal.min_funds
            && !inputs.investigation_active
            && !inputs.raid_pending
            && !inputs.raid_executed
    }
}
