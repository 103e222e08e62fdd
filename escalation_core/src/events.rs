//! Observable escalation events.
//!
//! The engine fans each event out to crossbeam subscribers and keeps a bounded backlog
//! that the ECS host drains into a Bevy [`Event`] stream.

use std::collections::VecDeque;

use bevy::prelude::Event;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::{
    audit::AuditOutcome,
    countermeasures::{CountermeasureKind, CountermeasureOutcome},
    ending::{EndingKind, EndingSummary},
    escalation::InvestigationKind,
    ledger::AuthorityTier,
};

#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationEvent {
    pub tick: u64,
    /// Simulated seconds at which the event happened.
    pub at: f64,
    pub kind: EscalationEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EscalationEventKind {
    TierEscalated {
        from: AuthorityTier,
        to: AuthorityTier,
        level: f64,
    },
    TierDeescalated {
        from: AuthorityTier,
        to: AuthorityTier,
        level: f64,
    },
    AuditScheduled {
        countdown: f64,
        mandatory: bool,
    },
    AuditStarted {
        duration: f64,
    },
    AuditResolved {
        outcome: AuditOutcome,
        fine: f64,
        suspicion_delta: f64,
    },
    ThroughputPenaltyImposed {
        multiplier: f32,
        until: f64,
    },
    InvestigationStarted {
        kind: InvestigationKind,
    },
    InvestigationCompleted,
    RaidScheduled {
        countdown: f64,
    },
    RaidExecuted,
    CountermeasureResolved {
        kind: CountermeasureKind,
        outcome: CountermeasureOutcome,
        funds_delta: f64,
        suspicion_delta: f64,
        progress_delta: f64,
    },
    CounterRumorLanded {
        suspicion_delta: f64,
    },
    PropagandaPaid {
        cost: f64,
    },
    PropagandaLapsed,
    GoodNeighborEarned {
        relations: f64,
    },
    EndingSet {
        ending: EndingKind,
        summary: EndingSummary,
    },
}

impl EscalationEventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EscalationEventKind::TierEscalated { .. } => "tier.escalated",
            EscalationEventKind::TierDeescalated { .. } => "tier.deescalated",
            EscalationEventKind::AuditScheduled { .. } => "audit.scheduled",
            EscalationEventKind::AuditStarted { .. } => "audit.started",
            EscalationEventKind::AuditResolved { .. } => "audit.resolved",
            EscalationEventKind::ThroughputPenaltyImposed { .. } => "throughput.penalty",
            EscalationEventKind::InvestigationStarted { .. } => "investigation.started",
            EscalationEventKind::InvestigationCompleted => "investigation.completed",
            EscalationEventKind::RaidScheduled { .. } => "raid.scheduled",
            EscalationEventKind::RaidExecuted => "raid.executed",
            EscalationEventKind::CountermeasureResolved { .. } => "countermeasure.resolved",
            EscalationEventKind::CounterRumorLanded { .. } => "relations.counter_rumor_landed",
            EscalationEventKind::PropagandaPaid { .. } => "relations.propaganda_paid",
            EscalationEventKind::PropagandaLapsed => "relations.propaganda_lapsed",
            EscalationEventKind::GoodNeighborEarned { .. } => "relations.good_neighbor",
            EscalationEventKind::EndingSet { .. } => "ending.set",
        }
    }
}

/// Events kept for [`EventBus::drain_backlog`] before the oldest are dropped.
pub const DEFAULT_BACKLOG_CAPACITY: usize = 1024;

/// Fan-out for engine events.
#[derive(Debug)]
pub struct EventBus {
    subscribers: Vec<Sender<EscalationEvent>>,
    backlog: VecDeque<EscalationEvent>,
    backlog_capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_backlog_capacity(DEFAULT_BACKLOG_CAPACITY)
    }
}

impl EventBus {
    /// A capacity of zero disables the backlog; subscribers still receive everything.
    pub fn with_backlog_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            backlog: VecDeque::with_capacity(capacity.min(DEFAULT_BACKLOG_CAPACITY)),
            backlog_capacity: capacity,
        }
    }

    pub fn backlog_capacity(&self) -> usize {
        self.backlog_capacity
    }
    pub fn subscribe(&mut self) -> Receiver<EscalationEvent> {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        receiver
    }

    pub fn publish(&mut self, event: EscalationEvent) {
        // Dropped receivers are pruned on the next send.
        self.subscribers
            .retain(|sender| sender.send(event.clone()).is_ok());
        if self.backlog_capacity == 0 {
            return;
        }
        if self.backlog.len() == self.backlog_capacity {
            self.backlog.pop_front();
        }
        self.backlog.push_back(event);
    }

    /// Oldest first.
    pub fn drain_backlog(&mut self) -> Vec<EscalationEvent> {
        self.backlog.drain(..).collect()
    }

    pub fn backlog(&self) -> impl Iterator<Item = &EscalationEvent> + '_ {
        self.backlog.iter()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }
}
