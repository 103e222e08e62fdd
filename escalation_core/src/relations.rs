//! Community relations and public-relations campaigns.
//!
//! Campaigns are bought through the countermeasure desk; this module owns the standing
//! effects they leave behind: delayed counter-rumors, recurring propaganda payments and
//! the good-neighbor relief.

use serde::{Deserialize, Serialize};

use crate::{
    collaborators::FundsService,
    config::{PublicRelationsConfig, SECONDS_PER_HOUR},
    events::EscalationEventKind,
    ledger::{LedgerSource, SuspicionLedger},
};

pub const MAX_RELATIONS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationsStanding {
    Hostile,
    Suspicious,
    Neutral,
    GoodNeighbor,
    Beloved,
}

impl RelationsStanding {
    pub fn classify(relations: f64) -> Self {
        match relations {
            r if r >= 80.0 => RelationsStanding::Beloved,
            r if r >= 70.0 => RelationsStanding::GoodNeighbor,
            r if r >= 50.0 => RelationsStanding::Neutral,
            r if r >= 30.0 => RelationsStanding::Suspicious,
            _ => RelationsStanding::Hostile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicRelationsState {
    /// Community standing in `[0, 100]`.
    pub community_relations: f64,
    pub good_neighbor: bool,
    /// Next propaganda payment; `None` while no campaign runs.
    pub propaganda_due_at: Option<f64>,
    /// Simulated times at which purchased counter-rumors take effect.
    pub pending_counters: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct PublicRelations {
    config: PublicRelationsConfig,
    state: PublicRelationsState,
}

impl PublicRelations {
    pub fn new(config: PublicRelationsConfig) -> Self {
        let state = PublicRelationsState {
            community_relations: config.starting_relations.clamp(0.0, MAX_RELATIONS),
            good_neighbor: false,
            propaganda_due_at: None,
            pending_counters: Vec::new(),
        };
        Self { config, state }
    }

    pub fn config(&self) -> &PublicRelationsConfig {
        &self.config
    }

    pub fn state(&self) -> &PublicRelationsState {
        &self.state
    }

    pub fn standing(&self) -> RelationsStanding {
        RelationsStanding::classify(self.state.community_relations)
    }

    pub fn propaganda_active(&self) -> bool {
        self.state.propaganda_due_at.is_some()
    }

    /// Multiplier on new suspicion. Propaganda stops working once the level reaches its cap.
    pub fn growth_modifier(&self, level: f64) -> f64 {
        if self.propaganda_active() && level < self.config.propaganda_max_level {
            self.config.propaganda_growth_modifier
        } else {
            1.0
        }
    }

    pub fn passive_relief_per_hour(&self) -> f64 {
        if self.state.good_neighbor {
            self.config.good_neighbor_relief_per_day / 24.0
        } else {
            0.0
        }
    }

    pub(crate) fn queue_counter_rumor(&mut self, now: f64) {
        let delay = f64::from(self.config.counter_rumor_delay_hours) * SECONDS_PER_HOUR;
        self.state.pending_counters.push(now + delay);
    }

    pub(crate) fn start_propaganda(&mut self, now: f64) {
        let period = f64::from(self.config.propaganda_period_hours) * SECONDS_PER_HOUR;
        self.state.propaganda_due_at = Some(now + period);
    }

    pub(crate) fn stop_propaganda(&mut self) {
        self.state.propaganda_due_at = None;
    }

    /// Raise relations; crossing the good-neighbor threshold switches on passive relief.
    pub(crate) fn improve(
        &mut self,
        amount: f64,
        ledger: &mut SuspicionLedger,
        events: &mut Vec<EscalationEventKind>,
    ) {
        let relations = (self.state.community_relations + amount.max(0.0)).min(MAX_RELATIONS);
        self.state.community_relations = relations;
        if self.state.good_neighbor || relations < self.config.good_neighbor_threshold {
            return;
        }
        self.state.good_neighbor = true;
        ledger.set_passive_relief(self.passive_relief_per_hour());
        tracing::info!(target: "stealth::relations", relations, "relations.good_neighbor");
        events.push(EscalationEventKind::GoodNeighborEarned { relations });
    }

    /// Land due counter-rumors and settle any propaganda payment that fell due.
    pub fn tick(
        &mut self,
        now: f64,
        ledger: &mut SuspicionLedger,
        funds: &mut dyn FundsService,
        events: &mut Vec<EscalationEventKind>,
    ) {
        let relief = self.config.counter_rumor_relief;
        let mut landed = 0;
        self.state.pending_counters.retain(|&due| {
            if due <= now {
                landed += 1;
                false
            } else {
                true
            }
        });
        for _ in 0..landed {
            let applied = ledger.apply_adjustment(-relief, LedgerSource::PublicRelations, now);
            tracing::info!(
                target: "stealth::relations",
                suspicion_delta = applied,
                "relations.counter_rumor_landed"
            );
            events.push(EscalationEventKind::CounterRumorLanded {
                suspicion_delta: applied,
            });
        }

        let Some(due) = self.state.propaganda_due_at else {
            return;
        };
        if now < due {
            return;
        }
        let cost = self.config.propaganda_cost;
        if funds.balance() >= cost && funds.debit(cost).is_ok() {
            let period = f64::from(self.config.propaganda_period_hours) * SECONDS_PER_HOUR;
            self.state.propaganda_due_at = Some(now + period);
            tracing::debug!(target: "stealth::relations", cost, "relations.propaganda_paid");
            events.push(EscalationEventKind::PropagandaPaid { cost });
        } else {
            self.state.propaganda_due_at = None;
            tracing::info!(target: "stealth::relations", "relations.propaganda_lapsed");
            events.push(EscalationEventKind::PropagandaLapsed);
        }
    }
}
