//! Contracts the engine requires from the surrounding game.

use thiserror::Error;

use crate::{evidence::ObservationCandidate, holdings::MaterialKind};

/// Line-of-sight resolution. Yields this tick's sightings of the actor.
pub trait LineOfSight {
    fn candidates(&mut self, now: f64) -> Vec<ObservationCandidate>;
}

/// Read-only view of the actor's stock, split by provenance.
pub trait HoldingsService {
    fn unlawful_quantity(&self) -> f32;
    fn unlawful_value(&self) -> f32;
    /// Materials whose total holdings exceed their suspicion threshold.
    fn suspicious_materials(&self) -> Vec<MaterialKind>;
}

pub trait FundsService {
    fn balance(&self) -> f64;
    fn debit(&mut self, amount: f64) -> Result<(), FundsError>;
    fn credit(&mut self, amount: f64);
    /// Unconditional charge; may leave the balance negative.
    fn levy(&mut self, amount: f64);
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FundsError {
    #[error("insufficient funds: balance {balance:.2}, requested {requested:.2}")]
    Insufficient { balance: f64, requested: f64 },
    #[error("invalid amount {0}")]
    InvalidAmount(f64),
}

/// Borrowed collaborators for one call into the engine.
pub struct Collaborators<'a> {
    pub sight: &'a mut dyn LineOfSight,
    pub holdings: &'a dyn HoldingsService,
    pub funds: &'a mut dyn FundsService,
}

impl<'a> Collaborators<'a> {
    pub fn new(
        sight: &'a mut dyn LineOfSight,
        holdings: &'a dyn HoldingsService,
        funds: &'a mut dyn FundsService,
    ) -> Self {
        Self {
            sight,
            holdings,
            funds,
        }
    }
}

/// A line of sight that never sees anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unobserved;

impl LineOfSight for Unobserved {
    fn candidates(&mut self, _now: f64) -> Vec<ObservationCandidate> {
        Vec::new()
    }
}
