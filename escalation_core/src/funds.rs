use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::collaborators::{FundsError, FundsService};

/// Simple cash account used by the ECS host and tests.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Treasury {
    balance: f64,
}

impl Treasury {
    pub fn new(balance: f64) -> Self {
        Self { balance }
    }
}

impl FundsService for Treasury {
    fn balance(&self) -> f64 {
        self.balance
    }

    fn debit(&mut self, amount: f64) -> Result<(), FundsError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(FundsError::InvalidAmount(amount));
        }
        if self.balance < amount {
            return Err(FundsError::Insufficient {
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    fn credit(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.balance += amount;
        }
    }

    fn levy(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.balance -= amount;
        }
    }
}
