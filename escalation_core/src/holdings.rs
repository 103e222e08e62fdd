//! Material stock split by provenance.

use std::collections::BTreeMap;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::collaborators::HoldingsService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Plastic,
    Metal,
    Glass,
    Paper,
    Electronics,
    Copper,
    Rubber,
}

impl MaterialKind {
    pub fn unit_value(self) -> f32 {
        match self {
            MaterialKind::Plastic => 1.0,
            MaterialKind::Metal => 2.0,
            MaterialKind::Glass => 1.5,
            MaterialKind::Paper => 0.5,
            MaterialKind::Electronics => 10.0,
            MaterialKind::Copper => 15.0,
            MaterialKind::Rubber => 2.0,
        }
    }

    /// Total holdings above which the material draws attention on its own.
    pub fn suspicion_threshold(self) -> Option<f32> {
        match self {
            MaterialKind::Copper => Some(500.0),
            MaterialKind::Electronics => Some(300.0),
            MaterialKind::Metal => Some(1_000.0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceSplit {
    pub lawful: f32,
    pub unlawful: f32,
}

impl ProvenanceSplit {
    pub fn total(&self) -> f32 {
        self.lawful + self.unlawful
    }
}

#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoldingsInventory {
    materials: BTreeMap<MaterialKind, ProvenanceSplit>,
    /// Per-material unit value overrides; materials without one use their catalogue value.
    #[serde(default)]
    unit_values: BTreeMap<MaterialKind, f32>,
}

impl HoldingsInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_lawful(&mut self, material: MaterialKind, quantity: f32) {
        let entry = self.materials.entry(material).or_default();
        entry.lawful = (entry.lawful + quantity).max(0.0);
    }

    pub fn add_unlawful(&mut self, material: MaterialKind, quantity: f32) {
        let entry = self.materials.entry(material).or_default();
        entry.unlawful = (entry.unlawful + quantity).max(0.0);
    }

    /// Remove stock, unlawful first. Returns how much was actually removed.
    pub fn remove(&mut self, material: MaterialKind, quantity: f32) -> f32 {
        let Some(entry) = self.materials.get_mut(&material) else {
            return 0.0;
        };
        let from_unlawful = entry.unlawful.min(quantity);
        entry.unlawful -= from_unlawful;
        let from_lawful = entry.lawful.min(quantity - from_unlawful);
        entry.lawful -= from_lawful;
        from_unlawful + from_lawful
    }

    pub fn set_unit_value(&mut self, material: MaterialKind, value: f32) {
        self.unit_values.insert(material, value);
    }

    pub fn split(&self, material: MaterialKind) -> ProvenanceSplit {
        self.materials.get(&material).copied().unwrap_or_default()
    }

    fn unit_value(&self, material: MaterialKind) -> f32 {
        self.unit_values
            .get(&material)
            .copied()
            .unwrap_or_else(|| material.unit_value())
    }
}

impl HoldingsService for HoldingsInventory {
    fn unlawful_quantity(&self) -> f32 {
        self.materials.values().map(|split| split.unlawful).sum()
    }

    fn unlawful_value(&self) -> f32 {
        self.materials
            .iter()
            .map(|(material, split)| split.unlawful * self.unit_value(*material))
            .sum()
    }

    fn suspicious_materials(&self) -> Vec<MaterialKind> {
        self.materials
            .iter()
            .filter(|(material, split)| {
                material
                    .suspicion_threshold()
                    .is_some_and(|threshold| split.total() > threshold)
            })
            .map(|(material, _)| *material)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_only_unlawful_stock() {
        let mut inventory = HoldingsInventory::new();
        inventory.add_lawful(MaterialKind::Copper, 100.0);
        inventory.add_unlawful(MaterialKind::Copper, 10.0);
        inventory.add_unlawful(MaterialKind::Plastic, 20.0);
        assert_eq!(inventory.unlawful_quantity(), 30.0);
        assert_eq!(inventory.unlawful_value(), 10.0 * 15.0 + 20.0);
    }

    #[test]
    fn suspicious_flag_counts_lawful_stock_and_is_strict() {
        let mut inventory = HoldingsInventory::new();
        inventory.add_lawful(MaterialKind::Electronics, 300.0);
        assert!(inventory.suspicious_materials().is_empty());
        inventory.add_lawful(MaterialKind::Electronics, 1.0);
        assert_eq!(inventory.suspicious_materials(), vec![MaterialKind::Electronics]);
    }

    #[test]
    fn unit_value_override_applies() {
        let mut inventory = HoldingsInventory::new();
        inventory.add_unlawful(MaterialKind::Glass, 10.0);
        inventory.set_unit_value(MaterialKind::Glass, 3.0);
        assert_eq!(inventory.unlawful_value(), 30.0);
    }

    #[test]
    fn removal_drains_unlawful_first() {
        let mut inventory = HoldingsInventory::new();
        inventory.add_lawful(MaterialKind::Metal, 5.0);
        inventory.add_unlawful(MaterialKind::Metal, 5.0);
        assert_eq!(inventory.remove(MaterialKind::Metal, 7.0), 7.0);
        let split = inventory.split(MaterialKind::Metal);
        assert_eq!(split.unlawful, 0.0);
        assert_eq!(split.lawful, 3.0);
    }
}
