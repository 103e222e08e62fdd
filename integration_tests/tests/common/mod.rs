#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use escalation_core::{
    Collaborators, EscalationEngine, HoldingsInventory, LineOfSight, ObservationCandidate,
    ObserverClass, TickReport, Treasury, SECONDS_PER_HOUR,
};

static INIT: Once = Once::new();

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("test_escalation_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test escalation config at {}",
            config_path.display()
        );

        std::env::set_var("ESCALATION_CONFIG_PATH", &config_path);
    });
}

pub const HOUR: f64 = SECONDS_PER_HOUR;

/// Line of sight that hands out a queued batch once.
#[derive(Default)]
pub struct Sightings(pub Vec<ObservationCandidate>);

impl LineOfSight for Sightings {
    fn candidates(&mut self, _now: f64) -> Vec<ObservationCandidate> {
        std::mem::take(&mut self.0)
    }
}

pub fn sensor_hit() -> ObservationCandidate {
    ObservationCandidate::new(ObserverClass::FixedSensor, 0.0, 1.0, 0.0)
}

/// Collaborators owned by a test, threaded into every engine call.
pub struct World {
    pub sight: Sightings,
    pub holdings: HoldingsInventory,
    pub funds: Treasury,
}

impl World {
    pub fn new(funds: f64) -> Self {
        Self {
            sight: Sightings::default(),
            holdings: HoldingsInventory::new(),
            funds: Treasury::new(funds),
        }
    }

    pub fn observe(&mut self, candidates: impl IntoIterator<Item = ObservationCandidate>) {
        self.sight.0.extend(candidates);
    }

    /// Advance the engine by `hours` of simulated time.
    pub fn step(&mut self, engine: &mut EscalationEngine, hours: f64) -> TickReport {
        let dt = hours * HOUR;
        let now = engine.now() + dt;
        let mut collaborators =
            Collaborators::new(&mut self.sight, &self.holdings, &mut self.funds);
        engine.advance(dt, now, &mut collaborators)
    }

    /// Raise the engine into the federal tier with nine perfect sensor sightings.
    pub fn go_federal(&mut self, engine: &mut EscalationEngine) {
        self.observe(std::iter::repeat(sensor_hit()).take(9));
        self.step(engine, 0.0);
    }
}
