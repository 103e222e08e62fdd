use std::{collections::BTreeMap, fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use escalation_core::{
    load_escalation_config_from_env, Collaborators, CountermeasureKind, CountermeasureReport,
    EscalationConfig, EscalationEngine, EscalationEvent, EscalationSnapshot, FundsService,
    HoldingsInventory, MaterialKind, ObservationCandidate, PendingObservations, Treasury,
    SECONDS_PER_HOUR,
};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(author, version, about = "Deterministic replay harness for the escalation engine", long_about = None)]
struct Args {
    /// Path to scenario JSON file
    #[arg(long)]
    scenario: PathBuf,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of ticks to run
    #[arg(long)]
    ticks: Option<u32>,

    /// Override the simulated hours per tick
    #[arg(long)]
    step_hours: Option<f64>,

    /// Escalation config to load instead of ESCALATION_CONFIG_PATH / builtin
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Scenario {
    seed: Option<u64>,
    ticks: u32,
    step_hours: f64,
    funds: f64,
    holdings: Vec<HoldingEntry>,
    /// Per-tick inputs keyed by 1-based tick number.
    script: BTreeMap<u32, TickScript>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            seed: None,
            ticks: 24,
            step_hours: 1.0,
            funds: 0.0,
            holdings: Vec::new(),
            script: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HoldingEntry {
    material: MaterialKind,
    #[serde(default)]
    lawful: f32,
    #[serde(default)]
    unlawful: f32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TickScript {
    observations: Vec<ObservationCandidate>,
    countermeasures: Vec<CountermeasureKind>,
}

#[derive(Debug, Serialize)]
struct ReplayOutput {
    seed: u64,
    ticks_run: u64,
    digest: String,
    funds: f64,
    snapshot: EscalationSnapshot,
    reports: Vec<CountermeasureReport>,
    events: Vec<EscalationEvent>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let scenario_json = fs::read_to_string(&args.scenario)
        .with_context(|| format!("Failed to read scenario at {}", args.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&scenario_json).with_context(|| {
        format!(
            "Failed to parse scenario JSON at {}",
            args.scenario.display()
        )
    })?;

    let config = match &args.config {
        Some(path) => Arc::new(
            EscalationConfig::from_file(path)
                .with_context(|| format!("Failed to load config at {}", path.display()))?,
        ),
        None => load_escalation_config_from_env(),
    };

    let seed = args.seed.or(scenario.seed).unwrap_or(config.rng_seed);
    let ticks = args.ticks.unwrap_or(scenario.ticks);
    let step = args.step_hours.unwrap_or(scenario.step_hours) * SECONDS_PER_HOUR;

    let output = replay(&scenario, config, seed, ticks, step);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn replay(
    scenario: &Scenario,
    config: Arc<EscalationConfig>,
    seed: u64,
    ticks: u32,
    step: f64,
) -> ReplayOutput {
    let mut engine = EscalationEngine::with_seed(config, seed);
    let mut funds = Treasury::new(scenario.funds);
    let mut holdings = HoldingsInventory::new();
    for entry in &scenario.holdings {
        holdings.add_lawful(entry.material, entry.lawful);
        holdings.add_unlawful(entry.material, entry.unlawful);
    }
    let mut sight = PendingObservations::default();
    let mut reports = Vec::new();
    let mut events = Vec::new();

    for tick in 1..=ticks {
        let script = scenario.script.get(&tick);
        if let Some(script) = script {
            sight.extend(script.observations.iter().copied());
        }

        let now = tick as f64 * step;
        {
            let mut collaborators = Collaborators::new(&mut sight, &holdings, &mut funds);
            engine.advance(step, now, &mut collaborators);
        }

        for &kind in script.map(|s| s.countermeasures.as_slice()).unwrap_or(&[]) {
            reports.push(engine.attempt(kind, now, &mut funds));
        }
        events.extend(engine.drain_events());

        if engine.is_ended() {
            break;
        }
    }

    let snapshot = engine.snapshot();
    ReplayOutput {
        seed,
        ticks_run: engine.tick(),
        digest: format!("{:#018x}", snapshot.digest()),
        funds: funds.balance(),
        snapshot,
        reports,
        events,
    }
}
