//! Compare the three strategies on one bandit instance
//!
//! Runs a small batch per strategy and prints the regret summary. Pass a
//! path to a JSON experiment file to run that experiment instead.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example simulate --release
//! cargo run --example simulate --release -- experiment.json
//! ```

use anyhow::{Context, Result};
use mpmab::prelude::*;
use mpmab::simulation::BatchSummary;

const NUM_RUNS: usize = 8;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    if let Some(path) = std::env::args().nth(1) {
        let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
        let config: ExperimentConfig =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path))?;
        let report = Simulation::from_config(&config)?.run()?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let base = ExperimentConfig::new()
        .arm_means(vec![0.9, 0.8, 0.7, 0.3, 0.2])
        .num_players(3)
        .horizon(20_000)
        .seed(2024);

    let strategies = [
        StrategyConfig::SynchComm,
        StrategyConfig::McTopM { num_players: 3 },
        StrategyConfig::MusicalChairs {
            delta: 0.1,
            exploration_rounds: Some(3000),
        },
    ];

    tracing::info!("Instance:");
    tracing::info!("  Arm means: {:?}", base.arm_means);
    tracing::info!("  Players: {}", base.num_players);
    tracing::info!("  Horizon: {}", base.horizon);
    tracing::info!("  Runs per strategy: {}", NUM_RUNS);

    let mut summaries = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        let name = strategy.name();
        let summary: BatchSummary = run_batch(&base.clone().strategy(strategy), NUM_RUNS)?;
        tracing::info!(
            "{:<14} regret {:>9.1} ± {:>7.1}  collisions {:>8.1}",
            name,
            summary.mean_regret,
            summary.std_regret,
            summary.mean_collisions
        );
        summaries.push(serde_json::json!({
            "strategy": name,
            "mean_regret": summary.mean_regret,
            "std_regret": summary.std_regret,
            "mean_collisions": summary.mean_collisions,
        }));
    }

    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}
