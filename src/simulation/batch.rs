//! Parallel batch of independent runs
//!
//! Runs the same experiment under many seeds using Rayon's thread pool.
//! Each run is still a single-threaded lockstep simulation; only whole runs
//! execute in parallel.
//!
//! # Example
//!
//! ```rust
//! use mpmab::simulation::{run_batch, ExperimentConfig};
//! use mpmab::strategy::StrategyConfig;
//!
//! let config = ExperimentConfig::new()
//!     .horizon(300)
//!     .strategy(StrategyConfig::McTopM { num_players: 2 });
//!
//! let summary = run_batch(&config, 4)?;
//! assert_eq!(summary.reports.len(), 4);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{ExperimentConfig, Simulation, SimulationReport};

/// Reports of a batch plus aggregate statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// One report per run, in seed order
    pub reports: Vec<SimulationReport>,

    /// Mean regret across runs
    pub mean_regret: f64,

    /// Standard deviation of the regret across runs
    pub std_regret: f64,

    /// Mean number of colliding player-rounds across runs
    pub mean_collisions: f64,
}

/// Run `num_runs` independent simulations of `config`
///
/// Run `i` uses master seed `config.seed + i`.
pub fn run_batch(config: &ExperimentConfig, num_runs: usize) -> Result<BatchSummary> {
    config.validate()?;

    let reports = (0..num_runs as u64)
        .into_par_iter()
        .map(|i| {
            let run_config = config.clone().seed(config.seed.wrapping_add(i));
            Simulation::from_config(&run_config)?.run()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(summarize(reports))
}

fn summarize(reports: Vec<SimulationReport>) -> BatchSummary {
    if reports.is_empty() {
        return BatchSummary {
            reports,
            mean_regret: 0.0,
            std_regret: 0.0,
            mean_collisions: 0.0,
        };
    }

    let n = reports.len() as f64;
    let mean_regret = reports.iter().map(|r| r.regret).sum::<f64>() / n;
    let var_regret = reports
        .iter()
        .map(|r| (r.regret - mean_regret).powi(2))
        .sum::<f64>()
        / n;
    let mean_collisions = reports.iter().map(|r| r.total_collisions as f64).sum::<f64>() / n;

    tracing::info!(runs = reports.len(), mean_regret, mean_collisions, "batch finished");

    BatchSummary {
        reports,
        mean_regret,
        std_regret: var_regret.sqrt(),
        mean_collisions,
    }
}
