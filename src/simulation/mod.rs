//! Lockstep multi-player simulation
//!
//! Steps every player and the environment together for the whole horizon:
//! each round all players select an arm, the environment resolves
//! collisions and rewards, and every player receives its observation before
//! the next round starts.
//!
//! # Example
//!
//! ```rust
//! use mpmab::simulation::{ExperimentConfig, Simulation};
//! use mpmab::strategy::StrategyConfig;
//!
//! let config = ExperimentConfig::new()
//!     .arm_means(vec![0.9, 0.5, 0.1])
//!     .num_players(1)
//!     .horizon(200)
//!     .strategy(StrategyConfig::McTopM { num_players: 1 });
//!
//! let report = Simulation::from_config(&config)?.run()?;
//! assert_eq!(report.players.len(), 1);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::env::{Environment, MultiPlayerBandit, StepResult};
use crate::strategy::PlayerStrategy;

pub mod batch;
pub mod config;

pub use batch::{run_batch, BatchSummary};
pub use config::ExperimentConfig;

/// Outcome of one player over a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerReport {
    /// Rewards collected
    pub total_reward: f64,

    /// Rounds in which the player collided
    pub collisions: usize,

    /// Observations the strategy counted per arm
    pub pulls: Vec<u64>,
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Strategy name
    pub strategy: String,

    /// Rounds played
    pub horizon: usize,

    /// Per-player results
    pub players: Vec<PlayerReport>,

    /// Rewards collected by all players
    pub total_reward: f64,

    /// Player-rounds lost to collisions
    pub total_collisions: usize,

    /// Expected reward of the best orthogonal assignment minus collected reward
    pub regret: f64,

    /// Choices per round, one entry per player, when recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Vec<usize>>>,
}

/// Players and environment stepped in lockstep
pub struct Simulation<E: Environment> {
    env: E,
    players: Vec<Box<dyn PlayerStrategy>>,
    horizon: usize,
    record_history: bool,
}

impl<E: Environment> Simulation<E> {
    /// Create a new simulation
    ///
    /// # Arguments
    /// * `env` - Environment resolving each round
    /// * `players` - One strategy per player, all built for the same horizon
    /// * `horizon` - Rounds to play
    pub fn new(env: E, players: Vec<Box<dyn PlayerStrategy>>, horizon: usize) -> Self {
        Self {
            env,
            players,
            horizon,
            record_history: false,
        }
    }

    /// Keep every round's choices in the report
    pub fn with_history(mut self, record: bool) -> Self {
        self.record_history = record;
        self
    }

    /// Players of this simulation
    pub fn players(&self) -> &[Box<dyn PlayerStrategy>] {
        &self.players
    }

    /// Play one round and return the chosen arms
    pub fn step(&mut self) -> Result<(Vec<usize>, StepResult)> {
        let choices = self
            .players
            .iter_mut()
            .enumerate()
            .map(|(i, player)| player.select_arm().with_context(|| format!("player {} select_arm", i)))
            .collect::<Result<Vec<_>>>()?;

        let result = self.env.step(&choices)?;

        for (i, ((player, &arm), &observation)) in self
            .players
            .iter_mut()
            .zip(&choices)
            .zip(&result.observations)
            .enumerate()
        {
            player
                .update(arm, observation)
                .with_context(|| format!("player {} update", i))?;
        }

        Ok((choices, result))
    }

    /// Play the whole horizon
    pub fn run(mut self) -> Result<SimulationReport> {
        let num_players = self.players.len();
        let strategy = self
            .players
            .first()
            .map(|p| p.name().to_string())
            .unwrap_or_default();
        tracing::info!(strategy = %strategy, num_players, horizon = self.horizon, "starting simulation");

        let mut rewards = vec![0.0; num_players];
        let mut collisions = vec![0usize; num_players];
        let mut history = self.record_history.then(|| Vec::with_capacity(self.horizon));

        for _ in 0..self.horizon {
            let (choices, result) = self.step()?;
            for (i, observation) in result.observations.iter().enumerate() {
                rewards[i] += observation.reward;
                if observation.collided {
                    collisions[i] += 1;
                }
            }
            if let Some(history) = history.as_mut() {
                history.push(choices);
            }
        }

        let players: Vec<PlayerReport> = self
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| PlayerReport {
                total_reward: rewards[i],
                collisions: collisions[i],
                pulls: p.state().npulls.clone(),
            })
            .collect();

        let total_reward: f64 = rewards.iter().sum();
        let total_collisions: usize = collisions.iter().sum();
        let regret = optimal_reward(self.env.arm_means(), num_players, self.horizon) - total_reward;

        tracing::info!(
            strategy = %strategy,
            total_reward,
            total_collisions,
            regret,
            "simulation finished"
        );

        Ok(SimulationReport {
            strategy,
            horizon: self.horizon,
            players,
            total_reward,
            total_collisions,
            regret,
            history,
        })
    }
}

impl Simulation<MultiPlayerBandit> {
    /// Build environment and players from a configuration
    ///
    /// The master seed drives one generator that hands out the environment
    /// seed first, then one seed per player.
    pub fn from_config(config: &ExperimentConfig) -> Result<Self> {
        config.validate()?;

        let mut seeds = StdRng::seed_from_u64(config.seed);
        let env = MultiPlayerBandit::with_seed(
            config.arm_means.clone(),
            config.reward_model,
            seeds.next_u64(),
        )?;

        let players = (0..config.num_players)
            .map(|_| {
                let rng = StdRng::seed_from_u64(seeds.next_u64());
                config.strategy.build(config.num_arms(), config.horizon, rng)
            })
            .collect::<crate::error::Result<Vec<_>>>()?;

        Ok(Self::new(env, players, config.horizon).with_history(config.record_history))
    }
}

/// Expected reward of the best collision-free assignment over `horizon` rounds
pub fn optimal_reward(arm_means: &[f64], num_players: usize, horizon: usize) -> f64 {
    let mut sorted = arm_means.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted.iter().take(num_players).sum::<f64>() * horizon as f64
}
