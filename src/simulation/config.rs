//! Experiment configuration
//!
//! This module defines the parameters of one simulated run and provides
//! validation and builder-style setters.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::env::RewardModel;
use crate::strategy::StrategyConfig;

/// Parameters of a simulated run
///
/// Every player uses the same strategy. Default values describe a small
/// four-arm, two-player instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// True mean reward of each arm
    pub arm_means: Vec<f64>,

    /// Reward distribution of uncontested arms
    pub reward_model: RewardModel,

    /// Number of players
    pub num_players: usize,

    /// Number of rounds (T)
    pub horizon: usize,

    /// Strategy run by every player
    pub strategy: StrategyConfig,

    /// Master seed for the environment and all players
    pub seed: u64,

    /// Keep every player's choice for every round in the report
    pub record_history: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            arm_means: vec![0.9, 0.8, 0.2, 0.1],
            reward_model: RewardModel::Bernoulli,
            num_players: 2,
            horizon: 2000,
            strategy: StrategyConfig::SynchComm,
            seed: 0,
            record_history: false,
        }
    }
}

impl ExperimentConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of arms
    pub fn num_arms(&self) -> usize {
        self.arm_means.len()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.arm_means.is_empty() {
            return Err(anyhow!("arm_means must not be empty"));
        }
        if self.arm_means.iter().any(|m| !(0.0..=1.0).contains(m)) {
            return Err(anyhow!("arm means must be in [0, 1]"));
        }
        if self.num_players == 0 {
            return Err(anyhow!("num_players must be positive"));
        }
        if self.num_players > self.num_arms() {
            return Err(anyhow!(
                "num_players ({}) must not exceed the number of arms ({})",
                self.num_players,
                self.num_arms()
            ));
        }
        if self.horizon == 0 {
            return Err(anyhow!("horizon must be positive"));
        }
        if let StrategyConfig::McTopM { num_players } = self.strategy {
            if num_players == 0 || num_players > self.num_arms() {
                return Err(anyhow!("MCTopM num_players must be in [1, {}]", self.num_arms()));
            }
        }
        if let StrategyConfig::MusicalChairs { delta, .. } = self.strategy {
            if !(delta > 0.0 && delta <= 1.0) {
                return Err(anyhow!("delta must be in (0, 1]"));
            }
        }
        Ok(())
    }

    /// Set arm means
    pub fn arm_means(mut self, means: Vec<f64>) -> Self {
        self.arm_means = means;
        self
    }

    /// Set reward model
    pub fn reward_model(mut self, model: RewardModel) -> Self {
        self.reward_model = model;
        self
    }

    /// Set number of players
    pub fn num_players(mut self, num_players: usize) -> Self {
        self.num_players = num_players;
        self
    }

    /// Set horizon
    pub fn horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set strategy
    pub fn strategy(mut self, strategy: StrategyConfig) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set master seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Keep per-round choices in the report
    pub fn record_history(mut self, record: bool) -> Self {
        self.record_history = record;
        self
    }
}
