//! Environment traits and implementations
//!
//! This module defines the interface a multi-player bandit environment
//! offers to the simulation driver and provides a seeded stochastic
//! implementation.

use anyhow::Result;

use crate::strategy::Observation;

pub mod bandit;

pub use bandit::{MultiPlayerBandit, RewardModel};

/// Core trait for multi-player bandit environments
pub trait Environment {
    /// Number of arms (K)
    fn num_arms(&self) -> usize;

    /// True mean reward of each arm
    fn arm_means(&self) -> &[f64];

    /// Resolve one round given every player's chosen arm
    ///
    /// Returns one observation per player, in the order of `choices`.
    fn step(&mut self, choices: &[usize]) -> Result<StepResult>;
}

/// Result of one environment round
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Observation handed back to each player
    pub observations: Vec<Observation>,

    /// Number of arms chosen by two or more players
    pub collided_arms: usize,
}

impl StepResult {
    /// Sum of rewards collected by all players this round
    pub fn total_reward(&self) -> f64 {
        self.observations.iter().map(|o| o.reward).sum()
    }

    /// Number of players that collided this round
    pub fn colliding_players(&self) -> usize {
        self.observations.iter().filter(|o| o.collided).count()
    }
}
