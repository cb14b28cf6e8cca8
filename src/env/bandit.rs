//! Stochastic multi-player bandit
//!
//! K arms with fixed means. Players that pick the same arm in the same
//! round collide: each of them receives zero reward and a collision flag.
//! A player alone on an arm receives a sample from the arm's distribution.

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{Environment, StepResult};
use crate::strategy::Observation;

/// How rewards are drawn for an uncontested arm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardModel {
    /// Reward 1 with probability `mean`, else 0
    #[default]
    Bernoulli,
    /// Reward equal to `mean` every time
    Deterministic,
}

/// Multi-player bandit with binary collision feedback
#[derive(Debug, Clone)]
pub struct MultiPlayerBandit {
    means: Vec<f64>,
    model: RewardModel,
    rng: StdRng,
    counts: Vec<usize>,
}

impl MultiPlayerBandit {
    /// Create a new environment
    ///
    /// # Arguments
    /// * `means` - Mean reward of each arm, in `[0, 1]`
    /// * `model` - Reward distribution
    /// * `rng` - Source for the reward draws
    pub fn new(means: Vec<f64>, model: RewardModel, rng: StdRng) -> Result<Self> {
        if means.is_empty() {
            bail!("environment needs at least one arm");
        }
        if let Some(bad) = means.iter().find(|m| !(0.0..=1.0).contains(*m)) {
            bail!("arm mean {} outside [0, 1]", bad);
        }

        let counts = vec![0; means.len()];
        Ok(Self {
            means,
            model,
            rng,
            counts,
        })
    }

    /// Create a new environment with a seeded generator
    pub fn with_seed(means: Vec<f64>, model: RewardModel, seed: u64) -> Result<Self> {
        Self::new(means, model, StdRng::seed_from_u64(seed))
    }

    /// Reward distribution in use
    pub fn reward_model(&self) -> RewardModel {
        self.model
    }

    fn sample(&mut self, arm: usize) -> f64 {
        match self.model {
            RewardModel::Bernoulli => {
                if self.rng.gen_bool(self.means[arm]) {
                    1.0
                } else {
                    0.0
                }
            }
            RewardModel::Deterministic => self.means[arm],
        }
    }
}

impl Environment for MultiPlayerBandit {
    fn num_arms(&self) -> usize {
        self.means.len()
    }

    fn arm_means(&self) -> &[f64] {
        &self.means
    }

    fn step(&mut self, choices: &[usize]) -> Result<StepResult> {
        self.counts.fill(0);
        for &arm in choices {
            if arm >= self.means.len() {
                bail!("arm {} out of range for {} arms", arm, self.means.len());
            }
            self.counts[arm] += 1;
        }

        let mut observations = Vec::with_capacity(choices.len());
        for &arm in choices {
            let observation = if self.counts[arm] > 1 {
                Observation::new(0.0, true)
            } else {
                let reward = self.sample(arm);
                Observation::new(reward, false)
            };
            observations.push(observation);
        }

        let collided_arms = self.counts.iter().filter(|&&c| c > 1).count();
        Ok(StepResult {
            observations,
            collided_arms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_means() {
        assert!(MultiPlayerBandit::with_seed(vec![], RewardModel::Bernoulli, 0).is_err());
        assert!(MultiPlayerBandit::with_seed(vec![0.5, 1.2], RewardModel::Bernoulli, 0).is_err());
        assert!(MultiPlayerBandit::with_seed(vec![0.5, -0.1], RewardModel::Bernoulli, 0).is_err());
    }

    #[test]
    fn test_collisions_zero_rewards() {
        let mut env =
            MultiPlayerBandit::with_seed(vec![0.9, 0.5, 0.1], RewardModel::Deterministic, 0).unwrap();

        let result = env.step(&[0, 0, 2]).unwrap();
        assert_eq!(result.observations[0], Observation::new(0.0, true));
        assert_eq!(result.observations[1], Observation::new(0.0, true));
        assert_eq!(result.observations[2], Observation::new(0.1, false));
        assert_eq!(result.collided_arms, 1);
        assert_eq!(result.colliding_players(), 2);
        assert!((result.total_reward() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_choice() {
        let mut env = MultiPlayerBandit::with_seed(vec![0.5, 0.5], RewardModel::Bernoulli, 0).unwrap();
        assert!(env.step(&[0, 2]).is_err());
    }

    #[test]
    fn test_bernoulli_rewards() {
        let mut env = MultiPlayerBandit::with_seed(vec![0.0, 1.0, 0.3], RewardModel::Bernoulli, 3).unwrap();

        let mut hits = 0.0;
        for _ in 0..2000 {
            let result = env.step(&[0, 1, 2]).unwrap();
            assert_eq!(result.observations[0].reward, 0.0);
            assert_eq!(result.observations[1].reward, 1.0);
            let reward = result.observations[2].reward;
            assert!(reward == 0.0 || reward == 1.0);
            hits += reward;
        }
        let rate = hits / 2000.0;
        assert!((rate - 0.3).abs() < 0.05, "empirical rate {}", rate);
    }
}
