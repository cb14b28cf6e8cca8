//! Common per-player state
//!
//! Every strategy embeds a [`StrategyState`]: horizon, round counter and the
//! per-arm statistics, plus the turn-order guard that keeps `select_arm` and
//! `update` strictly alternating.

use crate::error::{Result, StrategyError};
use crate::utils::stats::running_mean;

use super::Observation;

/// Data shared by all strategies
#[derive(Debug, Clone)]
pub struct StrategyState {
    /// Total number of rounds (T)
    pub horizon: usize,

    /// Completed rounds (t)
    pub t: usize,

    /// Number of arms currently in play (K)
    pub num_arms: usize,

    /// Empirical mean reward per arm
    pub means: Vec<f64>,

    /// Number of observations folded into `means`, per arm
    pub npulls: Vec<u64>,

    /// Confidence radius per arm, infinite until the arm is pulled
    pub confidence: Vec<f64>,

    /// Arm returned by the last `select_arm`, cleared by `update`
    pending: Option<usize>,
}

impl StrategyState {
    /// Validate the construction parameters and build an empty state
    pub fn new(num_arms: usize, horizon: usize) -> Result<Self> {
        if num_arms == 0 {
            return Err(StrategyError::InvalidArgument(
                "number of arms must be positive".into(),
            ));
        }
        if horizon == 0 {
            return Err(StrategyError::InvalidArgument("horizon must be positive".into()));
        }

        Ok(Self {
            horizon,
            t: 0,
            num_arms,
            means: vec![0.0; num_arms],
            npulls: vec![0; num_arms],
            confidence: vec![f64::INFINITY; num_arms],
            pending: None,
        })
    }

    /// Total number of arms the state tracks
    pub fn total_arms(&self) -> usize {
        self.means.len()
    }

    /// Arm awaiting its `update`, if any
    pub fn pending(&self) -> Option<usize> {
        self.pending
    }

    /// Check that a new round may start
    pub fn ensure_ready(&self) -> Result<()> {
        if self.pending.is_some() {
            return Err(StrategyError::OutOfOrder {
                expected: "update",
                found: "select_arm",
            });
        }
        if self.t >= self.horizon {
            return Err(StrategyError::HorizonExhausted {
                horizon: self.horizon,
            });
        }
        Ok(())
    }

    /// Record the arm about to be returned from `select_arm`
    pub fn begin_round(&mut self, arm: usize) -> Result<usize> {
        self.ensure_ready()?;
        self.check_arm(arm)?;
        self.pending = Some(arm);
        Ok(arm)
    }

    /// Check that `arm` is the arm selected this round and close the round
    pub fn end_round(&mut self, arm: usize) -> Result<()> {
        match self.pending {
            None => Err(StrategyError::OutOfOrder {
                expected: "select_arm",
                found: "update",
            }),
            Some(selected) if selected != arm => Err(StrategyError::ArmMismatch {
                selected,
                reported: arm,
            }),
            Some(_) => {
                self.pending = None;
                Ok(())
            }
        }
    }

    /// Fold an observation into the running mean of `arm`
    pub fn record(&mut self, arm: usize, observation: Observation) {
        self.means[arm] = running_mean(self.means[arm], self.npulls[arm], observation.reward);
        self.npulls[arm] += 1;
    }

    fn check_arm(&self, arm: usize) -> Result<()> {
        if arm >= self.total_arms() {
            return Err(StrategyError::ArmOutOfRange {
                arm,
                num_arms: self.total_arms(),
            });
        }
        Ok(())
    }
}
