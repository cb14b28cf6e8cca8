//! MCTopM (Besson & Kaufmann)
//!
//! Each player keeps the M arms with the largest UCB index
//! `mean + sqrt(ln T / (2·n))` and reacts to the previous round:
//!
//! - last arm dropped out of the top M: move to a random top-M arm whose
//!   previous index was not above the last arm's, and unsettle
//! - collision while unsettled: jump to a random top-M arm
//! - otherwise: stay and settle
//!
//! Settled players keep their arm through collisions, so a newcomer that
//! collides with them is the one that moves on.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, StrategyError};
use crate::utils::stats::{choose_uniform, top_m_indices};

use super::{Observation, PlayerStrategy, StrategyState};

/// MCTopM player
#[derive(Debug, Clone)]
pub struct McTopM {
    state: StrategyState,
    rng: StdRng,
    num_players: usize,
    last_action: usize,
    collided: bool,
    settled: bool,
    best_m: Vec<usize>,
    index: Vec<f64>,
    previous_index: Vec<f64>,
}

impl McTopM {
    /// Strategy name
    pub const NAME: &'static str = "MCTopM";

    /// Create a new player
    ///
    /// # Arguments
    /// * `num_arms` - Number of arms (K)
    /// * `num_players` - Number of players (M), in `[1, K]`
    /// * `horizon` - Number of rounds (T)
    /// * `rng` - Source for the random moves
    pub fn new(num_arms: usize, num_players: usize, horizon: usize, mut rng: StdRng) -> Result<Self> {
        let state = StrategyState::new(num_arms, horizon)?;
        if num_players == 0 || num_players > num_arms {
            return Err(StrategyError::InvalidArgument(format!(
                "number of players must be in [1, {}], got {}",
                num_arms, num_players
            )));
        }

        let index = state.confidence.clone();
        let best_m = top_m_indices(&index, num_players);
        let last_action = rng.gen_range(0..num_arms);

        Ok(Self {
            state,
            rng,
            num_players,
            last_action,
            collided: false,
            settled: false,
            best_m,
            previous_index: index.clone(),
            index,
        })
    }

    /// Create a new player with a seeded generator
    pub fn with_seed(num_arms: usize, num_players: usize, horizon: usize, seed: u64) -> Result<Self> {
        Self::new(num_arms, num_players, horizon, StdRng::seed_from_u64(seed))
    }

    /// Current top-M arm set, best first
    pub fn best_m(&self) -> &[usize] {
        &self.best_m
    }

    /// Whether the player is settled on its arm
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Number of players this strategy assumes (M)
    pub fn num_players(&self) -> usize {
        self.num_players
    }

    /// UCB index per arm after the last update
    pub fn index(&self) -> &[f64] {
        &self.index
    }

    fn pick_from_best_m(&mut self) -> Result<usize> {
        choose_uniform(&mut self.rng, &self.best_m)
            .ok_or_else(|| StrategyError::Desynchronized("empty top-M set".into()))
    }
}

impl PlayerStrategy for McTopM {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn state(&self) -> &StrategyState {
        &self.state
    }

    fn select_arm(&mut self) -> Result<usize> {
        self.state.ensure_ready()?;

        let arm = if !self.best_m.contains(&self.last_action) {
            let threshold = self.previous_index[self.last_action];
            let candidates: Vec<usize> = self
                .best_m
                .iter()
                .copied()
                .filter(|&arm| self.previous_index[arm] <= threshold)
                .collect();
            self.settled = false;
            match choose_uniform(&mut self.rng, &candidates) {
                Some(arm) => arm,
                None => self.pick_from_best_m()?,
            }
        } else if self.collided && !self.settled {
            self.pick_from_best_m()?
        } else {
            self.settled = true;
            self.last_action
        };

        self.state.begin_round(arm)
    }

    fn update(&mut self, arm: usize, observation: Observation) -> Result<()> {
        self.state.end_round(arm)?;
        self.last_action = arm;
        self.collided = observation.collided;
        self.state.t += 1;

        self.state.record(arm, observation);
        let log_horizon = (self.state.horizon as f64).ln();
        self.state.confidence[arm] = (log_horizon / (2.0 * self.state.npulls[arm] as f64)).sqrt();

        std::mem::swap(&mut self.previous_index, &mut self.index);
        for (k, index) in self.index.iter_mut().enumerate() {
            *index = self.state.means[k] + self.state.confidence[k];
        }
        self.best_m = top_m_indices(&self.index, self.num_players);
        Ok(())
    }
}
