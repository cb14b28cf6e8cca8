//! Musical chairs (Rosenski, Shamir & Szlak)
//!
//! Explore uniformly for `T0` rounds while counting collisions, infer the
//! number of players from the collision rate, then grab a free seat among
//! the estimated best M arms and keep it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, StrategyError};
use crate::utils::stats::{choose_uniform, top_m_indices};

use super::{Observation, PlayerStrategy, StrategyState};

/// Phase of a [`MusicalChairs`] player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicalChairsPhase {
    /// Uniform random pulls, collisions counted
    Exploration,
    /// Random pulls among the estimated best M arms until one is free
    Fixation,
    /// Seated on a fixed arm
    Exploitation {
        /// The arm this player keeps until the horizon
        arm: usize,
    },
}

/// Exploration length guaranteeing accurate estimates with probability 1-δ
///
/// `ceil(max(K·ln(2K²T)/2, 16K·ln(4K²T)/δ², K²·ln(2T)/0.02))`
pub fn exploration_length(num_arms: usize, horizon: usize, delta: f64) -> usize {
    let k = num_arms as f64;
    let t = horizon as f64;
    let bounds = [
        k * (2.0 * k * k * t).ln() / 2.0,
        16.0 * k * (4.0 * k * k * t).ln() / (delta * delta),
        k * k * (2.0 * t).ln() / 0.02,
    ];
    bounds.iter().copied().fold(0.0, f64::max).ceil() as usize
}

/// Invert the expected collision rate `1 - (1 - 1/K)^(M-1)` to estimate M
///
/// The estimate is clamped to `[1, K]`.
pub fn estimate_players(rounds: usize, collisions: usize, num_arms: usize) -> usize {
    if num_arms <= 1 || rounds == 0 {
        return 1;
    }
    if collisions >= rounds {
        tracing::warn!(rounds, collisions, "every exploration round collided");
        return num_arms;
    }

    let free_rate = (rounds - collisions) as f64 / rounds as f64;
    let estimate = (free_rate.ln() / (1.0 - 1.0 / num_arms as f64).ln()).round() + 1.0;
    if !estimate.is_finite() || estimate > num_arms as f64 {
        tracing::warn!(estimate, num_arms, "player estimate clamped to the number of arms");
        return num_arms;
    }
    (estimate as usize).max(1)
}

/// Musical chairs player
#[derive(Debug, Clone)]
pub struct MusicalChairs {
    state: StrategyState,
    rng: StdRng,
    phase: MusicalChairsPhase,
    exploration_rounds: usize,
    collisions: usize,
    num_players: usize,
    best_m: Vec<usize>,
}

impl MusicalChairs {
    /// Strategy name
    pub const NAME: &'static str = "MusicalChairs";

    /// Create a new player with the exploration length derived from δ
    ///
    /// # Arguments
    /// * `num_arms` - Number of arms (K)
    /// * `horizon` - Number of rounds (T)
    /// * `delta` - Confidence parameter in (0, 1]
    /// * `rng` - Source for the random pulls
    pub fn new(num_arms: usize, horizon: usize, delta: f64, rng: StdRng) -> Result<Self> {
        check_delta(delta)?;
        let rounds = exploration_length(num_arms, horizon, delta);
        Self::with_exploration_rounds(num_arms, horizon, delta, rounds, rng)
    }

    /// Create a new player with an explicit exploration length
    pub fn with_exploration_rounds(
        num_arms: usize,
        horizon: usize,
        delta: f64,
        exploration_rounds: usize,
        rng: StdRng,
    ) -> Result<Self> {
        check_delta(delta)?;
        let state = StrategyState::new(num_arms, horizon)?;

        Ok(Self {
            state,
            rng,
            phase: MusicalChairsPhase::Exploration,
            exploration_rounds,
            collisions: 0,
            num_players: 1,
            best_m: Vec::new(),
        })
    }

    /// Create a new player with a seeded generator
    pub fn with_seed(num_arms: usize, horizon: usize, delta: f64, seed: u64) -> Result<Self> {
        Self::new(num_arms, horizon, delta, StdRng::seed_from_u64(seed))
    }

    /// Current phase
    pub fn phase(&self) -> MusicalChairsPhase {
        self.phase
    }

    /// Length of the exploration phase (T0)
    pub fn exploration_rounds(&self) -> usize {
        self.exploration_rounds
    }

    /// Collisions observed during exploration
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Estimated number of players, 1 until exploration ends
    pub fn num_players(&self) -> usize {
        self.num_players
    }

    /// Candidate arms picked at the end of exploration
    pub fn best_m(&self) -> &[usize] {
        &self.best_m
    }

    fn on_exploration(&mut self, collided: bool) -> MusicalChairsPhase {
        if collided {
            self.collisions += 1;
        }
        if self.state.t < self.exploration_rounds {
            return MusicalChairsPhase::Exploration;
        }

        self.num_players = estimate_players(self.state.t, self.collisions, self.state.num_arms);
        self.best_m = top_m_indices(&self.state.means, self.num_players);
        tracing::debug!(
            num_players = self.num_players,
            collisions = self.collisions,
            best_m = ?self.best_m,
            "exploration finished"
        );
        MusicalChairsPhase::Fixation
    }
}

fn check_delta(delta: f64) -> Result<()> {
    if !(delta > 0.0 && delta <= 1.0) {
        return Err(StrategyError::InvalidArgument(format!(
            "delta must be in (0, 1], got {}",
            delta
        )));
    }
    Ok(())
}

impl PlayerStrategy for MusicalChairs {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn state(&self) -> &StrategyState {
        &self.state
    }

    fn select_arm(&mut self) -> Result<usize> {
        self.state.ensure_ready()?;
        let arm = match self.phase {
            MusicalChairsPhase::Exploration => self.rng.gen_range(0..self.state.num_arms),
            MusicalChairsPhase::Fixation => choose_uniform(&mut self.rng, &self.best_m)
                .ok_or_else(|| StrategyError::Desynchronized("no candidate arms".into()))?,
            MusicalChairsPhase::Exploitation { arm } => arm,
        };
        self.state.begin_round(arm)
    }

    fn update(&mut self, arm: usize, observation: Observation) -> Result<()> {
        self.state.end_round(arm)?;
        self.state.t += 1;

        // Collided rewards say nothing about the arm
        if !observation.collided {
            self.state.record(arm, observation);
        }

        self.phase = match self.phase {
            MusicalChairsPhase::Exploration => self.on_exploration(observation.collided),
            MusicalChairsPhase::Fixation if !observation.collided => {
                tracing::debug!(arm, t = self.state.t, "seated");
                MusicalChairsPhase::Exploitation { arm }
            }
            phase => phase,
        };
        Ok(())
    }
}
