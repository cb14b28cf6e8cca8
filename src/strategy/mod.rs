//! Player strategies
//!
//! This module defines the contract every decentralized player implements
//! and the three strategies built on it:
//!
//! - [`SynchComm`]: rank assignment and statistics broadcast through
//!   deliberate collisions, followed by distributed arm elimination
//! - [`McTopM`]: reactive top-M selection with a stick/switch rule
//! - [`MusicalChairs`]: random exploration, player-count estimation from
//!   collision frequency, then seat seeking among the best arms
//!
//! A strategy never sees other players. Each round the driver calls
//! [`PlayerStrategy::select_arm`], resolves the round, and hands the
//! resulting [`Observation`] back through [`PlayerStrategy::update`].

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod mc_top_m;
pub mod musical_chairs;
pub mod state;
pub mod sync_comm;

#[cfg(test)]
pub(crate) mod testing;

pub use mc_top_m::McTopM;
pub use musical_chairs::{MusicalChairs, MusicalChairsPhase};
pub use state::StrategyState;
pub use sync_comm::{ArmOutcome, SynchComm, SynchCommPhase};

/// What a player observes after pulling an arm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Reward received (zero on collision in the built-in environment)
    pub reward: f64,

    /// Whether another player chose the same arm this round
    pub collided: bool,
}

impl Observation {
    /// Create a new observation
    pub fn new(reward: f64, collided: bool) -> Self {
        Self { reward, collided }
    }
}

/// Decision rule of a single player
///
/// Calls must alternate strictly: `select_arm`, then `update` with the arm
/// just returned. Implementations reject anything else instead of letting
/// their round counters drift from the other players'.
pub trait PlayerStrategy: Send {
    /// Short strategy name
    fn name(&self) -> &'static str;

    /// Common state (horizon, round counter, per-arm statistics)
    fn state(&self) -> &StrategyState;

    /// Choose the arm to pull this round
    fn select_arm(&mut self) -> Result<usize>;

    /// Observe the outcome of the arm pulled this round
    fn update(&mut self, arm: usize, observation: Observation) -> Result<()>;
}

/// Strategy selection and parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Rank assignment + collision-coded communication
    SynchComm,

    /// Top-M selection, needs the number of players
    McTopM {
        /// Number of players (M)
        num_players: usize,
    },

    /// Musical chairs with confidence parameter delta
    MusicalChairs {
        /// Confidence parameter in (0, 1]
        delta: f64,

        /// Explicit exploration length, replaces the computed T0
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exploration_rounds: Option<usize>,
    },
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::SynchComm
    }
}

impl StrategyConfig {
    /// Build a strategy instance for one player
    pub fn build(&self, num_arms: usize, horizon: usize, rng: StdRng) -> Result<Box<dyn PlayerStrategy>> {
        Ok(match self {
            Self::SynchComm => Box::new(SynchComm::new(num_arms, horizon, rng)?),
            Self::McTopM { num_players } => {
                Box::new(McTopM::new(num_arms, *num_players, horizon, rng)?)
            }
            Self::MusicalChairs {
                delta,
                exploration_rounds: None,
            } => Box::new(MusicalChairs::new(num_arms, horizon, *delta, rng)?),
            Self::MusicalChairs {
                delta,
                exploration_rounds: Some(rounds),
            } => Box::new(MusicalChairs::with_exploration_rounds(
                num_arms, horizon, *delta, *rounds, rng,
            )?),
        })
    }

    /// Short name of the configured strategy
    pub fn name(&self) -> &'static str {
        match self {
            Self::SynchComm => SynchComm::NAME,
            Self::McTopM { .. } => McTopM::NAME,
            Self::MusicalChairs { .. } => MusicalChairs::NAME,
        }
    }
}
