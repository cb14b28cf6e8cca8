//! # mpmab
//!
//! Decentralized strategies for the multi-player multi-armed bandit problem.
//!
//! Several players pull arms of the same bandit in lockstep. Players that
//! choose the same arm collide and learn only that a collision happened.
//! There is no other channel between them, so every strategy here has to
//! coordinate through its own rewards and collision flags alone.
//!
//! ## Quick Start
//!
//! ```rust
//! use mpmab::prelude::*;
//!
//! let config = ExperimentConfig::new()
//!     .arm_means(vec![0.9, 0.8, 0.2, 0.1])
//!     .num_players(2)
//!     .horizon(2000)
//!     .strategy(StrategyConfig::SynchComm);
//!
//! let report = Simulation::from_config(&config)?.run()?;
//! println!("regret: {:.1}", report.regret);
//! # Ok::<(), anyhow::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Strategy error types
pub mod error;

/// Player strategies and their shared contract
pub mod strategy;

/// Environment traits and implementations
pub mod env;

/// Lockstep simulation, experiment configuration and batch runs
pub mod simulation;

/// Utility functions and helpers
pub mod utils;

/// Prelude module for convenient imports
///
/// This module re-exports commonly used types and traits for convenience.
pub mod prelude {
    pub use crate::env::{Environment, MultiPlayerBandit, RewardModel};
    pub use crate::error::StrategyError;
    pub use crate::simulation::{run_batch, ExperimentConfig, Simulation, SimulationReport};
    pub use crate::strategy::{
        McTopM, MusicalChairs, Observation, PlayerStrategy, StrategyConfig, StrategyState, SynchComm,
    };
}

/// Current version of mpmab
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }
}
