//! Error types for player strategies.

use thiserror::Error;

/// Result type alias for strategy operations.
pub type Result<T> = std::result::Result<T, StrategyError>;

/// Errors raised by a [`PlayerStrategy`](crate::strategy::PlayerStrategy).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    /// Invalid construction parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `select_arm` and `update` were not called alternately.
    #[error("call out of order: expected {expected}, got {found}")]
    OutOfOrder {
        /// The call that was expected next.
        expected: &'static str,
        /// The call that was made.
        found: &'static str,
    },

    /// `update` reported a different arm than the one just selected.
    #[error("update for arm {reported} but arm {selected} was selected")]
    ArmMismatch {
        /// Arm returned by the preceding `select_arm`.
        selected: usize,
        /// Arm passed to `update`.
        reported: usize,
    },

    /// Arm index outside `[0, num_arms)`.
    #[error("arm {arm} out of range for {num_arms} arms")]
    ArmOutOfRange {
        /// Offending arm index.
        arm: usize,
        /// Number of arms.
        num_arms: usize,
    },

    /// All rounds of the horizon have been played.
    #[error("horizon of {horizon} rounds exhausted")]
    HorizonExhausted {
        /// The horizon the strategy was built for.
        horizon: usize,
    },

    /// Phase bookkeeping no longer matches the shared schedule.
    #[error("strategy desynchronized: {0}")]
    Desynchronized(String),
}
