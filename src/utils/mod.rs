//! Utility functions and helpers

pub mod stats;

pub use stats::{choose_uniform, running_mean, top_m_indices};
