#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Simulated exercise environment for training the fitlern agent.
//!
//! [`SimulationEnvironment`] owns a user's [`HealthState`](fitlern_core::HealthState)
//! for one episode, applies an action, produces outcome metrics and a reward,
//! and evolves the health state. Outcome metrics come from a seeded Gaussian
//! model or, through [`SimulationEnvironment::step_with_metrics`], from an
//! external measurement. Episodes never end on their own; the caller decides
//! how many steps to take.

use fitlern_feedback::RewardWeights;
use serde::{Deserialize, Serialize};

macro_rules! debug_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        tracing::debug!($($arg)*);
        #[cfg(not(feature = "telemetry"))]
        let _ = format_args!($($arg)*);
    }};
}

pub mod env;
pub mod error;
pub mod outcome;
pub mod trainer;

pub use env::{SimulationEnvironment, StepInfo, StepResult, Transition};
pub use error::{Result, SimError};
pub use outcome::{adapt_difficulty, OutcomeSimulator};
pub use trainer::{Trainer, TrainingConfig, TrainingReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Exercise duration passed to every step, in seconds.
    pub duration_secs: u32,
    /// Weekly load at construction, clamped to `[0, 1]`.
    pub initial_weekly_load: f64,
    /// Fixed time-of-day feature; `None` reads the local clock.
    pub time_of_day: Option<f64>,
    pub reward_weights: RewardWeights,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_secs: 300,
            initial_weekly_load: 0.5,
            time_of_day: None,
            reward_weights: RewardWeights::default(),
        }
    }
}
