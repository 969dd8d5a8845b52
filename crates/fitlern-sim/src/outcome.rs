//! Simulated exercise outcomes and the difficulty rules that shape them.

use fitlern_core::catalog::DEFAULT_ACTION_COUNT;
use fitlern_core::OutcomeMetrics;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Highest valid action index.
pub const MAX_ACTION: usize = DEFAULT_ACTION_COUNT - 1;

/// Base reward per adapted action (rest, squat, pushup, burpees, rehab).
pub const BASE_REWARDS: [f64; DEFAULT_ACTION_COUNT] = [0.0, 10.0, 20.0, 30.0, 15.0];

/// Running form average above which difficulty is raised.
pub const MASTERY_FORM: f64 = 75.0;
/// Running form average below which difficulty is lowered.
pub const STRUGGLE_FORM: f64 = 45.0;

const PROGRESSION_BONUS_HIGH: f64 = 1.0;
const PROGRESSION_BONUS_LOW: f64 = 0.2;

// Outcome model: value = base + slope * (action - pivot) + sigma * N(0, 1)
const FORM_BASE: f64 = 60.0;
const FORM_SLOPE: f64 = 5.0;
const FORM_PIVOT: f64 = 1.0;
const FORM_SIGMA: f64 = 3.0;
const INJURY_BASE: f64 = 10.0;
const INJURY_SLOPE: f64 = 5.0;
const INJURY_PIVOT: f64 = 2.0;
const INJURY_SIGMA: f64 = 2.0;
const HEART_RATE_BASE: f64 = 90.0;
const HEART_RATE_SLOPE: f64 = 12.0;
const HEART_RATE_SIGMA: f64 = 3.0;

/// Raise difficulty on mastery, lower it on struggle, never touch rest.
///
/// `action` is clamped to `0..=MAX_ACTION` first. A lowered action never
/// drops below 1, so an exercise request is never turned into rest.
#[must_use]
pub fn adapt_difficulty(action: usize, form_quality_avg: f64) -> usize {
    let action = action.min(MAX_ACTION);
    if action == 0 {
        0
    } else if form_quality_avg > MASTERY_FORM {
        (action + 1).min(MAX_ACTION)
    } else if form_quality_avg < STRUGGLE_FORM {
        action.saturating_sub(1).max(1)
    } else {
        action
    }
}

#[must_use]
pub fn base_reward(adapted: usize) -> f64 {
    BASE_REWARDS[adapted.min(MAX_ACTION)]
}

#[must_use]
pub fn progression_bonus(adapted: usize) -> f64 {
    if adapted >= 2 {
        PROGRESSION_BONUS_HIGH
    } else {
        PROGRESSION_BONUS_LOW
    }
}

/// Gaussian outcome model standing in for a perception pipeline.
#[derive(Debug, Clone)]
pub struct OutcomeSimulator {
    rng: StdRng,
}

impl OutcomeSimulator {
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Sample form score, injury risk and heart rate for an adapted action.
    ///
    /// The duration is part of the contract but does not change the model.
    #[allow(clippy::cast_precision_loss)]
    pub fn sample(&mut self, adapted: usize, _duration_secs: u32) -> OutcomeMetrics {
        let a = adapted.min(MAX_ACTION) as f64;
        OutcomeMetrics {
            form_score: FORM_BASE + FORM_SLOPE * (a - FORM_PIVOT) + FORM_SIGMA * self.noise(),
            injury_risk: INJURY_BASE
                + INJURY_SLOPE * (a - INJURY_PIVOT)
                + INJURY_SIGMA * self.noise(),
            heart_rate: HEART_RATE_BASE + HEART_RATE_SLOPE * a + HEART_RATE_SIGMA * self.noise(),
        }
        .clamped()
    }

    fn noise(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }
}
