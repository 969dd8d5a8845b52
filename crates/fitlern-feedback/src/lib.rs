#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Reward calculation and session outcome analysis.
//!
//! The reward is a weighted sum of outcome signals and serves as the training
//! signal for the agent. It is intentionally unclamped; use
//! [`performance_score`] for a bounded value that can be shown to a user.

use fitlern_core::OutcomeMetrics;
use serde::{Deserialize, Serialize};

// Reward term scaling
/// Form score at which the form term is neutral
const FORM_NEUTRAL: f64 = 50.0;
/// Divisor applied to the form score offset
const FORM_SCALE: f64 = 10.0;
/// Divisor applied to the injury risk
const INJURY_SCALE: f64 = 5.0;
/// Multiplier applied to the fatigue level
const FATIGUE_SCALE: f64 = 2.0;
/// Divisor applied to the recovery score
const RECOVERY_SCALE: f64 = 10.0;

// Performance score
/// Offset added to the reward before clamping into the display range
const PERFORMANCE_OFFSET: f64 = 50.0;
/// Upper bound of the display range
const PERFORMANCE_MAX: f64 = 100.0;

/// Weights for the six reward terms.
///
/// Every weight defaults to 1.0, also when missing from a config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    pub base: f64,
    pub form: f64,
    pub injury: f64,
    pub fatigue: f64,
    pub recovery: f64,
    pub progression: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            base: 1.0,
            form: 1.0,
            injury: 1.0,
            fatigue: 1.0,
            recovery: 1.0,
            progression: 1.0,
        }
    }
}

/// Raw outcome signals of one exercise step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardSignals {
    pub base_reward: f64,
    pub form_score: f64,
    pub injury_risk: f64,
    pub fatigue_level: f64,
    pub recovery_score: f64,
    pub progression_bonus: f64,
}

/// Weighted contribution of each reward term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub base: f64,
    pub form: f64,
    pub injury: f64,
    pub fatigue: f64,
    pub recovery: f64,
    pub progression: f64,
}

impl RewardBreakdown {
    /// Sum of all terms, added in a fixed order.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.base + self.form + self.injury + self.fatigue + self.recovery + self.progression
    }
}

/// Combines outcome signals into a scalar reward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardCalculator {
    pub weights: RewardWeights,
}

impl RewardCalculator {
    #[must_use]
    pub fn new(weights: RewardWeights) -> Self {
        Self { weights }
    }

    /// Compute the reward for one step.
    ///
    /// Deterministic: identical inputs yield bit-identical results.
    #[must_use]
    pub fn compute(&self, signals: &RewardSignals) -> f64 {
        self.breakdown(signals).total()
    }

    /// Weighted terms that make up [`RewardCalculator::compute`].
    #[must_use]
    pub fn breakdown(&self, s: &RewardSignals) -> RewardBreakdown {
        let w = &self.weights;
        RewardBreakdown {
            base: w.base * s.base_reward,
            form: w.form * ((s.form_score - FORM_NEUTRAL) / FORM_SCALE),
            injury: w.injury * (-s.injury_risk / INJURY_SCALE),
            fatigue: w.fatigue * (-s.fatigue_level * FATIGUE_SCALE),
            recovery: w.recovery * (s.recovery_score / RECOVERY_SCALE),
            progression: w.progression * s.progression_bonus,
        }
    }
}

/// Map a reward into the 0..=100 range shown to users.
#[must_use]
pub fn performance_score(reward: f64) -> f64 {
    if reward.is_nan() {
        return PERFORMANCE_OFFSET;
    }
    (PERFORMANCE_OFFSET + reward).clamp(0.0, PERFORMANCE_MAX)
}

/// Aggregated outcome metrics of one training session.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Number of recorded steps.
    pub steps: usize,
    /// Steps where an exercise (not rest) was performed.
    pub exercises_completed: usize,
    pub total_reward: f64,
    pub total_form_score: f64,
    pub total_heart_rate: f64,
    pub max_injury_risk: f64,
}

impl SessionSummary {
    /// Record the metrics and reward of one step.
    ///
    /// Non-finite rewards are counted as a step but not added to the total.
    pub fn record(&mut self, metrics: &OutcomeMetrics, reward: f64, exercised: bool) {
        self.steps += 1;
        if exercised {
            self.exercises_completed += 1;
        }
        if reward.is_finite() {
            self.total_reward += reward;
        }
        self.total_form_score += metrics.form_score;
        self.total_heart_rate += metrics.heart_rate;
        self.max_injury_risk = self.max_injury_risk.max(metrics.injury_risk);
    }

    #[must_use]
    pub fn average_reward(&self) -> f64 {
        self.mean(self.total_reward)
    }

    #[must_use]
    pub fn average_form_score(&self) -> f64 {
        self.mean(self.total_form_score)
    }

    #[must_use]
    pub fn average_heart_rate(&self) -> f64 {
        self.mean(self.total_heart_rate)
    }

    /// Performance score of the average step reward.
    #[must_use]
    pub fn performance_score(&self) -> f64 {
        performance_score(self.average_reward())
    }

    fn mean(&self, total: f64) -> f64 {
        if self.steps == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            total / self.steps as f64
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signals() -> RewardSignals {
        RewardSignals {
            base_reward: 10.0,
            form_score: 60.0,
            injury_risk: 10.0,
            fatigue_level: 2.0,
            recovery_score: 70.0,
            progression_bonus: 0.2,
        }
    }

    #[test]
    fn reward_matches_reference_example() {
        let reward = RewardCalculator::default().compute(&signals());
        assert!((reward - 12.2).abs() < 1e-9, "reward was {reward}");
    }

    #[test]
    fn breakdown_exposes_each_term() {
        let b = RewardCalculator::default().breakdown(&signals());
        assert!((b.base - 10.0).abs() < 1e-12);
        assert!((b.form - 1.0).abs() < 1e-12);
        assert!((b.injury + 2.0).abs() < 1e-12);
        assert!((b.fatigue + 4.0).abs() < 1e-12);
        assert!((b.recovery - 7.0).abs() < 1e-12);
        assert!((b.progression - 0.2).abs() < 1e-12);
    }

    #[test]
    fn weights_scale_their_terms_independently() {
        let calc = RewardCalculator::new(RewardWeights {
            progression: 0.0,
            fatigue: 0.5,
            ..RewardWeights::default()
        });
        let reward = calc.compute(&signals());
        assert!((reward - (10.0 + 1.0 - 2.0 - 2.0 + 7.0)).abs() < 1e-9);
    }

    #[test]
    fn reward_is_reproducible_bit_for_bit() {
        let calc = RewardCalculator::default();
        let s = RewardSignals {
            base_reward: 30.0,
            form_score: 71.234_567,
            injury_risk: 13.1,
            fatigue_level: 3.3,
            recovery_score: 64.2,
            progression_bonus: 1.0,
        };
        assert_eq!(calc.compute(&s).to_bits(), calc.compute(&s).to_bits());
    }

    #[test]
    fn reward_is_not_clamped() {
        let s = RewardSignals {
            base_reward: 0.0,
            form_score: 0.0,
            injury_risk: 100.0,
            fatigue_level: 10.0,
            recovery_score: 0.0,
            progression_bonus: 0.0,
        };
        assert!(RewardCalculator::default().compute(&s) < -40.0);
    }

    #[test]
    fn weights_deserialize_with_defaults() {
        let weights: RewardWeights =
            serde_json::from_str(r#"{"injury": 2.5}"#).expect("should deserialize weights");
        assert!((weights.injury - 2.5).abs() < f64::EPSILON);
        assert!((weights.progression - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn performance_score_is_bounded() {
        #[allow(clippy::float_cmp)]
        {
            assert_eq!(performance_score(12.0), 62.0);
            assert_eq!(performance_score(90.0), 100.0);
            assert_eq!(performance_score(-80.0), 0.0);
            assert_eq!(performance_score(f64::NAN), 50.0);
        }
    }

    #[test]
    fn session_summary_aggregates_steps() {
        let mut summary = SessionSummary::default();
        summary.record(
            &OutcomeMetrics {
                form_score: 60.0,
                injury_risk: 12.0,
                heart_rate: 110.0,
            },
            10.0,
            true,
        );
        summary.record(
            &OutcomeMetrics {
                form_score: 70.0,
                injury_risk: 8.0,
                heart_rate: 90.0,
            },
            f64::INFINITY,
            false,
        );

        assert_eq!(summary.steps, 2);
        assert_eq!(summary.exercises_completed, 1);
        #[allow(clippy::float_cmp)]
        {
            assert_eq!(summary.average_reward(), 5.0);
            assert_eq!(summary.average_form_score(), 65.0);
            assert_eq!(summary.average_heart_rate(), 100.0);
            assert_eq!(summary.max_injury_risk, 12.0);
            assert_eq!(summary.performance_score(), 55.0);
        }
    }

    #[test]
    fn empty_summary_is_neutral() {
        let summary = SessionSummary::default();
        #[allow(clippy::float_cmp)]
        {
            assert_eq!(summary.average_reward(), 0.0);
            assert_eq!(summary.performance_score(), 50.0);
        }
    }
}
