use fitlern_core::catalog::{exercise_name, DEFAULT_ACTION_COUNT};
use fitlern_core::{encode, HealthState, OutcomeMetrics, SessionContext, StateVector};
use fitlern_feedback::{RewardCalculator, RewardSignals};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::outcome::{adapt_difficulty, base_reward, progression_bonus, OutcomeSimulator, MAX_ACTION};
use crate::SimulationConfig;

// Health update coefficients
const FORM_KEEP: f64 = 0.8;
const INJURY_KEEP: f64 = 0.7;
const FATIGUE_PER_ACTION: f64 = 0.2;
const FATIGUE_MAX: f64 = 10.0;
const LOAD_PER_ACTION: f64 = 0.02;
const LOAD_DECAY: f64 = 0.01;

/// Per-step details, the same record a perception pipeline would supply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub exercise: String,
    pub requested_action: usize,
    pub adapted_action: usize,
    #[serde(flatten)]
    pub metrics: OutcomeMetrics,
    pub exercise_completed: bool,
    /// Fatigue actually added by this step.
    pub fatigue_increase: f64,
    pub duration_secs: u32,
}

/// Result of [`SimulationEnvironment::step`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub next_state: StateVector,
    pub reward: f64,
    /// Always `false`: episodes end when the caller stops stepping.
    pub done: bool,
    pub info: StepInfo,
}

impl StepResult {
    #[must_use]
    pub fn into_transition(self, state: StateVector, action: usize) -> Transition {
        Transition {
            state,
            action,
            reward: self.reward,
            next_state: self.next_state,
            done: self.done,
            info: self.info,
        }
    }
}

/// One `(state, action, reward, next_state, done, info)` tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: StateVector,
    pub action: usize,
    pub reward: f64,
    pub next_state: StateVector,
    pub done: bool,
    pub info: StepInfo,
}

/// Stochastic environment that owns one user's health state per episode.
#[derive(Debug)]
pub struct SimulationEnvironment {
    config: SimulationConfig,
    reward: RewardCalculator,
    simulator: OutcomeSimulator,
    health: Option<HealthState>,
    weekly_load: f64,
    episode_started: Option<OffsetDateTime>,
}

impl SimulationEnvironment {
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_simulator(config, OutcomeSimulator::from_entropy())
    }

    /// Environment whose outcome noise is reproducible from `seed`.
    #[must_use]
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Self {
        Self::with_simulator(config, OutcomeSimulator::with_seed(seed))
    }

    fn with_simulator(config: SimulationConfig, simulator: OutcomeSimulator) -> Self {
        Self {
            reward: RewardCalculator::new(config.reward_weights),
            weekly_load: clamp01(config.initial_weekly_load),
            config,
            simulator,
            health: None,
            episode_started: None,
        }
    }

    #[must_use]
    pub fn action_count(&self) -> usize {
        DEFAULT_ACTION_COUNT
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn health(&self) -> Option<&HealthState> {
        self.health.as_ref()
    }

    #[must_use]
    pub fn weekly_load(&self) -> f64 {
        self.weekly_load
    }

    #[must_use]
    pub fn episode_started(&self) -> Option<OffsetDateTime> {
        self.episode_started
    }

    /// End the episode and hand the final health state back to the caller.
    pub fn finish(&mut self) -> Option<HealthState> {
        self.episode_started = None;
        self.health.take()
    }

    /// Start an episode with `health` and return its encoded state.
    pub fn reset(&mut self, health: HealthState) -> StateVector {
        self.health = Some(health);
        self.episode_started = Some(OffsetDateTime::now_utc());
        self.observe()
    }

    /// Current context features.
    #[must_use]
    pub fn context(&self) -> SessionContext {
        SessionContext {
            time_of_day: self.config.time_of_day.unwrap_or_else(current_time_of_day),
            weekly_load: self.weekly_load,
        }
    }

    /// Encode the current health state.
    ///
    /// # Panics
    /// If no episode is active (no prior [`SimulationEnvironment::reset`]).
    #[must_use]
    pub fn observe(&self) -> StateVector {
        encode(self.active_health(), &self.context())
    }

    /// Perform `action` for `duration_secs` with simulated outcome metrics.
    ///
    /// # Panics
    /// If no episode is active.
    pub fn step(&mut self, action: usize, duration_secs: u32) -> StepResult {
        let adapted = adapt_difficulty(action, self.active_health().form_quality_avg);
        let metrics = self.simulator.sample(adapted, duration_secs);
        self.apply(action, adapted, metrics, duration_secs)
    }

    /// Perform `action` with externally measured metrics in place of the
    /// simulated ones. Metrics are clamped to their physiological ranges.
    ///
    /// # Panics
    /// If no episode is active.
    pub fn step_with_metrics(
        &mut self,
        action: usize,
        duration_secs: u32,
        metrics: OutcomeMetrics,
    ) -> StepResult {
        let adapted = adapt_difficulty(action, self.active_health().form_quality_avg);
        self.apply(action, adapted, metrics.clamped(), duration_secs)
    }

    fn apply(
        &mut self,
        requested: usize,
        adapted: usize,
        metrics: OutcomeMetrics,
        duration_secs: u32,
    ) -> StepResult {
        let Some(health) = self.health.as_mut() else {
            panic!("SimulationEnvironment::step called before reset");
        };

        let reward = self.reward.compute(&RewardSignals {
            base_reward: base_reward(adapted),
            form_score: metrics.form_score,
            injury_risk: metrics.injury_risk,
            fatigue_level: health.fatigue_level,
            recovery_score: health.recovery_score,
            progression_bonus: progression_bonus(adapted),
        });

        #[allow(clippy::cast_precision_loss)]
        let a = adapted as f64;
        let fatigue_before = health.fatigue_level;
        health.form_quality_avg =
            FORM_KEEP * health.form_quality_avg + (1.0 - FORM_KEEP) * metrics.form_score;
        health.injury_risk_score =
            INJURY_KEEP * health.injury_risk_score + (1.0 - INJURY_KEEP) * metrics.injury_risk;
        health.heart_rate = metrics.heart_rate;
        health.fatigue_level = (health.fatigue_level + FATIGUE_PER_ACTION * a).min(FATIGUE_MAX);
        let fatigue_increase = (health.fatigue_level - fatigue_before).max(0.0);
        self.weekly_load = clamp01(self.weekly_load + LOAD_PER_ACTION * a - LOAD_DECAY);

        StepResult {
            next_state: self.observe(),
            reward,
            done: false,
            info: StepInfo {
                exercise: exercise_name(requested.min(MAX_ACTION)).to_string(),
                requested_action: requested.min(MAX_ACTION),
                adapted_action: adapted,
                metrics,
                exercise_completed: adapted > 0,
                fatigue_increase,
                duration_secs,
            },
        }
    }

    fn active_health(&self) -> &HealthState {
        match &self.health {
            Some(health) => health,
            None => panic!("SimulationEnvironment used before reset"),
        }
    }
}

fn clamp01(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

fn current_time_of_day() -> f64 {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    f64::from(now.hour()) / 24.0
}
