//! Episode loop that couples a [`Policy`] with the simulation.

use fitlern_core::{HealthState, Policy, STATE_SIZE};
use fitlern_feedback::SessionSummary;
use serde::{Deserialize, Serialize};

use crate::env::SimulationEnvironment;
use crate::error::{Result, SimError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    /// Steps per episode; the environment itself never ends an episode.
    pub steps_per_episode: usize,
    pub min_epsilon: f64,
    pub epsilon_decay: f64,
    /// Seed for exploration and outcome noise; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 100,
            steps_per_episode: 1,
            min_epsilon: 0.01,
            epsilon_decay: 0.995,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub episodes: usize,
    pub steps: usize,
    /// Sum of rewards per episode.
    pub episode_rewards: Vec<f64>,
    /// Exploration rate after the last decay.
    pub final_epsilon: f64,
    /// States the policy has experience for after training.
    pub known_states: usize,
    pub summary: SessionSummary,
}

impl TrainingReport {
    #[must_use]
    pub fn mean_episode_reward(&self) -> f64 {
        if self.episode_rewards.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.episode_rewards.iter().sum::<f64>() / self.episode_rewards.len() as f64
        }
    }
}

pub struct Trainer<'a, P: Policy> {
    config: TrainingConfig,
    env: &'a mut SimulationEnvironment,
    policy: &'a mut P,
}

impl<'a, P: Policy> Trainer<'a, P> {
    /// # Errors
    /// [`SimError::Config`] if the policy's dimensions do not match the
    /// encoder and the environment, or if an episode would have no steps.
    pub fn new(
        config: TrainingConfig,
        env: &'a mut SimulationEnvironment,
        policy: &'a mut P,
    ) -> Result<Self> {
        if policy.state_size() != STATE_SIZE {
            return Err(SimError::Config(format!(
                "policy expects {} state components, encoder produces {STATE_SIZE}",
                policy.state_size()
            )));
        }
        if policy.action_count() != env.action_count() {
            return Err(SimError::Config(format!(
                "policy has {} actions, environment has {}",
                policy.action_count(),
                env.action_count()
            )));
        }
        if config.steps_per_episode == 0 {
            return Err(SimError::Config("steps_per_episode must be at least 1".into()));
        }
        Ok(Self {
            config,
            env,
            policy,
        })
    }

    /// Run all episodes, each starting from a copy of `start`.
    pub fn run(&mut self, start: &HealthState) -> TrainingReport {
        let duration = self.env.config().duration_secs;
        let mut report = TrainingReport::default();

        for episode in 0..self.config.episodes {
            let mut state = self.env.reset(start.clone());
            let mut episode_reward = 0.0;

            for _ in 0..self.config.steps_per_episode {
                let action = self.policy.choose_action(&state);
                let result = self.env.step(action, duration);
                self.policy
                    .learn(&state, action, result.reward, &result.next_state);
                report.summary.record(
                    &result.info.metrics,
                    result.reward,
                    result.info.exercise_completed,
                );
                episode_reward += result.reward;
                report.steps += 1;
                state = result.next_state;
            }

            self.env.finish();
            self.policy
                .decay_epsilon(self.config.min_epsilon, self.config.epsilon_decay);
            debug_event!("episode {} finished with reward {:.2}", episode, episode_reward);
            report.episode_rewards.push(episode_reward);
            report.episodes += 1;
        }

        report.final_epsilon = self.policy.exploration_rate();
        report.known_states = self.policy.known_states();
        report
    }
}
