use fitlern_core::{HealthState, OutcomeMetrics, STATE_SIZE};
use fitlern_sim::{SimulationConfig, SimulationEnvironment};
use proptest::prelude::*;

fn config() -> SimulationConfig {
    SimulationConfig {
        time_of_day: Some(0.25),
        ..SimulationConfig::default()
    }
}

proptest! {
    #[test]
    fn simulated_metrics_stay_in_physiological_ranges(
        seed in any::<u64>(),
        action in 0usize..12,
        duration in 0u32..3600,
    ) {
        let mut env = SimulationEnvironment::with_seed(config(), seed);
        env.reset(HealthState::default());
        let result = env.step(action, duration);
        let m = result.info.metrics;
        prop_assert!((0.0..=100.0).contains(&m.form_score));
        prop_assert!((0.0..=100.0).contains(&m.injury_risk));
        prop_assert!((55.0..=190.0).contains(&m.heart_rate));
        prop_assert!(result.info.requested_action <= 4);
        prop_assert!(result.info.adapted_action <= 4);
        prop_assert!(result.reward.is_finite());
        prop_assert!(!result.done);
    }

    #[test]
    fn encoded_states_stay_in_unit_interval_across_an_episode(
        seed in any::<u64>(),
        actions in prop::collection::vec(0usize..5, 1..40),
    ) {
        let mut env = SimulationEnvironment::with_seed(config(), seed);
        let first = env.reset(HealthState::default());
        prop_assert_eq!(first.len(), STATE_SIZE);
        for action in actions {
            let result = env.step(action, 300);
            for v in result.next_state.iter() {
                prop_assert!((0.0..=1.0).contains(v));
            }
            let health = env.health().cloned().unwrap_or_default();
            prop_assert!(health.fatigue_level <= 10.0);
            prop_assert!(result.info.fatigue_increase >= 0.0);
            prop_assert!((0.0..=1.0).contains(&env.weekly_load()));
        }
    }

    #[test]
    fn measured_metrics_are_clamped(
        form in -500.0f64..500.0,
        injury in -500.0f64..500.0,
        heart in -500.0f64..500.0,
    ) {
        let mut env = SimulationEnvironment::with_seed(config(), 3);
        env.reset(HealthState::default());
        let result = env.step_with_metrics(2, 300, OutcomeMetrics {
            form_score: form,
            injury_risk: injury,
            heart_rate: heart,
        });
        let m = result.info.metrics;
        prop_assert!((0.0..=100.0).contains(&m.form_score));
        prop_assert!((0.0..=100.0).contains(&m.injury_risk));
        prop_assert!((55.0..=190.0).contains(&m.heart_rate));
    }
}

#[test]
fn seeded_environments_replay_identically() {
    let run = |seed| {
        let mut env = SimulationEnvironment::with_seed(config(), seed);
        env.reset(HealthState::default());
        (0..20).map(|i| env.step(i % 5, 300)).collect::<Vec<_>>()
    };
    assert_eq!(run(17), run(17));
}
