use fitlern_agent::{AgentConfig, QLearningAgent};
use fitlern_core::{HealthState, Policy};
use fitlern_sim::{SimulationConfig, SimulationEnvironment, Trainer, TrainingConfig};

fn env(seed: u64) -> SimulationEnvironment {
    SimulationEnvironment::with_seed(
        SimulationConfig {
            time_of_day: Some(0.5),
            ..SimulationConfig::default()
        },
        seed,
    )
}

#[test]
fn training_fills_the_table_and_decays_epsilon() {
    let mut env = env(5);
    let mut agent = QLearningAgent::with_seed(
        AgentConfig {
            epsilon: 0.5,
            ..AgentConfig::default()
        },
        5,
    )
    .expect("valid config");
    let config = TrainingConfig {
        episodes: 30,
        steps_per_episode: 5,
        min_epsilon: 0.05,
        epsilon_decay: 0.9,
        seed: None,
    };

    let report = Trainer::new(config, &mut env, &mut agent)
        .expect("dimensions match")
        .run(&HealthState::default());

    assert_eq!(report.episodes, 30);
    assert_eq!(report.steps, 150);
    assert_eq!(report.summary.steps, 150);
    assert!(report.mean_episode_reward().is_finite());
    assert!(!agent.table().is_empty());
    assert_eq!(report.known_states, agent.table().len());
    assert!((report.final_epsilon - agent.epsilon()).abs() < f64::EPSILON);
    assert!(agent.epsilon() < 0.5);
    assert!(agent.epsilon() >= 0.05);
}

#[test]
fn seeded_training_is_reproducible() {
    let train = || {
        let mut env = env(11);
        let mut agent =
            QLearningAgent::with_seed(AgentConfig::default(), 11).expect("valid config");
        let report = Trainer::new(TrainingConfig::default(), &mut env, &mut agent)
            .expect("dimensions match")
            .run(&HealthState::default());
        (report, agent.snapshot().entries)
    };
    assert_eq!(train(), train());
}

#[test]
fn agent_with_fewer_actions_is_rejected() {
    let mut env = env(1);
    let mut agent = QLearningAgent::with_seed(
        AgentConfig {
            action_count: 3,
            ..AgentConfig::default()
        },
        1,
    )
    .expect("valid config");
    assert_eq!(agent.action_count(), 3);
    assert!(Trainer::new(TrainingConfig::default(), &mut env, &mut agent).is_err());
}
