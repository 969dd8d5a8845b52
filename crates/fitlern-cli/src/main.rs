//! CLI for fitlern.
//!
//! Trains a user's Q-table in simulation, asks it for a recommendation, or runs
//! one simulated session that learns from its own outcome. Every command prints
//! exactly one JSON record on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fitlern_agent::{AgentConfig, LoadOutcome, QLearningAgent};
use fitlern_core::{DefaultCatalog, ExerciseCatalog, HealthState, Recommendation, STATE_SIZE};
use fitlern_feedback::SessionSummary;
use fitlern_sim::{SimulationConfig, SimulationEnvironment, StepResult, Trainer, TrainingConfig};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::info;
use tracing_subscriber::EnvFilter;

const TABLE_SUFFIX: &str = ".qtable.json";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the user's Q-table in simulation
    Train {
        #[command(flatten)]
        common: CommonArgs,

        /// Number of episodes (overrides the config file)
        #[arg(long)]
        episodes: Option<usize>,

        /// Steps per episode (overrides the config file)
        #[arg(long)]
        steps: Option<usize>,
    },
    /// Recommend the next exercise without learning
    Recommend {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Recommend, run the exercise in simulation and learn from the outcome
    Session {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// User identifier; names the Q-table file
    #[arg(long)]
    user: String,

    /// Health profile as a JSON file (defaults if absent)
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Directory holding the per-user Q-tables
    #[arg(long, default_value = "data")]
    table_dir: PathBuf,

    /// JSON config file with `agent`, `simulation` and `training` sections
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for exploration and outcome noise (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
struct CliConfig {
    agent: AgentConfig,
    simulation: SimulationConfig,
    training: TrainingConfig,
}

impl CliConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let file = File::open(path)
            .with_context(|| format!("Failed to open config {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Invalid config {}", path.display()))
    }
}

#[derive(Serialize, Debug)]
struct TrainRecord<'a> {
    #[serde(with = "time::serde::rfc3339")]
    ts: OffsetDateTime,
    user: &'a str,
    table: String,
    cold_start: bool,
    episodes: usize,
    steps: usize,
    mean_episode_reward: f64,
    epsilon: f64,
    states: usize,
    summary: &'a SessionSummary,
    performance_score: f64,
}

#[derive(Serialize, Debug)]
struct RecommendRecord<'a> {
    #[serde(with = "time::serde::rfc3339")]
    ts: OffsetDateTime,
    user: &'a str,
    recommendation: &'a Recommendation,
}

#[derive(Serialize, Debug)]
struct SessionRecord<'a> {
    #[serde(with = "time::serde::rfc3339")]
    ts: OffsetDateTime,
    user: &'a str,
    recommendation: &'a Recommendation,
    /// Action actually performed; differs from the recommendation when exploring.
    action: usize,
    explored: bool,
    result: &'a StepResult,
    summary: &'a SessionSummary,
    performance_score: f64,
}

/// Validates a user identifier before it becomes part of a file name.
///
/// Allowed: ASCII alphanumerics, `-`, `_` and `.`, at most 64 characters, not
/// starting with a dot.
fn is_valid_user(user: &str) -> bool {
    !user.is_empty()
        && user.len() <= 64
        && !user.starts_with('.')
        && user
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn table_path(dir: &Path, user: &str) -> Result<PathBuf> {
    if !is_valid_user(user) {
        anyhow::bail!("Invalid user id: {:?}", user);
    }
    Ok(dir.join(format!("{user}{TABLE_SUFFIX}")))
}

fn load_profile(path: Option<&Path>) -> Result<HealthState> {
    let Some(path) = path else {
        return Ok(HealthState::default());
    };
    let file = File::open(path)
        .with_context(|| format!("Failed to open profile {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid profile {}", path.display()))
}

/// Builds the agent and loads its table; a missing or unusable table is a cold start.
///
/// The agent's dimensions must match the state encoder and the default catalog.
fn open_agent(
    config: &AgentConfig,
    seed: Option<u64>,
    table: &Path,
) -> Result<(QLearningAgent, bool)> {
    config
        .ensure_dimensions(STATE_SIZE, DefaultCatalog.len())
        .context("Invalid agent configuration")?;
    let mut agent = match seed {
        Some(seed) => QLearningAgent::with_seed(config.clone(), seed),
        None => QLearningAgent::new(config.clone()),
    }
    .context("Invalid agent configuration")?;

    let cold = match agent.load(table) {
        LoadOutcome::Restored { states } => {
            info!("loaded {} states from {}", states, table.display());
            false
        }
        LoadOutcome::ColdStart { reason } => {
            info!("cold start for {}: {}", table.display(), reason);
            true
        }
    };
    Ok((agent, cold))
}

fn open_env(config: &SimulationConfig, seed: Option<u64>) -> SimulationEnvironment {
    match seed {
        Some(seed) => SimulationEnvironment::with_seed(config.clone(), seed.wrapping_add(1)),
        None => SimulationEnvironment::new(config.clone()),
    }
}

/// One recommend-act-learn cycle.
///
/// The recommendation is greedy; the performed action is epsilon-greedy so that
/// repeated sessions keep exploring.
fn run_session(
    agent: &mut QLearningAgent,
    env: &mut SimulationEnvironment,
    profile: HealthState,
    duration_secs: u32,
) -> (Recommendation, usize, StepResult) {
    let state = env.reset(profile);
    let recommendation = agent.recommend(&state, &DefaultCatalog);
    let action = agent.choose_action(&state);
    if action != recommendation.action {
        info!(
            "exploring action {} instead of recommended {}",
            action, recommendation.action
        );
    }
    let result = env.step(action, duration_secs);
    agent.learn(&state, action, result.reward, &result.next_state);
    env.finish();
    (recommendation, action, result)
}

fn print_record<T: Serialize>(record: &T) -> Result<()> {
    println!("{}", serde_json::to_string(record)?);
    Ok(())
}

fn train(common: &CommonArgs, episodes: Option<usize>, steps: Option<usize>) -> Result<()> {
    let mut config = CliConfig::load(common.config.as_deref())?;
    if let Some(episodes) = episodes {
        config.training.episodes = episodes;
    }
    if let Some(steps) = steps {
        config.training.steps_per_episode = steps;
    }
    let seed = common.seed.or(config.training.seed);
    let table = table_path(&common.table_dir, &common.user)?;
    let profile = load_profile(common.profile.as_deref())?;

    let (mut agent, cold_start) = open_agent(&config.agent, seed, &table)?;
    let mut env = open_env(&config.simulation, seed);
    let report = Trainer::new(config.training.clone(), &mut env, &mut agent)
        .context("Agent and environment do not fit together")?
        .run(&profile);
    agent
        .save(&table)
        .with_context(|| format!("Failed to save {}", table.display()))?;
    info!(
        "trained {} episodes ({} steps) for {}",
        report.episodes, report.steps, common.user
    );

    print_record(&TrainRecord {
        ts: OffsetDateTime::now_utc(),
        user: &common.user,
        table: table.display().to_string(),
        cold_start,
        episodes: report.episodes,
        steps: report.steps,
        mean_episode_reward: report.mean_episode_reward(),
        epsilon: report.final_epsilon,
        states: report.known_states,
        summary: &report.summary,
        performance_score: report.summary.performance_score(),
    })
}

fn recommend(common: &CommonArgs) -> Result<()> {
    let config = CliConfig::load(common.config.as_deref())?;
    let seed = common.seed.or(config.training.seed);
    let table = table_path(&common.table_dir, &common.user)?;
    let profile = load_profile(common.profile.as_deref())?;

    let (mut agent, _) = open_agent(&config.agent, seed, &table)?;
    let mut env = open_env(&config.simulation, seed);
    let state = env.reset(profile);
    let recommendation = agent.recommend(&state, &DefaultCatalog);

    print_record(&RecommendRecord {
        ts: OffsetDateTime::now_utc(),
        user: &common.user,
        recommendation: &recommendation,
    })
}

fn session(common: &CommonArgs) -> Result<()> {
    let config = CliConfig::load(common.config.as_deref())?;
    let seed = common.seed.or(config.training.seed);
    let table = table_path(&common.table_dir, &common.user)?;
    let profile = load_profile(common.profile.as_deref())?;

    let (mut agent, _) = open_agent(&config.agent, seed, &table)?;
    let mut env = open_env(&config.simulation, seed);
    let (recommendation, action, result) = run_session(
        &mut agent,
        &mut env,
        profile,
        config.simulation.duration_secs,
    );

    let mut summary = SessionSummary::default();
    summary.record(
        &result.info.metrics,
        result.reward,
        result.info.exercise_completed,
    );
    agent
        .save(&table)
        .with_context(|| format!("Failed to save {}", table.display()))?;

    print_record(&SessionRecord {
        ts: OffsetDateTime::now_utc(),
        user: &common.user,
        recommendation: &recommendation,
        action,
        explored: action != recommendation.action,
        result: &result,
        summary: &summary,
        performance_score: summary.performance_score(),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Train {
            common,
            episodes,
            steps,
        } => train(common, *episodes, *steps),
        Commands::Recommend { common } => recommend(common),
        Commands::Session { common } => session(common),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_user() {
        assert!(is_valid_user("alice"));
        assert!(is_valid_user("user-42"));
        assert!(is_valid_user("a_b.c"));

        assert!(!is_valid_user(""));
        assert!(!is_valid_user(".hidden"));
        assert!(!is_valid_user("../escape"));
        assert!(!is_valid_user("with space"));
        assert!(!is_valid_user("slash/inside"));
        assert!(!is_valid_user(&"x".repeat(65)));
    }

    #[test]
    fn test_table_path() {
        let path = table_path(Path::new("data"), "alice").unwrap();
        assert_eq!(path, Path::new("data").join("alice.qtable.json"));
        assert!(table_path(Path::new("data"), "../alice").is_err());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: CliConfig =
            serde_json::from_str(r#"{"agent": {"alpha": 0.5}, "training": {"episodes": 3}}"#)
                .unwrap();
        assert_eq!(config.agent.alpha, 0.5);
        assert_eq!(config.agent.action_count, 5);
        assert_eq!(config.training.episodes, 3);
        assert_eq!(config.simulation, SimulationConfig::default());
    }

    #[test]
    fn test_missing_profile_uses_defaults() {
        assert_eq!(load_profile(None).unwrap(), HealthState::default());
        assert!(load_profile(Some(Path::new("/nonexistent/profile.json"))).is_err());
    }

    #[test]
    fn test_mismatched_dimensions_are_rejected() {
        let table = std::env::temp_dir().join("fitlern_test_cli_dims/x.qtable.json");
        for config in [
            AgentConfig {
                state_size: 12,
                ..AgentConfig::default()
            },
            AgentConfig {
                action_count: 7,
                ..AgentConfig::default()
            },
        ] {
            let err = open_agent(&config, Some(1), &table).err().unwrap();
            assert!(format!("{err:#}").contains("Invalid agent configuration"));
        }
    }

    #[test]
    fn test_session_explores_from_cold_start() {
        let config = AgentConfig {
            epsilon: 1.0,
            ..AgentConfig::default()
        };
        let actions: Vec<usize> = (0..20)
            .map(|seed| {
                let mut agent = QLearningAgent::with_seed(config.clone(), seed).unwrap();
                let mut env = open_env(&SimulationConfig::default(), Some(seed));
                let (rec, action, result) =
                    run_session(&mut agent, &mut env, HealthState::default(), 300);
                assert_eq!(rec.action, 0);
                assert_eq!(result.info.requested_action, action);
                action
            })
            .collect();
        assert!(actions.iter().any(|a| *a != 0));
    }

    #[test]
    fn test_greedy_session_performs_the_recommendation() {
        let config = AgentConfig {
            epsilon: 0.0,
            ..AgentConfig::default()
        };
        let mut agent = QLearningAgent::with_seed(config, 5).unwrap();
        let mut env = open_env(&SimulationConfig::default(), Some(5));
        let (rec, action, _) = run_session(&mut agent, &mut env, HealthState::default(), 300);
        assert_eq!(action, rec.action);
        assert!(env.health().is_none());
    }

    #[test]
    fn test_session_round_trip_on_disk() {
        let dir = std::env::temp_dir().join("fitlern_test_cli_session");
        let _ = std::fs::remove_dir_all(&dir);
        let table = table_path(&dir, "bob").unwrap();

        let (mut agent, cold) = open_agent(&AgentConfig::default(), Some(3), &table).unwrap();
        assert!(cold);
        let mut env = open_env(&SimulationConfig::default(), Some(3));
        let state = env.reset(HealthState::default());
        let result = env.step(1, 300);
        agent.learn(&state, 1, result.reward, &result.next_state);
        agent.save(&table).unwrap();

        let (reloaded, cold) = open_agent(&AgentConfig::default(), Some(3), &table).unwrap();
        assert!(!cold);
        assert_eq!(reloaded.table().len(), agent.table().len());
        assert_eq!(reloaded.q_values(&state), agent.q_values(&state));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
