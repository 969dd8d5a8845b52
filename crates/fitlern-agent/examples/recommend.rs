//! Reads a health profile as JSON from stdin and prints a recommendation record.
//!
//! Run with: echo '{"fatigue_level": 6.0}' | cargo run -p fitlern-agent --example recommend

use std::io::{self, Read};

use fitlern_agent::{AgentConfig, QLearningAgent};
use fitlern_core::{encode, DefaultCatalog, HealthState, Recommendation, SessionContext};
use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[derive(Serialize)]
struct RecommendationRecord {
    ts: String,
    policy: String,
    profile: HealthState,
    recommendation: Recommendation,
}

fn rfc3339_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let profile = if input.trim().is_empty() {
        HealthState::default()
    } else {
        serde_json::from_str::<HealthState>(&input)?
    };

    let mut agent = QLearningAgent::new(AgentConfig::default())?;
    let state = encode(&profile, &SessionContext::default());
    let recommendation = agent.recommend(&state, &DefaultCatalog);

    let record = RecommendationRecord {
        ts: rfc3339_now(),
        policy: "fitlern-agent".to_string(),
        profile,
        recommendation,
    };

    serde_json::to_writer_pretty(io::stdout(), &record)?;
    println!();

    Ok(())
}
