//! Shows how the six reward terms add up for a few typical steps.
//!
//! Run with: cargo run -p fitlern-feedback --example reward_breakdown

use fitlern_core::OutcomeMetrics;
use fitlern_feedback::{performance_score, RewardCalculator, RewardSignals, SessionSummary};

fn main() {
    println!("=== fitlern: reward breakdown ===\n");

    let steps = [
        ("light squats", 10.0, 60.0, 10.0, 2.0, 0.2, 95.0),
        ("hard burpees", 30.0, 70.0, 15.0, 4.0, 1.0, 130.0),
        ("burpees, poor form", 30.0, 35.0, 30.0, 8.0, 1.0, 150.0),
        ("rest", 0.0, 55.0, 0.0, 1.0, 0.2, 70.0),
    ];

    let calc = RewardCalculator::default();
    let mut summary = SessionSummary::default();

    for (label, base, form, injury, fatigue, bonus, heart) in steps {
        let signals = RewardSignals {
            base_reward: base,
            form_score: form,
            injury_risk: injury,
            fatigue_level: fatigue,
            recovery_score: 70.0,
            progression_bonus: bonus,
        };
        let b = calc.breakdown(&signals);
        let reward = b.total();
        println!("{label}");
        println!(
            "  base {:+.1}  form {:+.1}  injury {:+.1}  fatigue {:+.1}  recovery {:+.1}  progression {:+.1}",
            b.base, b.form, b.injury, b.fatigue, b.recovery, b.progression
        );
        println!(
            "  reward {reward:.2}  score {:.0}\n",
            performance_score(reward)
        );

        summary.record(
            &OutcomeMetrics {
                form_score: form,
                injury_risk: injury,
                heart_rate: heart,
            },
            reward,
            base > 0.0,
        );
    }

    println!(
        "session: {} steps, {} exercises, avg reward {:.2}, score {:.0}, max injury risk {:.0}",
        summary.steps,
        summary.exercises_completed,
        summary.average_reward(),
        summary.performance_score(),
        summary.max_injury_risk
    );
}
