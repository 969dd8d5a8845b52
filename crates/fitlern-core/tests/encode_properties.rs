//! Eigenschaften der Zustandskodierung über beliebige Eingaben.

use fitlern_core::{discretize, encode, HealthState, SessionContext, DEFAULT_PRECISION, STATE_SIZE};
use proptest::prelude::*;

fn health_strategy() -> impl Strategy<Value = HealthState> {
    (
        (-50.0f64..50.0, -50.0f64..50.0, -500.0f64..500.0),
        (0.0f64..400.0, -100.0f64..300.0, -100.0f64..300.0),
        (-10.0f64..1000.0, -10.0f64..1000.0, -5.0f64..10.0),
    )
        .prop_map(
            |(
                (fitness_level, fatigue_level, recovery_score),
                (heart_rate, form_quality_avg, injury_risk_score),
                (days_since_workout, current_streak, preferred_intensity),
            )| HealthState {
                fitness_level,
                fatigue_level,
                recovery_score,
                heart_rate,
                form_quality_avg,
                injury_risk_score,
                days_since_workout,
                current_streak,
                preferred_intensity,
            },
        )
}

proptest! {
    #[test]
    fn every_component_lies_in_unit_interval(
        health in health_strategy(),
        time_of_day in -2.0f64..3.0,
        weekly_load in -2.0f64..3.0,
    ) {
        let v = encode(&health, &SessionContext { time_of_day, weekly_load });
        prop_assert_eq!(v.len(), STATE_SIZE);
        for c in v.iter() {
            prop_assert!((0.0..=1.0).contains(c), "component out of range: {}", c);
        }
    }

    #[test]
    fn encode_then_discretize_is_deterministic(
        health in health_strategy(),
        time_of_day in 0.0f64..1.0,
        weekly_load in 0.0f64..1.0,
    ) {
        let context = SessionContext { time_of_day, weekly_load };
        let a = discretize(&encode(&health, &context), DEFAULT_PRECISION);
        let b = discretize(&encode(&health, &context), DEFAULT_PRECISION);
        prop_assert_eq!(a, b);
    }
}
