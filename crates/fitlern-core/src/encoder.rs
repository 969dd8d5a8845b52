//! Abbildung von Gesundheitszustand und Kontext auf einen normierten
//! Zustandsvektor und dessen diskretisierten Tabellenschlüssel.
//!
//! Jedes Merkmal wird erst begrenzt und dann normiert, sodass alle
//! Komponenten auch bei unsinnigen Eingaben in `[0, 1]` liegen. Die
//! Rundungsgenauigkeit beim Diskretisieren steuert, wie groß die Q-Tabelle
//! wird: [`DEFAULT_PRECISION`] (zwei Nachkommastellen) ist der Standard.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::health::{HealthState, SessionContext};

/// Anzahl der Komponenten eines [`StateVector`].
pub const STATE_SIZE: usize = 11;

/// Standard-Rundungsgenauigkeit (Nachkommastellen) für [`discretize`].
pub const DEFAULT_PRECISION: u32 = 2;

/// Obergrenze für die Genauigkeit; darüber würden die Ganzzahl-Ticks
/// unnötig groß.
pub const MAX_PRECISION: u32 = 9;

/// Normierter Zustandsvektor fester Länge, alle Komponenten in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector([f64; STATE_SIZE]);

impl Deref for StateVector {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl AsRef<[f64]> for StateVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Diskretisierter, hashbarer Schlüssel eines Zustandsvektors.
///
/// Intern als Ganzzahl-Ticks (`round(v * 10^precision)`) gespeichert, damit
/// `Eq`, `Hash` und `Ord` ohne Gleitkomma-Fallstricke funktionieren. Die
/// Reihenfolge der Komponenten bleibt erhalten.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey(Vec<i64>);

impl StateKey {
    #[must_use]
    pub fn ticks(&self) -> &[i64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Liefert die gerundeten Gleitkommawerte zurück, aus denen der Schlüssel
    /// entstanden ist.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_values(&self, precision: u32) -> Vec<f64> {
        let scale = scale(precision);
        self.0.iter().map(|&t| t as f64 / scale).collect()
    }
}

/// Kodiert Gesundheitszustand und Kontext als [`StateVector`].
///
/// Reihenfolge: Fitness/10, Ermüdung/10, Erholung/100, Puls/200 (gekappt),
/// Form/100, Verletzungsrisiko/100, Tage seit Training/14 (gekappt),
/// Serie/30 (gekappt), bevorzugte Intensität/3, Tageszeit, Wochenbelastung.
#[must_use]
pub fn encode(health: &HealthState, context: &SessionContext) -> StateVector {
    StateVector([
        unit(health.fitness_level, 10.0),
        unit(health.fatigue_level, 10.0),
        unit(health.recovery_score, 100.0),
        unit(health.heart_rate, 200.0),
        unit(health.form_quality_avg, 100.0),
        unit(health.injury_risk_score, 100.0),
        unit(health.days_since_workout, 14.0),
        unit(health.current_streak, 30.0),
        unit(health.preferred_intensity, 3.0),
        unit(context.time_of_day, 1.0),
        unit(context.weekly_load, 1.0),
    ])
}

/// Rundet jede Komponente auf `precision` Nachkommastellen.
///
/// `precision` wird auf [`MAX_PRECISION`] begrenzt.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn discretize(vector: &[f64], precision: u32) -> StateKey {
    let scale = scale(precision);
    StateKey(vector.iter().map(|v| (v * scale).round() as i64).collect())
}

fn scale(precision: u32) -> f64 {
    // MAX_PRECISION <= 9 passt sicher in i32.
    #[allow(clippy::cast_possible_wrap)]
    let exp = precision.min(MAX_PRECISION) as i32;
    10f64.powi(exp)
}

/// Begrenzen, dann normieren. NaN zählt als 0.
fn unit(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max) / max
}
