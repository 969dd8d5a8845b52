//! Datenstrukturen für den physiologischen Zustand eines Nutzers und für
//! Messwerte, die von außerhalb des Kerns eintreffen.
//!
//! [`HealthState`] kommt typischerweise aus einem Nutzerprofil (Datenbank,
//! JSON-Datei), [`OutcomeMetrics`] aus einer Wahrnehmungs-Pipeline (Kamera,
//! Pulsmessung) oder aus der Simulation. Beide Strukturen sind flach und
//! serde-kompatibel.

use serde::{Deserialize, Serialize};

/// Gültiger Bereich für Formwerte (Prozent).
pub const FORM_RANGE: (f64, f64) = (0.0, 100.0);
/// Gültiger Bereich für das Verletzungsrisiko (Prozent).
pub const INJURY_RANGE: (f64, f64) = (0.0, 100.0);
/// Physiologischer Bereich für die Herzfrequenz (Schläge pro Minute).
pub const HEART_RATE_RANGE: (f64, f64) = (55.0, 190.0);

/// Veränderlicher Gesundheitszustand eines Nutzers während einer Episode.
///
/// Fehlende Felder in eingehendem JSON werden mit den Werten aus
/// [`HealthState::default`] belegt:
///
/// | Feld                  | Default |
/// |-----------------------|---------|
/// | `fitness_level`       | 5.0     |
/// | `fatigue_level`       | 2.0     |
/// | `recovery_score`      | 70.0    |
/// | `heart_rate`          | 90.0    |
/// | `form_quality_avg`    | 60.0    |
/// | `injury_risk_score`   | 10.0    |
/// | `days_since_workout`  | 1.0     |
/// | `current_streak`      | 2.0     |
/// | `preferred_intensity` | 2.0     |
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HealthState {
    /// Allgemeines Fitnessniveau, 0 bis 10.
    pub fitness_level: f64,
    /// Ermüdung, 0 bis 10.
    pub fatigue_level: f64,
    /// Erholungswert, 0 bis 100.
    pub recovery_score: f64,
    /// Zuletzt gemessene Herzfrequenz in bpm.
    pub heart_rate: f64,
    /// Gleitender Durchschnitt der Ausführungsqualität, 0 bis 100.
    pub form_quality_avg: f64,
    /// Geglättetes Verletzungsrisiko, 0 bis 100.
    pub injury_risk_score: f64,
    /// Tage seit dem letzten Training.
    pub days_since_workout: f64,
    /// Aktuelle Serie von Trainingstagen.
    pub current_streak: f64,
    /// Bevorzugte Intensität, 0 bis 3.
    pub preferred_intensity: f64,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            fitness_level: 5.0,
            fatigue_level: 2.0,
            recovery_score: 70.0,
            heart_rate: 90.0,
            form_quality_avg: 60.0,
            injury_risk_score: 10.0,
            days_since_workout: 1.0,
            current_streak: 2.0,
            preferred_intensity: 2.0,
        }
    }
}

/// Kontextmerkmale, die nicht zum Gesundheitszustand gehören.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionContext {
    /// Tageszeit als Bruchteil des Tages (Stunde / 24).
    pub time_of_day: f64,
    /// Rollierende Wochenbelastung in `[0, 1]`.
    pub weekly_load: f64,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            time_of_day: 0.5,
            weekly_load: 0.5,
        }
    }
}

/// Skalare Zusammenfassung einer Übungsausführung.
///
/// Entweder simuliert oder von einer externen Wahrnehmungs-Pipeline gemessen;
/// der Kern unterscheidet die beiden Quellen nicht.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OutcomeMetrics {
    pub form_score: f64,
    pub injury_risk: f64,
    pub heart_rate: f64,
}

impl OutcomeMetrics {
    /// Begrenzt alle Werte auf ihren physiologischen Bereich.
    ///
    /// Nicht-endliche Werte fallen auf die untere Grenze zurück.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            form_score: clamp_range(self.form_score, FORM_RANGE),
            injury_risk: clamp_range(self.injury_risk, INJURY_RANGE),
            heart_rate: clamp_range(self.heart_rate, HEART_RATE_RANGE),
        }
    }
}

fn clamp_range(value: f64, (lo, hi): (f64, f64)) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}
