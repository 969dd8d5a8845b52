//! Kerntypen für fitlern: Gesundheitszustand, Zustandskodierung,
//! Übungskatalog und das [`Policy`]-Trait, über das Agent und Umgebung
//! entkoppelt sind.

use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod encoder;
pub mod health;

pub use catalog::{DefaultCatalog, ExerciseCatalog, ExerciseDescriptor};
pub use encoder::{discretize, encode, StateKey, StateVector, DEFAULT_PRECISION, STATE_SIZE};
pub use health::{HealthState, OutcomeMetrics, SessionContext};

/// Empfehlung an den Aufrufer: Aktion, Übung, Konfidenz und Begründung.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Recommendation {
    pub action: usize,
    pub exercise: ExerciseDescriptor,
    pub confidence: f64,
    pub why: String,
}

/// Lernende Entscheidungsregel über Zustandsvektoren.
///
/// Implementierungen sehen nur Vektoren und Skalare, nie die Semantik des
/// Gesundheitszustands.
pub trait Policy {
    fn state_size(&self) -> usize;
    fn action_count(&self) -> usize;
    fn choose_action(&mut self, state: &[f64]) -> usize;
    fn learn(&mut self, state: &[f64], action: usize, reward: f64, next_state: &[f64]);
    fn action_confidence(&self, state: &[f64], action: usize) -> f64;
    fn decay_epsilon(&mut self, min_epsilon: f64, decay_factor: f64);
    /// Aktuelle Explorationsrate.
    fn exploration_rate(&self) -> f64;
    /// Anzahl der Zustände, für die Erfahrung vorliegt.
    fn known_states(&self) -> usize;
}
