//! Tabellarischer ε-greedy Q-Learning-Agent.
//!
//! Der [`QLearningAgent`] implementiert das [`Policy`]-Trait aus
//! `fitlern-core`. Er diskretisiert Zustandsvektoren zu [`StateKey`]s,
//! wählt mit Wahrscheinlichkeit `epsilon` eine zufällige Aktion und sonst die
//! Aktion mit dem höchsten Q-Wert, und lernt über das einschrittige
//! Q-Learning-Update.
//!
//! Laden ist nachsichtig: eine fehlende oder kaputte Datei führt
//! nie zu einem Fehler, sondern zu einem Kaltstart mit leerer Tabelle.

#![warn(clippy::unwrap_used, clippy::expect_used)]

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use fitlern_core::catalog::DEFAULT_ACTION_COUNT;
use fitlern_core::encoder::MAX_PRECISION;
use fitlern_core::{
    discretize, ExerciseCatalog, Policy, Recommendation, StateKey, DEFAULT_PRECISION, STATE_SIZE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub mod error;
pub mod qtable;
pub mod snapshot;

pub use error::{AgentError, Result};
pub use qtable::QTable;
pub use snapshot::QTableSnapshot;

use qtable::{argmax, max_value};

/// Konfidenz für Zustände ohne Erfahrung.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Verhindert Division durch null bei der Konfidenzberechnung.
const CONFIDENCE_EPS: f64 = 1e-6;

macro_rules! warn_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        tracing::warn!($($arg)*);
        #[cfg(not(feature = "telemetry"))]
        eprintln!($($arg)*);
    }};
}

macro_rules! debug_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        tracing::debug!($($arg)*);
        #[cfg(not(feature = "telemetry"))]
        let _ = format_args!($($arg)*);
    }};
}

/// Hyperparameter und Dimensionen des Agenten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub state_size: usize,
    pub action_count: usize,
    /// Lernrate α in `(0, 1]`.
    pub alpha: f64,
    /// Diskontfaktor γ in `[0, 1]`.
    pub gamma: f64,
    /// Start-Explorationsrate in `[0, 1]`.
    pub epsilon: f64,
    /// Nachkommastellen für die Diskretisierung.
    pub precision: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            state_size: STATE_SIZE,
            action_count: DEFAULT_ACTION_COUNT,
            alpha: 0.1,
            gamma: 0.95,
            epsilon: 0.1,
            precision: DEFAULT_PRECISION,
        }
    }
}

impl AgentConfig {
    /// Prüft, ob die Dimensionen zum Zustandskodierer und zum Aktionsraum
    /// des Aufrufers passen.
    ///
    /// # Errors
    /// [`AgentError::Config`] bei Abweichung.
    pub fn ensure_dimensions(&self, state_size: usize, action_count: usize) -> Result<()> {
        if self.state_size != state_size {
            return Err(AgentError::Config(format!(
                "state_size must be {state_size}, got {}",
                self.state_size
            )));
        }
        if self.action_count != action_count {
            return Err(AgentError::Config(format!(
                "action_count must be {action_count}, got {}",
                self.action_count
            )));
        }
        Ok(())
    }

    /// Prüft Dimensionen und Wertebereiche.
    ///
    /// # Errors
    /// [`AgentError::Config`] bei ungültigen Werten.
    pub fn validate(&self) -> Result<()> {
        if self.state_size == 0 {
            return Err(AgentError::Config("state_size must be at least 1".into()));
        }
        if self.action_count == 0 {
            return Err(AgentError::Config("action_count must be at least 1".into()));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(AgentError::Config(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(AgentError::Config(format!(
                "gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(AgentError::Config(format!(
                "epsilon must be in [0, 1], got {}",
                self.epsilon
            )));
        }
        if self.precision > MAX_PRECISION {
            return Err(AgentError::Config(format!(
                "precision must be at most {MAX_PRECISION}, got {}",
                self.precision
            )));
        }
        Ok(())
    }
}

/// Ergebnis eines Ladeversuchs. Laden schlägt nie fehl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Tabelle wiederhergestellt.
    Restored { states: usize },
    /// Keine oder unbrauchbare Daten; der Agent startet mit leerer Tabelle.
    ColdStart { reason: String },
}

impl LoadOutcome {
    #[must_use]
    pub fn is_cold_start(&self) -> bool {
        matches!(self, Self::ColdStart { .. })
    }
}

/// ε-greedy Q-Learning über diskretisierte Zustände.
#[derive(Debug)]
pub struct QLearningAgent {
    config: AgentConfig,
    epsilon: f64,
    table: QTable,
    rng: StdRng,
}

impl QLearningAgent {
    /// Erstellt einen Agenten mit zufällig initialisierter Zufallsquelle.
    ///
    /// # Errors
    /// [`AgentError::Config`], wenn die Konfiguration ungültig ist.
    pub fn new(config: AgentConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Wie [`QLearningAgent::new`], aber reproduzierbar über `seed`.
    ///
    /// # Errors
    /// [`AgentError::Config`], wenn die Konfiguration ungültig ist.
    pub fn with_seed(config: AgentConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: AgentConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            epsilon: config.epsilon,
            table: QTable::new(config.action_count),
            config,
            rng,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[must_use]
    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Q-Werte eines Zustands, falls bekannt.
    #[must_use]
    pub fn q_values(&self, state: &[f64]) -> Option<&[f64]> {
        self.table.get(&self.key(state))
    }

    /// Schlüssel für `state`. Vektoren mit abweichender Länge werden auf
    /// `state_size` Komponenten gekürzt oder mit Nullen aufgefüllt.
    fn key(&self, state: &[f64]) -> StateKey {
        let size = self.config.state_size;
        if state.len() == size {
            return discretize(state, self.config.precision);
        }
        let mut fitted = state[..state.len().min(size)].to_vec();
        fitted.resize(size, 0.0);
        discretize(&fitted, self.config.precision)
    }

    fn clamp_action(&self, action: usize) -> usize {
        action.min(self.config.action_count - 1)
    }

    /// ε-greedy Aktionswahl.
    pub fn choose_action(&mut self, state: &[f64]) -> usize {
        if self.rng.gen::<f64>() < self.epsilon {
            return self.rng.gen_range(0..self.config.action_count);
        }
        self.greedy_action(state)
    }

    /// Aktion mit dem höchsten Q-Wert, ohne Exploration.
    pub fn greedy_action(&mut self, state: &[f64]) -> usize {
        let key = self.key(state);
        argmax(self.table.row_mut(key))
    }

    /// Einschrittiges Q-Learning-Update:
    /// `Q[s][a] += α · (r + γ · max Q[s'] − Q[s][a])`.
    ///
    /// Aktionen außerhalb des Bereichs werden begrenzt; nicht-endliche
    /// Belohnungen werden verworfen.
    pub fn learn(&mut self, state: &[f64], action: usize, reward: f64, next_state: &[f64]) {
        if !reward.is_finite() {
            warn_event!("ignoring non-finite reward {} in q-learning update", reward);
            return;
        }
        let action = self.clamp_action(action);
        let next_key = self.key(next_state);
        let key = self.key(state);

        let next_max = max_value(self.table.row_mut(next_key));
        let td_target = reward + self.config.gamma * next_max;
        let alpha = self.config.alpha;
        let row = self.table.row_mut(key);
        let current = row[action];
        row[action] = current + alpha * (td_target - current);
    }

    /// `epsilon = max(min_epsilon, epsilon · decay_factor)`, steigt aber nie.
    pub fn decay_epsilon(&mut self, min_epsilon: f64, decay_factor: f64) {
        let factor = if decay_factor.is_nan() {
            1.0
        } else {
            decay_factor.clamp(0.0, 1.0)
        };
        let floor = if min_epsilon.is_nan() {
            0.0
        } else {
            min_epsilon.clamp(0.0, 1.0)
        };
        self.epsilon = (self.epsilon * factor).max(floor).min(self.epsilon);
    }

    /// Konfidenz in `[0, 1]`: `0.5 + 0.5 · Q[s][a] / (max|Q[s]| + ε)`.
    ///
    /// Für unbekannte Zustände genau [`NEUTRAL_CONFIDENCE`].
    #[must_use]
    pub fn get_action_confidence(&self, state: &[f64], action: usize) -> f64 {
        let Some(row) = self.table.get(&self.key(state)) else {
            return NEUTRAL_CONFIDENCE;
        };
        let max_abs = row.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let q = row[self.clamp_action(action)];
        (NEUTRAL_CONFIDENCE + NEUTRAL_CONFIDENCE * (q / (max_abs + CONFIDENCE_EPS))).clamp(0.0, 1.0)
    }

    /// Greedy-Empfehlung, angereichert über den Katalog.
    ///
    /// Nur Aktionen, die `catalog` beschreibt, kommen in Frage, damit
    /// `action` und `exercise.action` übereinstimmen.
    pub fn recommend(&mut self, state: &[f64], catalog: &impl ExerciseCatalog) -> Recommendation {
        let key = self.key(state);
        let seen = self.table.contains(&key);
        let offered = catalog.len().clamp(1, self.config.action_count);
        let action = argmax(&self.table.row_mut(key)[..offered]);
        let confidence = self.get_action_confidence(state, action);
        let exercise = catalog.describe(action);
        let why = if seen {
            format!("exploit q-table (best of {offered} actions)")
        } else {
            "cold start: no experience for this state yet".to_string()
        };
        Recommendation {
            action: exercise.action,
            exercise,
            confidence,
            why,
        }
    }

    /// Schreibt die Tabelle samt Metadaten in `writer`.
    ///
    /// # Errors
    /// [`AgentError::Snapshot`] oder [`AgentError::Io`].
    pub fn save_to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let snap = self.snapshot();
        serde_json::to_writer(writer, &snap)?;
        Ok(())
    }

    /// Speichert die Tabelle atomar: erst in eine temporäre Datei im selben
    /// Verzeichnis, dann per `rename` über das Ziel.
    ///
    /// # Errors
    /// [`AgentError::Io`] oder [`AgentError::Snapshot`]; die temporäre Datei
    /// wird in jedem Fall entfernt.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = temp_path(path);
        let written = (|| -> Result<()> {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            self.save_to_writer(&mut writer)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            Ok(())
        })();
        if let Err(e) = written.and_then(|()| fs::rename(&tmp, path).map_err(AgentError::from)) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        debug_event!("saved q-table with {} states to {:?}", self.table.len(), path);
        Ok(())
    }

    /// Aktueller Stand als [`QTableSnapshot`].
    #[must_use]
    pub fn snapshot(&self) -> QTableSnapshot {
        QTableSnapshot::capture(&self.table, self.config.state_size, self.config.precision)
    }

    /// Liest eine Tabelle aus `reader`. Schlägt nie fehl: bei unlesbaren
    /// oder unpassenden Daten bleibt eine leere Tabelle zurück.
    pub fn load_from_reader<R: Read>(&mut self, reader: R) -> LoadOutcome {
        let restored = serde_json::from_reader::<_, QTableSnapshot>(reader)
            .map_err(AgentError::from)
            .and_then(|snap| {
                snap.restore(
                    self.config.state_size,
                    self.config.action_count,
                    self.config.precision,
                )
            });
        match restored {
            Ok(table) => {
                let states = table.len();
                self.table = table;
                LoadOutcome::Restored { states }
            }
            Err(e) => {
                warn_event!("q-table unusable, starting cold: {}", e);
                self.table.clear();
                LoadOutcome::ColdStart {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Lädt eine Tabelle aus `path`; siehe [`QLearningAgent::load_from_reader`].
    pub fn load(&mut self, path: &Path) -> LoadOutcome {
        match File::open(path) {
            Ok(file) => self.load_from_reader(BufReader::new(file)),
            Err(e) => {
                debug_event!("no q-table at {:?} ({}), starting cold", path, e);
                self.table.clear();
                LoadOutcome::ColdStart {
                    reason: format!("cannot open {}: {e}", path.display()),
                }
            }
        }
    }
}

/// `<name>.tmp` neben dem Ziel; eindeutig pro Zieldatei.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsStr::to_os_string).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl Policy for QLearningAgent {
    fn state_size(&self) -> usize {
        self.config.state_size
    }

    fn action_count(&self) -> usize {
        self.config.action_count
    }

    fn choose_action(&mut self, state: &[f64]) -> usize {
        QLearningAgent::choose_action(self, state)
    }

    fn learn(&mut self, state: &[f64], action: usize, reward: f64, next_state: &[f64]) {
        QLearningAgent::learn(self, state, action, reward, next_state);
    }

    fn action_confidence(&self, state: &[f64], action: usize) -> f64 {
        self.get_action_confidence(state, action)
    }

    fn decay_epsilon(&mut self, min_epsilon: f64, decay_factor: f64) {
        QLearningAgent::decay_epsilon(self, min_epsilon, decay_factor);
    }

    fn exploration_rate(&self) -> f64 {
        self.epsilon
    }

    fn known_states(&self) -> usize {
        self.table.len()
    }
}
