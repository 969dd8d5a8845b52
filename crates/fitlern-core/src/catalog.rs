//! Übungskatalog: Abbildung eines Aktionsindex auf eine Übungsbeschreibung.
//!
//! Der Katalog reichert Empfehlungen nur an; auf das Lernen hat er keinen
//! Einfluss. Externe Kataloge (z. B. aus einer Datenbank) implementieren
//! [`ExerciseCatalog`].

use serde::{Deserialize, Serialize};

/// Namen der Standardübungen, indiziert nach Aktion.
pub const EXERCISE_NAMES: [&str; 5] = ["Rest", "Squat", "Pushup", "Burpees", "Rehab Mobility"];

/// Anzahl der Aktionen im Standardkatalog.
pub const DEFAULT_ACTION_COUNT: usize = EXERCISE_NAMES.len();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Recovery,
    Strength,
    Cardio,
    Mobility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    None,
    Low,
    Medium,
    High,
}

/// Beschreibung einer Übung, wie sie einem Nutzer empfohlen wird.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDescriptor {
    pub action: usize,
    pub name: String,
    pub category: Category,
    pub intensity: Intensity,
    /// Empfohlene Dauer in Sekunden.
    pub duration_secs: u32,
    /// Sicherheitshinweise, z. B. `"high-impact"`.
    pub safety_tags: Vec<String>,
}

/// Quelle für Übungsbeschreibungen.
pub trait ExerciseCatalog {
    /// Anzahl der beschriebenen Aktionen.
    fn len(&self) -> usize;

    /// Beschreibung für `action`; Indizes außerhalb des Bereichs werden auf
    /// die letzte gültige Aktion begrenzt.
    fn describe(&self, action: usize) -> ExerciseDescriptor;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Eingebauter Katalog mit fünf Intensitätsstufen einschließlich Pause.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCatalog;

struct Entry {
    category: Category,
    intensity: Intensity,
    duration_secs: u32,
    safety_tags: &'static [&'static str],
}

const ENTRIES: [Entry; DEFAULT_ACTION_COUNT] = [
    Entry {
        category: Category::Recovery,
        intensity: Intensity::None,
        duration_secs: 60,
        safety_tags: &["recovery"],
    },
    Entry {
        category: Category::Strength,
        intensity: Intensity::Low,
        duration_secs: 120,
        safety_tags: &["knee-load"],
    },
    Entry {
        category: Category::Strength,
        intensity: Intensity::Medium,
        duration_secs: 120,
        safety_tags: &["wrist-load", "shoulder-load"],
    },
    Entry {
        category: Category::Cardio,
        intensity: Intensity::High,
        duration_secs: 120,
        safety_tags: &["high-impact", "joint-stress"],
    },
    Entry {
        category: Category::Mobility,
        intensity: Intensity::Low,
        duration_secs: 120,
        safety_tags: &["injury-safe", "low-impact"],
    },
];

impl ExerciseCatalog for DefaultCatalog {
    fn len(&self) -> usize {
        DEFAULT_ACTION_COUNT
    }

    fn describe(&self, action: usize) -> ExerciseDescriptor {
        let action = action.min(DEFAULT_ACTION_COUNT - 1);
        let entry = &ENTRIES[action];
        ExerciseDescriptor {
            action,
            name: EXERCISE_NAMES[action].to_string(),
            category: entry.category,
            intensity: entry.intensity,
            duration_secs: entry.duration_secs,
            safety_tags: entry.safety_tags.iter().map(|t| (*t).to_string()).collect(),
        }
    }
}

/// Name der Übung für `action`, begrenzt auf den Standardbereich.
#[must_use]
pub fn exercise_name(action: usize) -> &'static str {
    EXERCISE_NAMES[action.min(DEFAULT_ACTION_COUNT - 1)]
}
