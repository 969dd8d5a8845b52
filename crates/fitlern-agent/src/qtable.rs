//! Q-Tabelle: Zustandsschlüssel → Aktionswerte fester Länge.

use std::collections::HashMap;

use fitlern_core::StateKey;

/// Abbildung von [`StateKey`] auf genau `action_count` Aktionswerte.
///
/// Zeilen entstehen lazy mit Nullen beim ersten Zugriff über
/// [`QTable::row_mut`]. Jede Zeile hat immer die konfigurierte Länge.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    action_count: usize,
    rows: HashMap<StateKey, Box<[f64]>>,
}

impl QTable {
    #[must_use]
    pub fn new(action_count: usize) -> Self {
        Self {
            action_count,
            rows: HashMap::new(),
        }
    }

    #[must_use]
    pub fn action_count(&self) -> usize {
        self.action_count
    }

    /// Anzahl der bekannten Zustände.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &StateKey) -> bool {
        self.rows.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &StateKey) -> Option<&[f64]> {
        self.rows.get(key).map(|row| &row[..])
    }

    /// Zeile für `key`, bei Bedarf mit Nullen angelegt.
    pub fn row_mut(&mut self, key: StateKey) -> &mut [f64] {
        let n = self.action_count;
        self.rows
            .entry(key)
            .or_insert_with(|| vec![0.0; n].into_boxed_slice())
    }

    /// Setzt eine vollständige Zeile. Zeilen mit falscher Länge werden
    /// abgewiesen (`false`).
    pub fn insert(&mut self, key: StateKey, values: Vec<f64>) -> bool {
        if values.len() != self.action_count {
            return false;
        }
        self.rows.insert(key, values.into_boxed_slice());
        true
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &[f64])> {
        self.rows.iter().map(|(k, v)| (k, &v[..]))
    }
}

/// Index des größten Werts; bei Gleichstand gewinnt der erste.
#[must_use]
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Größter Wert der Zeile, `0.0` für eine leere Zeile.
#[must_use]
pub fn max_value(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .reduce(f64::max)
        .unwrap_or(0.0)
}
