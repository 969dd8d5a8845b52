//! Serialisierungsformat der Q-Tabelle.
//!
//! JSON mit einem Metadaten-Kopf und einer Liste von Einträgen, deren
//! Schlüssel die gerundeten Zustandswerte sind:
//!
//! ```json
//! {"meta": {"state_size": 11, "action_count": 5, "precision": 2, "saved_at": "..."},
//!  "entries": [{"state": [0.5, 0.2, ...], "values": [0.0, 1.3, ...]}]}
//! ```

use fitlern_core::{discretize, StateKey};
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::error::{AgentError, Result};
use crate::qtable::QTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub state_size: usize,
    pub action_count: usize,
    pub precision: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub state: Vec<f64>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTableSnapshot {
    pub meta: SnapshotMeta,
    pub entries: Vec<SnapshotEntry>,
}

impl QTableSnapshot {
    /// Erstellt einen Snapshot; Einträge sind nach Schlüssel sortiert, damit
    /// gleiche Tabellen gleiche Bytes ergeben.
    pub(crate) fn capture(table: &QTable, state_size: usize, precision: u32) -> Self {
        let mut rows: Vec<(&StateKey, &[f64])> = table.iter().collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        let entries = rows
            .into_iter()
            .map(|(key, values)| SnapshotEntry {
                state: key.to_values(precision),
                values: values.to_vec(),
            })
            .collect();
        Self {
            meta: SnapshotMeta {
                state_size,
                action_count: table.action_count(),
                precision,
                saved_at: OffsetDateTime::now_utc().format(&Rfc3339).ok(),
            },
            entries,
        }
    }

    /// Baut eine Tabelle auf, sofern Metadaten und alle Einträge zur
    /// erwarteten Dimension passen.
    pub(crate) fn restore(
        self,
        state_size: usize,
        action_count: usize,
        precision: u32,
    ) -> Result<QTable> {
        let meta = &self.meta;
        if meta.state_size != state_size || meta.action_count != action_count {
            return Err(AgentError::Incompatible(format!(
                "expected state_size={state_size}, action_count={action_count}, found state_size={}, action_count={}",
                meta.state_size, meta.action_count
            )));
        }
        if meta.precision != precision {
            return Err(AgentError::Incompatible(format!(
                "expected precision={precision}, found {}",
                meta.precision
            )));
        }

        let mut table = QTable::new(action_count);
        for (idx, entry) in self.entries.into_iter().enumerate() {
            if entry.state.len() != state_size {
                return Err(AgentError::Incompatible(format!(
                    "entry {idx} has {} state components",
                    entry.state.len()
                )));
            }
            if entry.values.iter().any(|v| !v.is_finite()) {
                return Err(AgentError::Incompatible(format!(
                    "entry {idx} contains non-finite values"
                )));
            }
            let key = discretize(&entry.state, precision);
            if !table.insert(key, entry.values) {
                return Err(AgentError::Incompatible(format!(
                    "entry {idx} has wrong number of action values"
                )));
            }
        }
        Ok(table)
    }
}
