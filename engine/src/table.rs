//! Enrichment output keyed by timestamp.

use std::collections::BTreeMap;
use std::iter;

use chrono::NaiveDateTime;
use serde::Serialize;

use bazi_types::{FourPillars, PillarKind};

use crate::row::EnrichmentRow;

/// Timestamp format used for the `timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One exported value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Int(i64),
}

impl Cell {
    /// Plain textual rendering, as written to CSV.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Int(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct TableEntry {
    row: EnrichmentRow,
    occurrences: usize,
}

/// Rows merged by timestamp. A timestamp supplied several times is stored
/// once and counted once per occurrence.
#[derive(Debug, Clone)]
pub struct EnrichmentTable {
    base: FourPillars,
    life_cycle_columns: Vec<String>,
    relation_columns: Vec<String>,
    entries: BTreeMap<NaiveDateTime, TableEntry>,
}

impl EnrichmentTable {
    #[must_use]
    pub fn new(
        base: FourPillars,
        life_cycle_columns: Vec<String>,
        relation_columns: Vec<String>,
    ) -> Self {
        Self {
            base,
            life_cycle_columns,
            relation_columns,
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, row: EnrichmentRow, occurrences: usize) {
        self.entries
            .entry(row.timestamp)
            .and_modify(|entry| entry.occurrences += occurrences)
            .or_insert(TableEntry { row, occurrences });
    }

    #[must_use]
    pub fn base(&self) -> &FourPillars {
        &self.base
    }

    /// Number of rows, counting repeated timestamps once per occurrence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(|entry| entry.occurrences).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn distinct_len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn get(&self, timestamp: &NaiveDateTime) -> Option<&EnrichmentRow> {
        self.entries.get(timestamp).map(|entry| &entry.row)
    }

    /// Rows in timestamp order, repeated per occurrence.
    pub fn rows(&self) -> impl Iterator<Item = &EnrichmentRow> {
        self.entries
            .values()
            .flat_map(|entry| iter::repeat_n(&entry.row, entry.occurrences))
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.rows().map(|row| row.timestamp)
    }

    #[must_use]
    pub fn life_cycle_columns(&self) -> &[String] {
        &self.life_cycle_columns
    }

    #[must_use]
    pub fn relation_columns(&self) -> &[String] {
        &self.relation_columns
    }

    /// Column names in export order. With `encode_life_cycle`, every
    /// life-cycle column is followed by an `encoded_` integer column.
    #[must_use]
    pub fn columns(&self, encode_life_cycle: bool) -> Vec<String> {
        let mut columns = vec!["timestamp".to_string(), "lunar_date".to_string()];
        for prefix in ["current", "base"] {
            for kind in PillarKind::ALL {
                columns.push(format!("{prefix}_{}_pillar", kind.name()));
                columns.push(format!("{prefix}_{}_pillar_minus", kind.name()));
            }
        }
        for name in &self.life_cycle_columns {
            columns.push(name.clone());
            if encode_life_cycle {
                columns.push(format!("encoded_{name}"));
            }
        }
        columns.extend(self.relation_columns.iter().cloned());
        columns
    }

    /// Cells of `row`, aligned with [`columns`](Self::columns).
    #[must_use]
    pub fn cells(&self, row: &EnrichmentRow, encode_life_cycle: bool) -> Vec<Cell> {
        let mut cells = vec![
            Cell::Text(row.timestamp.format(TIMESTAMP_FORMAT).to_string()),
            Cell::Text(row.lunar.map(|lunar| lunar.to_string()).unwrap_or_default()),
        ];
        cells.extend(pillar_cells(row.current.as_ref()));
        cells.extend(pillar_cells(Some(&self.base)));
        for (_, stage) in &row.life_cycle {
            cells.push(Cell::Text(stage.glyphs().to_string()));
            if encode_life_cycle {
                cells.push(Cell::Int(i64::from(stage.code())));
            }
        }
        cells.extend(
            row.relations
                .iter()
                .map(|(_, flag)| Cell::Int(i64::from(*flag))),
        );
        cells
    }
}

fn pillar_cells(pillars: Option<&FourPillars>) -> Vec<Cell> {
    PillarKind::ALL
        .into_iter()
        .flat_map(|kind| {
            let pair = pillars.map(|p| p.pair(kind));
            [
                pair.map(|pair| pair.main.glyphs()).unwrap_or_default(),
                pair.map(|pair| pair.minus.glyphs()).unwrap_or_default(),
            ]
        })
        .map(Cell::Text)
        .collect()
}
