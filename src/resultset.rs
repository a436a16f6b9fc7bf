//! Captured query output.
//!
//! A [`ResultSet`] is the in-memory snapshot of one executed query: column
//! names in projection order plus fully decoded rows. The comparison engine
//! only ever sees two of these — it never touches the database.

use std::collections::HashMap;

use tokio_postgres::Row;

use crate::error::HarnessError;
use crate::value::Value;

/// Column names and decoded rows for one executed query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Build a result set from driver rows.
    ///
    /// An empty slice yields a set with no columns; that is fine because
    /// comparison treats two empty sets as equal regardless of projection.
    pub fn from_rows(rows: &[Row]) -> Result<Self, HarnessError> {
        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let mut decoded = Vec::with_capacity(rows.len());
        for row in rows {
            let mut cells = Vec::with_capacity(row.len());
            for i in 0..row.len() {
                let cell: Option<Value> =
                    row.try_get(i).map_err(|e| HarnessError::Decode {
                        column: row.columns()[i].name().to_string(),
                        message: e.to_string(),
                    })?;
                cells.push(cell.unwrap_or(Value::Null));
            }
            decoded.push(cells);
        }
        Ok(ResultSet {
            columns,
            rows: decoded,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive column lookup (PostgreSQL folds unquoted identifiers).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Index of a usable alignment key: the named column must be present,
    /// non-NULL in every row, and duplicate-free. Anything else returns
    /// `None` and the caller falls back to multiset comparison.
    pub fn key_index(&self, key: &str) -> Option<usize> {
        let idx = self.column_index(key)?;
        let mut seen = HashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            let cell = &row[idx];
            if cell.is_null() {
                return None;
            }
            if seen.insert(cell.canonical(), ()).is_some() {
                return None;
            }
        }
        Some(idx)
    }

    /// Rows sorted by the canonical form of the key cell.
    ///
    /// The order is lexicographic, not numeric — it only has to agree
    /// between the two sides being compared.
    pub fn rows_sorted_by_key(&self, key_idx: usize) -> Vec<&Vec<Value>> {
        let mut rows: Vec<&Vec<Value>> = self.rows.iter().collect();
        rows.sort_by_key(|row| row[key_idx].canonical());
        rows
    }

    /// Frequency multiset of canonicalized rows.
    ///
    /// SQL NULL buckets as a lone NUL byte rather than its display form:
    /// PostgreSQL text can never contain NUL, so a NULL cell cannot collide
    /// with a text cell holding the literal string "NULL".
    pub fn canonical_multiset(&self) -> HashMap<Vec<String>, i64> {
        let mut counts: HashMap<Vec<String>, i64> = HashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            let canon: Vec<String> = row
                .iter()
                .map(|cell| {
                    if cell.is_null() {
                        "\u{0}".to_string()
                    } else {
                        cell.canonical()
                    }
                })
                .collect();
            *counts.entry(canon).or_insert(0) += 1;
        }
        counts
    }
}
