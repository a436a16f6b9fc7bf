//! The result-comparison oracle.
//!
//! Given two [`ResultSet`]s produced by the same SQL run against the
//! reference table and the foreign table, decide equivalence:
//!
//! - **Ordered** (query carries `ORDER BY`): rows are zipped positionally
//!   and compared cell-by-cell.
//! - **Unordered**: if a usable alignment key is present on both sides
//!   (see [`ResultSet::key_index`]), both sides are sorted by it and
//!   compared cell-by-cell. Otherwise rows are bucketed into frequency
//!   multisets of their canonical text forms.
//!
//! Floating-point cells compare under a relative/absolute epsilon pair;
//! every other type compares exactly. In the multiset fallback the epsilon
//! cannot apply per-cell, so floats are canonicalized to 10 significant
//! digits before bucketing — the one documented approximation in the oracle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resultset::ResultSet;
use crate::value::Value;

/// How rows are aligned between the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareMode {
    /// Positional, row-for-row. For queries with `ORDER BY`.
    Ordered,
    /// Multiset equality (key-aligned when possible).
    Unordered,
}

/// Numeric tolerance for float comparison.
///
/// Two floats are equivalent when `|a - b| <= abs_eps` or
/// `|a - b| <= rel_eps * max(|a|, |b|)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub rel_eps: f64,
    pub abs_eps: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rel_eps: 1e-9,
            abs_eps: 1e-12,
        }
    }
}

impl Tolerance {
    /// Float equivalence under this tolerance.
    ///
    /// NaN equals NaN and infinities compare by sign, matching how
    /// PostgreSQL treats them in `DISTINCT` and `ORDER BY`.
    pub fn floats_eq(&self, a: f64, b: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return a.is_nan() && b.is_nan();
        }
        if a.is_infinite() || b.is_infinite() {
            return a == b;
        }
        let diff = (a - b).abs();
        diff <= self.abs_eps || diff <= self.rel_eps * a.abs().max(b.abs())
    }

    /// Cell equivalence: epsilon for float pairs, exact for everything else.
    pub fn values_eq(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Float(x), Value::Float(y)) => self.floats_eq(*x, *y),
            _ => a == b,
        }
    }
}

/// A structured comparison failure.
///
/// Exactly one is produced per failing case — the first difference found,
/// identified precisely enough to reproduce by hand.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// The two sides returned different numbers of rows.
    RowCount { reference: usize, foreign: usize },
    /// The two sides returned different numbers of columns.
    ColumnCount { reference: usize, foreign: usize },
    /// Same arity, but the column names differ (position-sensitive).
    ColumnNames {
        reference: Vec<String>,
        foreign: Vec<String>,
    },
    /// A single cell differs, after row alignment.
    Cell {
        row: usize,
        column: String,
        reference: Value,
        foreign: Value,
    },
    /// Multiset fallback: rows present on one side but not the other.
    /// Each entry is a rendered row with its excess multiplicity.
    RowMultiset {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const INDENT: &str = "\n        ";
        match self {
            Mismatch::RowCount { reference, foreign } => write!(
                f,
                "row count mismatch:{INDENT}reference: {reference}{INDENT}foreign:   {foreign}"
            ),
            Mismatch::ColumnCount { reference, foreign } => write!(
                f,
                "column count mismatch:{INDENT}reference: {reference}{INDENT}foreign:   {foreign}"
            ),
            Mismatch::ColumnNames { reference, foreign } => write!(
                f,
                "column name mismatch:{INDENT}reference: {}{INDENT}foreign:   {}",
                reference.join(", "),
                foreign.join(", ")
            ),
            Mismatch::Cell {
                row,
                column,
                reference,
                foreign,
            } => write!(
                f,
                "cell mismatch at row {row}, column '{column}':{INDENT}reference: {reference}{INDENT}foreign:   {foreign}"
            ),
            Mismatch::RowMultiset {
                missing,
                unexpected,
            } => {
                write!(f, "row multiset mismatch:")?;
                for row in missing {
                    write!(f, "{INDENT}missing from foreign:  {row}")?;
                }
                for row in unexpected {
                    write!(f, "{INDENT}unexpected in foreign: {row}")?;
                }
                Ok(())
            }
        }
    }
}

/// How many differing multiset rows to name in a [`Mismatch::RowMultiset`].
const MULTISET_REPORT_LIMIT: usize = 5;

/// Compare two result sets for equivalence.
///
/// `key` names the alignment column for unordered comparison (typically
/// `"id"`); pass `None` to force the multiset fallback. Returns the first
/// difference found, or `Ok(())` if the sets are equivalent.
pub fn compare(
    reference: &ResultSet,
    foreign: &ResultSet,
    mode: CompareMode,
    tolerance: &Tolerance,
    key: Option<&str>,
) -> Result<(), Mismatch> {
    // Row count first: an empty side carries no column metadata, so shape
    // checks are only meaningful once both sides have rows.
    if reference.len() != foreign.len() {
        return Err(Mismatch::RowCount {
            reference: reference.len(),
            foreign: foreign.len(),
        });
    }
    if reference.is_empty() {
        return Ok(());
    }
    if reference.columns.len() != foreign.columns.len() {
        return Err(Mismatch::ColumnCount {
            reference: reference.columns.len(),
            foreign: foreign.columns.len(),
        });
    }
    let names_match = reference
        .columns
        .iter()
        .zip(&foreign.columns)
        .all(|(a, b)| a.eq_ignore_ascii_case(b));
    if !names_match {
        return Err(Mismatch::ColumnNames {
            reference: reference.columns.clone(),
            foreign: foreign.columns.clone(),
        });
    }

    match mode {
        CompareMode::Ordered => {
            let ref_rows: Vec<&Vec<Value>> = reference.rows.iter().collect();
            let for_rows: Vec<&Vec<Value>> = foreign.rows.iter().collect();
            compare_pairwise(&ref_rows, &for_rows, &reference.columns, tolerance)
        }
        CompareMode::Unordered => {
            if let Some(key) = key
                && let (Some(ri), Some(fi)) =
                    (reference.key_index(key), foreign.key_index(key))
                && ri == fi
            {
                return compare_pairwise(
                    &reference.rows_sorted_by_key(ri),
                    &foreign.rows_sorted_by_key(fi),
                    &reference.columns,
                    tolerance,
                );
            }
            compare_multisets(reference, foreign)
        }
    }
}

/// Cell-by-cell comparison of aligned rows.
fn compare_pairwise(
    reference: &[&Vec<Value>],
    foreign: &[&Vec<Value>],
    columns: &[String],
    tolerance: &Tolerance,
) -> Result<(), Mismatch> {
    for (row_idx, (ref_row, for_row)) in reference.iter().zip(foreign).enumerate() {
        for (col_idx, (ref_cell, for_cell)) in ref_row.iter().zip(for_row.iter()).enumerate() {
            if !tolerance.values_eq(ref_cell, for_cell) {
                return Err(Mismatch::Cell {
                    row: row_idx,
                    column: columns[col_idx].clone(),
                    reference: ref_cell.clone(),
                    foreign: for_cell.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Frequency-multiset comparison over canonicalized rows.
fn compare_multisets(reference: &ResultSet, foreign: &ResultSet) -> Result<(), Mismatch> {
    let ref_counts = reference.canonical_multiset();
    let for_counts = foreign.canonical_multiset();

    let mut missing = Vec::new();
    let mut unexpected = Vec::new();

    for (row, &ref_n) in &ref_counts {
        let for_n = for_counts.get(row).copied().unwrap_or(0);
        if ref_n > for_n {
            missing.push(render_excess(row, ref_n - for_n));
        }
    }
    for (row, &for_n) in &for_counts {
        let ref_n = ref_counts.get(row).copied().unwrap_or(0);
        if for_n > ref_n {
            unexpected.push(render_excess(row, for_n - ref_n));
        }
    }

    if missing.is_empty() && unexpected.is_empty() {
        return Ok(());
    }
    missing.sort();
    missing.truncate(MULTISET_REPORT_LIMIT);
    unexpected.sort();
    unexpected.truncate(MULTISET_REPORT_LIMIT);
    Err(Mismatch::RowMultiset {
        missing,
        unexpected,
    })
}

fn render_excess(row: &[String], excess: i64) -> String {
    // Undo the NUL sentinel the multiset uses for SQL NULL.
    let cells = row
        .iter()
        .map(|s| if s == "\u{0}" { "NULL" } else { s.as_str() })
        .collect::<Vec<_>>()
        .join(", ");
    if excess == 1 {
        format!("({cells})")
    } else {
        format!("({cells}) x{excess}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rs(columns: &[&str], rows: Vec<Vec<Value>>) -> ResultSet {
        ResultSet {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    fn int_rows(values: &[i64]) -> Vec<Vec<Value>> {
        values.iter().map(|v| vec![Value::Int(*v)]).collect()
    }

    #[test]
    fn test_identical_sets_compare_equal() {
        let a = rs(&["id", "v"], vec![vec![Value::Int(1), Value::Text("x".into())]]);
        for mode in [CompareMode::Ordered, CompareMode::Unordered] {
            assert!(compare(&a, &a.clone(), mode, &Tolerance::default(), Some("id")).is_ok());
        }
    }

    #[test]
    fn test_both_empty_is_equal() {
        let a = rs(&[], vec![]);
        let b = rs(&[], vec![]);
        assert!(compare(&a, &b, CompareMode::Unordered, &Tolerance::default(), None).is_ok());
    }

    #[test]
    fn test_row_count_mismatch() {
        let a = rs(&["v"], int_rows(&[1, 2]));
        let b = rs(&["v"], int_rows(&[1]));
        let err = compare(&a, &b, CompareMode::Unordered, &Tolerance::default(), None).unwrap_err();
        assert_eq!(
            err,
            Mismatch::RowCount {
                reference: 2,
                foreign: 1
            }
        );
    }

    #[test]
    fn test_column_count_mismatch() {
        let a = rs(&["a", "b"], vec![vec![Value::Int(1), Value::Int(2)]]);
        let b = rs(&["a"], vec![vec![Value::Int(1)]]);
        let err = compare(&a, &b, CompareMode::Ordered, &Tolerance::default(), None).unwrap_err();
        assert!(matches!(err, Mismatch::ColumnCount { .. }));
    }

    #[test]
    fn test_column_names_case_insensitive() {
        let a = rs(&["Total"], vec![vec![Value::Int(1)]]);
        let b = rs(&["total"], vec![vec![Value::Int(1)]]);
        assert!(compare(&a, &b, CompareMode::Ordered, &Tolerance::default(), None).is_ok());
    }

    #[test]
    fn test_column_names_positional() {
        let a = rs(&["a", "b"], vec![vec![Value::Int(1), Value::Int(2)]]);
        let b = rs(&["b", "a"], vec![vec![Value::Int(1), Value::Int(2)]]);
        let err = compare(&a, &b, CompareMode::Unordered, &Tolerance::default(), None).unwrap_err();
        assert!(matches!(err, Mismatch::ColumnNames { .. }));
    }

    #[test]
    fn test_ordered_detects_transposed_rows() {
        let a = rs(&["v"], int_rows(&[1, 2]));
        let b = rs(&["v"], int_rows(&[2, 1]));
        let err = compare(&a, &b, CompareMode::Ordered, &Tolerance::default(), None).unwrap_err();
        assert_eq!(
            err,
            Mismatch::Cell {
                row: 0,
                column: "v".into(),
                reference: Value::Int(1),
                foreign: Value::Int(2),
            }
        );
    }

    #[test]
    fn test_unordered_accepts_permutation() {
        let a = rs(&["v"], int_rows(&[1, 2, 3]));
        let b = rs(&["v"], int_rows(&[3, 1, 2]));
        assert!(compare(&a, &b, CompareMode::Unordered, &Tolerance::default(), None).is_ok());
    }

    #[test]
    fn test_unordered_respects_multiplicity() {
        let a = rs(&["v"], int_rows(&[7, 7, 8]));
        let b = rs(&["v"], int_rows(&[7, 8, 8]));
        let err = compare(&a, &b, CompareMode::Unordered, &Tolerance::default(), None).unwrap_err();
        match err {
            Mismatch::RowMultiset {
                missing,
                unexpected,
            } => {
                assert_eq!(missing, vec!["(7)".to_string()]);
                assert_eq!(unexpected, vec!["(8)".to_string()]);
            }
            other => panic!("expected RowMultiset, got {other:?}"),
        }
    }

    #[test]
    fn test_key_alignment_catches_cell_difference() {
        // Same key sets, one non-key cell differs. A pure multiset compare
        // would report whole rows; key alignment pinpoints the cell.
        let a = rs(
            &["id", "v"],
            vec![
                vec![Value::Int(2), Value::Text("b".into())],
                vec![Value::Int(1), Value::Text("a".into())],
            ],
        );
        let b = rs(
            &["id", "v"],
            vec![
                vec![Value::Int(1), Value::Text("a".into())],
                vec![Value::Int(2), Value::Text("WRONG".into())],
            ],
        );
        let err =
            compare(&a, &b, CompareMode::Unordered, &Tolerance::default(), Some("id")).unwrap_err();
        match err {
            Mismatch::Cell { column, .. } => assert_eq!(column, "v"),
            other => panic!("expected Cell, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_keys_fall_back_to_multiset() {
        let a = rs(&["id"], int_rows(&[1, 1]));
        let b = rs(&["id"], int_rows(&[1, 1]));
        // Would panic or misalign if key sorting were attempted carelessly;
        // the fallback just compares multisets and succeeds.
        assert!(compare(&a, &b, CompareMode::Unordered, &Tolerance::default(), Some("id")).is_ok());
    }

    #[test]
    fn test_multiset_distinguishes_null_from_text_null() {
        let a = rs(&["v"], vec![vec![Value::Null]]);
        let b = rs(&["v"], vec![vec![Value::Text("NULL".into())]]);
        let err = compare(&a, &b, CompareMode::Unordered, &Tolerance::default(), None).unwrap_err();
        match err {
            Mismatch::RowMultiset { missing, unexpected } => {
                assert_eq!(missing, vec!["(NULL)".to_string()]);
                assert_eq!(unexpected, vec!["(NULL)".to_string()]);
            }
            other => panic!("expected RowMultiset, got {other:?}"),
        }
    }

    #[test]
    fn test_null_never_equals_value() {
        let a = rs(&["v"], vec![vec![Value::Null]]);
        let b = rs(&["v"], vec![vec![Value::Int(0)]]);
        assert!(compare(&a, &b, CompareMode::Ordered, &Tolerance::default(), None).is_err());
    }

    #[test]
    fn test_float_within_tolerance() {
        let tol = Tolerance::default();
        let a = rs(&["v"], vec![vec![Value::Float(0.1 + 0.2)]]);
        let b = rs(&["v"], vec![vec![Value::Float(0.3)]]);
        assert!(compare(&a, &b, CompareMode::Ordered, &tol, None).is_ok());
    }

    #[test]
    fn test_float_outside_tolerance() {
        let tol = Tolerance::default();
        let a = rs(&["v"], vec![vec![Value::Float(1.0)]]);
        let b = rs(&["v"], vec![vec![Value::Float(1.001)]]);
        assert!(compare(&a, &b, CompareMode::Ordered, &tol, None).is_err());
    }

    #[test]
    fn test_floats_eq_specials() {
        let tol = Tolerance::default();
        assert!(tol.floats_eq(f64::NAN, f64::NAN));
        assert!(tol.floats_eq(f64::INFINITY, f64::INFINITY));
        assert!(!tol.floats_eq(f64::INFINITY, f64::NEG_INFINITY));
        assert!(!tol.floats_eq(f64::NAN, 0.0));
        assert!(!tol.floats_eq(f64::INFINITY, 1e300));
    }

    #[test]
    fn test_absolute_epsilon_near_zero() {
        let tol = Tolerance::default();
        // Relative epsilon is useless around zero; abs_eps covers it.
        assert!(tol.floats_eq(0.0, 1e-13));
        assert!(!tol.floats_eq(0.0, 1e-6));
    }

    #[test]
    fn test_mismatch_display_names_cell() {
        let m = Mismatch::Cell {
            row: 3,
            column: "real1".into(),
            reference: Value::Float(1.0),
            foreign: Value::Float(2.0),
        };
        let text = m.to_string();
        assert!(text.contains("row 3"));
        assert!(text.contains("real1"));
    }

    #[test]
    fn test_multiset_report_is_truncated() {
        let a = rs(&["v"], int_rows(&(0..20).collect::<Vec<_>>()));
        let b = rs(&["v"], int_rows(&(20..40).collect::<Vec<_>>()));
        let err = compare(&a, &b, CompareMode::Unordered, &Tolerance::default(), None).unwrap_err();
        match err {
            Mismatch::RowMultiset {
                missing,
                unexpected,
            } => {
                assert_eq!(missing.len(), MULTISET_REPORT_LIMIT);
                assert_eq!(unexpected.len(), MULTISET_REPORT_LIMIT);
            }
            other => panic!("expected RowMultiset, got {other:?}"),
        }
    }
}
