//! Snapshot diff engine
//!
//! Both persisted tables (validation status and error tracking) are
//! written once per run by comparing the prior snapshot against the
//! freshly materialized one and applying only the row-level
//! differences. Rows are compared by primary key; a row present in
//! both snapshots counts as an update only when a non-key field
//! changed.

use std::collections::BTreeMap;

/// A row that can participate in snapshot diffing.
///
/// Full-row equality (`PartialEq`) decides whether a matched key is an
/// update; the primary key decides identity.
pub trait TableRow: Clone + PartialEq {
    /// Primary key value for this row
    fn primary_key(&self) -> &str;
}

/// Row-level operations derived from comparing two snapshots
#[derive(Debug, Clone)]
pub struct TableDiff<R> {
    /// Rows present only in the new snapshot
    pub inserts: Vec<R>,
    /// Rows present in both snapshots with changed non-key fields
    pub updates: Vec<R>,
    /// Primary keys present only in the prior snapshot (empty unless
    /// deletes were requested)
    pub deletes: Vec<String>,
}

impl<R> Default for TableDiff<R> {
    fn default() -> Self {
        Self {
            inserts: Vec::new(),
            updates: Vec::new(),
            deletes: Vec::new(),
        }
    }
}

impl<R> TableDiff<R> {
    /// True when the diff would not touch the table
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    /// Total number of row operations
    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.deletes.len()
    }
}

/// Compute the row-level diff between two snapshots of one table.
///
/// Keys appearing only in `new` become inserts; keys in both with a
/// changed row become updates; keys only in `prior` become deletes
/// when `allow_delete` is set, and are otherwise left alone.
/// Output order is deterministic (ascending primary key).
pub fn diff_rows<R: TableRow>(prior: &[R], new: &[R], allow_delete: bool) -> TableDiff<R> {
    let prior_by_key: BTreeMap<&str, &R> =
        prior.iter().map(|row| (row.primary_key(), row)).collect();
    let new_by_key: BTreeMap<&str, &R> =
        new.iter().map(|row| (row.primary_key(), row)).collect();

    let mut diff = TableDiff {
        inserts: Vec::new(),
        updates: Vec::new(),
        deletes: Vec::new(),
    };

    for (key, row) in &new_by_key {
        match prior_by_key.get(key) {
            None => diff.inserts.push((*row).clone()),
            Some(prior_row) if prior_row != row => diff.updates.push((*row).clone()),
            Some(_) => {}
        }
    }

    if allow_delete {
        for key in prior_by_key.keys() {
            if !new_by_key.contains_key(key) {
                diff.deletes.push((*key).to_string());
            }
        }
    }

    diff
}
