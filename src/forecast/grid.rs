//! The issue-time × target-time matrix of one `(entity, variable)` series.

use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};

/// Sparse forecast matrix: rows are issue instants, columns are target
/// instants, both ascending. A cell holds the value forecast for the target at
/// that issue instant.
///
/// Stored revisions and fresh snapshot cells are inserted the same way, so the
/// compacted history of a column expands back into a dense column through
/// forward-fill.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevisionGrid {
    issues: BTreeSet<NaiveDateTime>,
    columns: BTreeMap<NaiveDateTime, BTreeMap<NaiveDateTime, f64>>,
}

impl RevisionGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cell at `(issued_at, target_time)`. A second insert for the
    /// same cell replaces the first.
    pub fn insert(&mut self, issued_at: NaiveDateTime, target_time: NaiveDateTime, value: f64) {
        self.issues.insert(issued_at);
        self.columns
            .entry(target_time)
            .or_default()
            .insert(issued_at, value);
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.columns.values().map(BTreeMap::len).sum()
    }

    pub fn issue_instants(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.issues.iter().copied()
    }

    pub fn target_instants(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.columns.keys().copied()
    }

    /// The value in force for `target_time` at issue instant `at`: the cell of
    /// the latest issue instant `<= at`, or `None` if the target had not been
    /// forecast yet.
    pub fn value_as_of(&self, target_time: NaiveDateTime, at: NaiveDateTime) -> Option<f64> {
        self.columns
            .get(&target_time)?
            .range(..=at)
            .next_back()
            .map(|(_, value)| *value)
    }

    /// The dense matrix after forward-filling every column down the issue
    /// instants. Keyed by issue instant, then target instant; cells above a
    /// column's first value are absent.
    pub fn forward_filled(&self) -> BTreeMap<NaiveDateTime, BTreeMap<NaiveDateTime, f64>> {
        let mut dense: BTreeMap<NaiveDateTime, BTreeMap<NaiveDateTime, f64>> = self
            .issues
            .iter()
            .map(|issue| (*issue, BTreeMap::new()))
            .collect();
        for (target, cells) in &self.columns {
            let mut last: Option<f64> = None;
            for (issue, row) in dense.iter_mut() {
                if let Some(value) = cells.get(issue) {
                    last = Some(*value);
                }
                if let Some(value) = last {
                    row.insert(*target, value);
                }
            }
        }
        dense
    }

    /// The cells that survive compaction, as `(target_time, issued_at, value)`
    /// ordered by target then issue.
    ///
    /// Equivalent to forward-filling each column and keeping a cell only where
    /// it differs from the row above; rows left without any cell are dropped.
    pub fn compacted(&self) -> Vec<(NaiveDateTime, NaiveDateTime, f64)> {
        let mut kept = Vec::new();
        for (target, cells) in &self.columns {
            let mut previous: Option<f64> = None;
            for (issue, value) in cells {
                if previous != Some(*value) {
                    kept.push((*target, *issue, *value));
                    previous = Some(*value);
                }
            }
        }
        kept
    }
}
