//! Collapses repeated forecast snapshots into a minimal revision history.
//!
//! For every `(entity, variable)` series the known cells are laid out on an
//! issue-time × target-time grid. Each target column is forward-filled down the
//! issue instants and a cell is kept only where its value differs from the one
//! above it, so a target that keeps being forecast with the same value costs a
//! single row no matter how often it is fetched.

use crate::forecast::config::ForecastConfig;
use crate::forecast::history::RevisionHistory;
use crate::types::forecast::{ForecastRevision, ForecastSnapshot};
use crate::types::timestamp::round_to;
use log::debug;
use serde::Serialize;

/// Cell accounting for one compaction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompactionReport {
    /// Revisions read back from storage.
    pub stored_revisions: usize,
    /// Snapshot cells offered for compaction.
    pub incoming_cells: usize,
    /// Snapshot cells dropped for being too close to their issue instant.
    pub below_min_lead: usize,
    /// Revisions in the compacted output.
    pub revisions: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastRevisionCompactor {
    config: ForecastConfig,
}

impl ForecastRevisionCompactor {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Merges `snapshots` into the `stored` revision history and compacts the result.
    ///
    /// Stored revisions enter the grid first, then the snapshots in iteration
    /// order; when two cells share an issue and target instant the later one
    /// wins. Values are compared after rounding to the configured precision.
    /// Output is ordered by entity, variable, target instant and issue instant.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use meteo_archive::{ForecastCell, ForecastRevisionCompactor, ForecastSnapshot};
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    /// let hour = |h| day.and_hms_opt(h, 0, 0).unwrap();
    /// let cell = |target, value| ForecastCell {
    ///     entity: "La Paz".to_string(),
    ///     variable: "temperatura".to_string(),
    ///     target_time: hour(target),
    ///     value,
    /// };
    ///
    /// let mut first = ForecastSnapshot::new(hour(9));
    /// first.cells = vec![cell(12, 20.0), cell(13, 21.0)];
    /// let mut second = ForecastSnapshot::new(hour(10));
    /// second.cells = vec![cell(12, 20.0), cell(13, 22.0)];
    ///
    /// let (revisions, _) = ForecastRevisionCompactor::default().compact(&[], &[first, second]);
    /// let kept: Vec<_> = revisions
    ///     .iter()
    ///     .map(|r| (r.target_time, r.issued_at, r.value))
    ///     .collect();
    /// assert_eq!(
    ///     kept,
    ///     vec![(hour(12), hour(9), 20.0), (hour(13), hour(9), 21.0), (hour(13), hour(10), 22.0)]
    /// );
    /// ```
    pub fn compact<'a>(
        &self,
        stored: &[ForecastRevision],
        snapshots: impl IntoIterator<Item = &'a ForecastSnapshot>,
    ) -> (Vec<ForecastRevision>, CompactionReport) {
        let precision = self.config.precision;
        let mut report = CompactionReport {
            stored_revisions: stored.len(),
            ..Default::default()
        };

        let mut history = RevisionHistory::new();
        for revision in stored {
            history.insert(
                &revision.entity,
                &revision.variable,
                revision.issued_at,
                revision.target_time,
                round_to(revision.value, precision),
            );
        }

        for snapshot in snapshots {
            for cell in &snapshot.cells {
                report.incoming_cells += 1;
                if !self.config.accepts(snapshot.issued_at, cell.target_time) {
                    report.below_min_lead += 1;
                    continue;
                }
                history.insert(
                    &cell.entity,
                    &cell.variable,
                    snapshot.issued_at,
                    cell.target_time,
                    round_to(cell.value, precision),
                );
            }
        }

        let revisions = history.compacted();
        report.revisions = revisions.len();
        debug!("Compacted forecast cells: {:?}", report);
        (revisions, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::forecast::ForecastCell;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::hours(hour as i64)
    }

    fn snapshot(issue: u32, cells: &[(&str, &str, u32, f64)]) -> ForecastSnapshot {
        ForecastSnapshot {
            issued_at: at(issue),
            cells: cells
                .iter()
                .map(|(entity, variable, target, value)| ForecastCell {
                    entity: entity.to_string(),
                    variable: variable.to_string(),
                    target_time: at(*target),
                    value: *value,
                })
                .collect(),
        }
    }

    fn triples(revisions: &[ForecastRevision]) -> Vec<(NaiveDateTime, NaiveDateTime, f64)> {
        revisions
            .iter()
            .map(|r| (r.target_time, r.issued_at, r.value))
            .collect()
    }

    #[test]
    fn test_scenario_unchanged_cell_is_not_repeated() {
        let snapshots = vec![
            snapshot(9, &[("A", "t", 12, 20.0), ("A", "t", 13, 21.0)]),
            snapshot(10, &[("A", "t", 12, 20.0), ("A", "t", 13, 22.0)]),
        ];

        let (revisions, report) = ForecastRevisionCompactor::default().compact(&[], &snapshots);

        assert_eq!(
            triples(&revisions),
            vec![
                (at(12), at(9), 20.0),
                (at(13), at(9), 21.0),
                (at(13), at(10), 22.0),
            ]
        );
        assert_eq!(report.incoming_cells, 4);
        assert_eq!(report.revisions, 3);
    }

    #[test]
    fn test_revisions_exactly_at_value_changes() {
        // Target 48 is forecast every hour from 0 to 23; the value changes at 3, 10 and 17.
        let snapshots: Vec<ForecastSnapshot> = (0..24)
            .map(|issue| {
                let value = match issue {
                    0..=2 => 10.0,
                    3..=9 => 11.0,
                    10..=16 => 12.5,
                    _ => 11.0,
                };
                snapshot(issue, &[("A", "t", 48, value)])
            })
            .collect();
        let (revisions, _) = ForecastRevisionCompactor::default().compact(&[], &snapshots);

        let issues: Vec<NaiveDateTime> = revisions.iter().map(|r| r.issued_at).collect();
        assert_eq!(issues, vec![at(0), at(3), at(10), at(17)]);
    }

    #[test]
    fn test_forward_fill_completeness() {
        let snapshots: Vec<ForecastSnapshot> = (0..6)
            .map(|issue| {
                let cells: Vec<(&str, &str, u32, f64)> = (issue + 1..issue + 8)
                    .map(|target| ("A", "t", target, ((target * 7 + issue / 3) % 5) as f64))
                    .collect();
                snapshot(issue, &cells)
            })
            .collect();

        let mut dense = RevisionHistory::new();
        for s in &snapshots {
            for c in &s.cells {
                dense.insert(&c.entity, &c.variable, s.issued_at, c.target_time, c.value);
            }
        }
        let (revisions, _) = ForecastRevisionCompactor::default().compact(&[], &snapshots);
        let compacted: RevisionHistory = revisions.iter().collect();

        let expected = dense.series("A", "t").map(|g| g.forward_filled()).unwrap_or_default();
        assert!(!expected.is_empty());
        for (issue, row) in expected {
            for (target, value) in row {
                assert_eq!(compacted.value_as_of("A", "t", target, issue), Some(value));
            }
        }
        assert!(revisions.len() < dense.series("A", "t").map_or(0, |g| g.cell_count()));
    }

    #[test]
    fn test_cells_inside_min_lead_are_dropped() {
        let snapshots = vec![snapshot(9, &[("A", "t", 9, 1.0), ("A", "t", 10, 2.0)])];
        let mut late = snapshot(9, &[("A", "t", 10, 3.0)]);
        late.issued_at = at(9) + Duration::minutes(30);

        let compactor = ForecastRevisionCompactor::default();
        let (revisions, report) = compactor.compact(&[], snapshots.iter().chain([&late]));

        assert_eq!(report.below_min_lead, 2);
        assert_eq!(triples(&revisions), vec![(at(10), at(9), 2.0)]);
        assert!(revisions
            .iter()
            .all(|r| r.lead_time() >= compactor.config().min_lead));
    }

    #[test]
    fn test_zero_lead_still_drops_targets_not_ahead_of_issue() {
        let compactor = ForecastRevisionCompactor::new(
            ForecastConfig::builder().min_lead(Duration::zero()).build(),
        );
        let snapshots = vec![snapshot(9, &[("A", "t", 8, 1.0), ("A", "t", 9, 2.0), ("A", "t", 10, 3.0)])];

        let (revisions, report) = compactor.compact(&[], &snapshots);

        assert_eq!(report.below_min_lead, 2);
        assert_eq!(triples(&revisions), vec![(at(10), at(9), 3.0)]);
        assert!(revisions.iter().all(|r| r.issued_at < r.target_time));
    }

    #[test]
    fn test_compaction_is_idempotent() {
        let snapshots = vec![
            snapshot(0, &[("A", "t", 5, 1.0), ("A", "t", 6, 2.0)]),
            snapshot(1, &[("A", "t", 5, 1.0), ("A", "t", 6, 2.5)]),
            snapshot(2, &[("A", "t", 5, 1.5), ("A", "t", 6, 2.5)]),
        ];
        let compactor = ForecastRevisionCompactor::default();

        let (once, _) = compactor.compact(&[], &snapshots);
        let (twice, _) = compactor.compact(&once, &snapshots);
        let (again, _) = compactor.compact(&twice, &Vec::<ForecastSnapshot>::new());

        assert_eq!(once, twice);
        assert_eq!(once, again);
    }

    #[test]
    fn test_new_snapshot_extends_stored_history() {
        let compactor = ForecastRevisionCompactor::default();
        let (stored, _) = compactor.compact(
            &[],
            &[snapshot(9, &[("A", "t", 12, 20.0), ("A", "t", 13, 21.0)])],
        );

        let (revisions, report) = compactor.compact(
            &stored,
            &[snapshot(10, &[("A", "t", 12, 20.0), ("A", "t", 13, 22.0)])],
        );

        assert_eq!(report.stored_revisions, 2);
        assert_eq!(
            triples(&revisions),
            vec![
                (at(12), at(9), 20.0),
                (at(13), at(9), 21.0),
                (at(13), at(10), 22.0),
            ]
        );
    }

    #[test]
    fn test_same_issue_instant_later_cell_wins() {
        let stored = vec![ForecastRevision {
            entity: "A".to_string(),
            variable: "t".to_string(),
            target_time: at(12),
            issued_at: at(9),
            value: 20.0,
        }];
        let snapshots = vec![
            snapshot(9, &[("A", "t", 12, 21.0)]),
            snapshot(9, &[("A", "t", 12, 21.5)]),
        ];

        let (revisions, _) = ForecastRevisionCompactor::default().compact(&stored, &snapshots);
        assert_eq!(triples(&revisions), vec![(at(12), at(9), 21.5)]);
    }

    #[test]
    fn test_series_are_compacted_independently() {
        let snapshots = vec![
            snapshot(0, &[("B", "t", 5, 1.0), ("A", "p", 5, 650.0), ("A", "t", 5, 1.0)]),
            snapshot(1, &[("B", "t", 5, 1.0), ("A", "p", 5, 651.0), ("A", "t", 5, 1.0)]),
        ];

        let (revisions, _) = ForecastRevisionCompactor::default().compact(&[], &snapshots);

        let keys: Vec<(&str, &str, NaiveDateTime)> = revisions
            .iter()
            .map(|r| (r.entity.as_str(), r.variable.as_str(), r.issued_at))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("A", "p", at(0)),
                ("A", "p", at(1)),
                ("A", "t", at(0)),
                ("B", "t", at(0)),
            ]
        );
    }

    #[test]
    fn test_values_compared_after_rounding() {
        let snapshots = vec![
            snapshot(0, &[("A", "t", 5, 20.001)]),
            snapshot(1, &[("A", "t", 5, 19.998)]),
        ];
        let (revisions, _) = ForecastRevisionCompactor::default().compact(&[], &snapshots);
        assert_eq!(triples(&revisions), vec![(at(5), at(0), 20.0)]);
    }
}
