//! Weekly forecast partitions holding the compacted revision history in long
//! format: `entity, variable, target_time, issued_at, value`.

use crate::forecast::compactor::ForecastRevisionCompactor;
use crate::forecast::config::ForecastConfig;
use crate::forecast::history::RevisionHistory;
use crate::partition::io::{corruption, read_partition, require_columns, write_partition};
use crate::partition::layout::PartitionLayout;
use crate::store::error::StoreError;
use crate::store::upsert::MergeReport;
use crate::types::bucket::BucketId;
use crate::types::forecast::{ForecastRevision, ForecastSnapshot};
use crate::types::record_kind::RecordKind;
use crate::types::timestamp::format_timestamp;
use crate::utils::{float_values, string_values, timestamp_values};
use chrono::NaiveDateTime;
use log::{debug, info};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

const ENTITY: &str = "entity";
const VARIABLE: &str = "variable";
const TARGET_TIME: &str = "target_time";
const ISSUED_AT: &str = "issued_at";
const VALUE: &str = "value";
const COLUMNS: [&str; 5] = [ENTITY, VARIABLE, TARGET_TIME, ISSUED_AT, VALUE];

/// Forecast revisions partitioned by the ISO week of their issue instant.
///
/// Each weekly partition is compacted on its own: the first issue instant of a
/// week stores every target it forecasts, later ones only what changed.
#[derive(Debug, Clone)]
pub struct ForecastRevisionStore {
    layout: PartitionLayout,
    compactor: ForecastRevisionCompactor,
}

impl ForecastRevisionStore {
    pub fn new(layout: PartitionLayout, config: ForecastConfig) -> Self {
        Self {
            layout,
            compactor: ForecastRevisionCompactor::new(config),
        }
    }

    /// The conventional forecast store under the archive root (`<root>/data_forecast`).
    pub fn for_root(root: &Path, config: ForecastConfig) -> Self {
        Self::new(PartitionLayout::for_kind(root, RecordKind::Forecast), config)
    }

    pub fn layout(&self) -> &PartitionLayout {
        &self.layout
    }

    pub fn config(&self) -> &ForecastConfig {
        self.compactor.config()
    }

    /// Compacts `snapshots` into the weekly partitions of their issue instants.
    ///
    /// Snapshots without cells are ignored; if none has cells nothing is
    /// written. Within a partition, snapshots are applied in the given order
    /// after the stored history. A partition whose revisions do not change,
    /// including one that would only receive cells below the minimum lead, is
    /// not written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageCorruption`] if a stored partition cannot be
    /// parsed or holds a revision issued at or after its target instant. The
    /// partition is then left as it was.
    pub fn update(&self, snapshots: &[ForecastSnapshot]) -> Result<Vec<MergeReport>, StoreError> {
        let mut buckets: BTreeMap<BucketId, Vec<&ForecastSnapshot>> = BTreeMap::new();
        for snapshot in snapshots.iter().filter(|s| !s.is_empty()) {
            buckets
                .entry(self.layout.bucket_id(snapshot.issued_at))
                .or_default()
                .push(snapshot);
        }
        if buckets.is_empty() {
            debug!("No forecast cells to store in {}", self.layout.directory().display());
            return Ok(Vec::new());
        }

        let mut reports = Vec::with_capacity(buckets.len());
        for (bucket, snapshots) in buckets {
            reports.push(self.update_bucket(bucket, &snapshots)?);
        }
        Ok(reports)
    }

    /// Reads the revision history of the week containing `issued_at`.
    pub fn history(&self, issued_at: NaiveDateTime) -> Result<RevisionHistory, StoreError> {
        let path = self.layout.path_for(&self.layout.bucket_id(issued_at));
        Ok(read_revisions(&path)?.iter().collect())
    }

    /// Reads every stored revision of one partition, in file order.
    pub fn revisions(&self, bucket: &BucketId) -> Result<Vec<ForecastRevision>, StoreError> {
        read_revisions(&self.layout.path_for(bucket))
    }

    fn update_bucket(
        &self,
        bucket: BucketId,
        snapshots: &[&ForecastSnapshot],
    ) -> Result<MergeReport, StoreError> {
        let path = self.layout.path_for(&bucket);
        let stored = read_revisions(&path)?;
        let incoming_rows: usize = snapshots.iter().map(|s| s.cells.len()).sum();

        let (revisions, compaction) = self.compactor.compact(&stored, snapshots.iter().copied());
        if revisions == stored {
            debug!(
                "Partition {} unchanged by {} forecast cells, not rewriting",
                bucket, incoming_rows
            );
            return Ok(MergeReport {
                bucket,
                path,
                existing_rows: stored.len(),
                incoming_rows,
                stored_rows: stored.len(),
            });
        }
        let mut df = revisions_frame(&revisions)?;
        write_partition(&path, &mut df)?;

        info!(
            "Compacted {} forecast cells into partition {} ({} -> {} revisions, {} below min lead)",
            incoming_rows,
            bucket,
            stored.len(),
            revisions.len(),
            compaction.below_min_lead
        );
        Ok(MergeReport {
            bucket,
            path,
            existing_rows: stored.len(),
            incoming_rows,
            stored_rows: revisions.len(),
        })
    }
}

fn read_revisions(path: &Path) -> Result<Vec<ForecastRevision>, StoreError> {
    let Some(df) = read_partition(path)? else {
        return Ok(Vec::new());
    };
    require_columns(&df, &COLUMNS, path)?;

    let entities = string_values(&df, ENTITY)?;
    let variables = string_values(&df, VARIABLE)?;
    let targets = timestamp_values(&df, TARGET_TIME)?;
    let issues = timestamp_values(&df, ISSUED_AT)?;
    let values = float_values(&df, VALUE)?;

    let rows = entities
        .into_iter()
        .zip(variables)
        .zip(targets)
        .zip(issues)
        .zip(values);
    let mut revisions = Vec::with_capacity(df.height());
    for (row, ((((entity, variable), target_time), issued_at), value)) in rows.enumerate() {
        let (Some(entity), Some(variable), Some(target_time), Some(issued_at), Some(value)) =
            (entity, variable, target_time, issued_at, value)
        else {
            return Err(corruption(path, format!("malformed revision on data row {}", row + 1)));
        };
        if issued_at >= target_time {
            return Err(corruption(
                path,
                format!(
                    "revision on data row {} issued at {} for past target {}",
                    row + 1,
                    issued_at,
                    target_time
                ),
            ));
        }
        revisions.push(ForecastRevision {
            entity,
            variable,
            target_time,
            issued_at,
            value,
        });
    }
    Ok(revisions)
}

fn revisions_frame(revisions: &[ForecastRevision]) -> PolarsResult<DataFrame> {
    let format = RecordKind::Forecast.timestamp_format();
    let entities: Vec<&str> = revisions.iter().map(|r| r.entity.as_str()).collect();
    let variables: Vec<&str> = revisions.iter().map(|r| r.variable.as_str()).collect();
    let targets: Vec<String> = revisions
        .iter()
        .map(|r| format_timestamp(r.target_time, format))
        .collect();
    let issues: Vec<String> = revisions
        .iter()
        .map(|r| format_timestamp(r.issued_at, format))
        .collect();
    let values: Vec<f64> = revisions.iter().map(|r| r.value).collect();

    DataFrame::new(vec![
        Column::new(ENTITY.into(), entities),
        Column::new(VARIABLE.into(), variables),
        Column::new(TARGET_TIME.into(), targets),
        Column::new(ISSUED_AT.into(), issues),
        Column::new(VALUE.into(), values),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::bucket::IsoWeek;
    use crate::types::forecast::ForecastCell;
    use chrono::{Duration, NaiveDate};
    use std::fs;
    use tempfile::TempDir;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn snapshot(issued_at: NaiveDateTime, cells: &[(u32, f64)]) -> ForecastSnapshot {
        ForecastSnapshot {
            issued_at,
            cells: cells
                .iter()
                .map(|(hour, value)| ForecastCell {
                    entity: "La Paz".to_string(),
                    variable: "temperatura".to_string(),
                    target_time: issued_at.date().and_hms_opt(0, 0, 0).unwrap()
                        + Duration::hours(*hour as i64),
                    value: *value,
                })
                .collect(),
        }
    }

    fn store(root: &Path) -> ForecastRevisionStore {
        ForecastRevisionStore::for_root(root, ForecastConfig::default())
    }

    #[test]
    fn test_update_writes_compacted_history() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let store = store(dir.path());

        store.update(&[snapshot(at(1, 9), &[(12, 20.0), (13, 21.0)])])?;
        let reports = store.update(&[snapshot(at(1, 10), &[(12, 20.0), (13, 22.0)])])?;

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].existing_rows, 2);
        assert_eq!(reports[0].incoming_rows, 2);
        assert_eq!(reports[0].stored_rows, 3);
        assert_eq!(
            reports[0].path,
            dir.path().join("data_forecast").join("2024").join("202418.csv")
        );

        let content = fs::read_to_string(&reports[0].path)?;
        assert_eq!(
            content,
            "entity,variable,target_time,issued_at,value\n\
             La Paz,temperatura,2024-05-01T12:00:00,2024-05-01T09:00:00,20.0\n\
             La Paz,temperatura,2024-05-01T13:00:00,2024-05-01T09:00:00,21.0\n\
             La Paz,temperatura,2024-05-01T13:00:00,2024-05-01T10:00:00,22.0\n"
        );

        let history = store.history(at(1, 10))?;
        assert_eq!(
            history.value_as_of("La Paz", "temperatura", at(1, 13), at(1, 9)),
            Some(21.0)
        );
        Ok(())
    }

    #[test]
    fn test_update_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let store = store(dir.path());
        let batch = vec![
            snapshot(at(1, 9), &[(12, 20.0), (13, 21.0)]),
            snapshot(at(1, 10), &[(12, 20.0), (13, 22.0), (14, 19.5)]),
        ];

        let reports = store.update(&batch)?;
        let once = fs::read_to_string(&reports[0].path)?;
        store.update(&batch)?;
        let twice = fs::read_to_string(&reports[0].path)?;

        assert_eq!(once, twice);
        Ok(())
    }

    #[test]
    fn test_snapshots_split_by_iso_week() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let store = store(dir.path());
        // 2024-05-05 is a Sunday (week 18), 2024-05-06 a Monday (week 19).
        let reports = store.update(&[
            snapshot(at(5, 9), &[(12, 20.0)]),
            snapshot(at(6, 9), &[(12, 18.0)]),
        ])?;

        let buckets: Vec<String> = reports.iter().map(|r| r.bucket.to_string()).collect();
        assert_eq!(buckets, vec!["2024-W18", "2024-W19"]);
        assert!(dir.path().join("data_forecast/2024/202419.csv").exists());
        Ok(())
    }

    #[test]
    fn test_empty_snapshots_write_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let store = store(dir.path());
        let reports = store.update(&[ForecastSnapshot::new(at(1, 9))])?;
        assert!(reports.is_empty());
        assert!(!dir.path().join("data_forecast").exists());
        Ok(())
    }

    #[test]
    fn test_cells_below_min_lead_create_no_partition() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let store = store(dir.path());

        let reports = store.update(&[snapshot(at(1, 9), &[(9, 18.0), (8, 17.5)])])?;

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].incoming_rows, 2);
        assert_eq!(reports[0].stored_rows, 0);
        assert!(!reports[0].path.exists());
        Ok(())
    }

    #[test]
    fn test_unchanged_partition_is_not_rewritten() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let store = store(dir.path());
        let reports = store.update(&[snapshot(at(1, 9), &[(12, 20.0), (13, 21.0)])])?;
        let modified = fs::metadata(&reports[0].path)?.modified()?;

        std::thread::sleep(std::time::Duration::from_millis(20));
        let reports = store.update(&[snapshot(at(1, 10), &[(12, 20.0), (13, 21.0)])])?;

        assert_eq!(reports[0].stored_rows, 2);
        assert_eq!(fs::metadata(&reports[0].path)?.modified()?, modified);
        Ok(())
    }

    #[test]
    fn test_zero_lead_never_stores_target_at_issue_instant(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let store = ForecastRevisionStore::for_root(
            dir.path(),
            ForecastConfig::builder().min_lead(Duration::zero()).build(),
        );

        store.update(&[snapshot(at(1, 9), &[(9, 18.0), (10, 19.0)])])?;
        let reports = store.update(&[snapshot(at(1, 10), &[(11, 20.0)])])?;

        assert_eq!(reports[0].existing_rows, 1);
        assert_eq!(reports[0].stored_rows, 2);
        let revisions = store.revisions(&reports[0].bucket)?;
        assert!(revisions.iter().all(|r| r.issued_at < r.target_time));
        Ok(())
    }

    #[test]
    fn test_past_target_in_file_is_corruption() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let store = store(dir.path());
        let path = dir.path().join("data_forecast/2024/202418.csv");
        fs::create_dir_all(path.parent().ok_or("no parent")?)?;
        let content = "entity,variable,target_time,issued_at,value\n\
                       La Paz,temperatura,2024-05-01T09:00:00,2024-05-01T09:00:00,20.0\n";
        fs::write(&path, content)?;

        let result = store.update(&[snapshot(at(1, 10), &[(13, 22.0)])]);

        assert!(matches!(result, Err(StoreError::StorageCorruption { .. })));
        assert_eq!(fs::read_to_string(&path)?, content);
        Ok(())
    }

    #[test]
    fn test_missing_column_in_file_is_corruption() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let store = store(dir.path());
        let path = dir.path().join("data_forecast/2024/202418.csv");
        fs::create_dir_all(path.parent().ok_or("no parent")?)?;
        fs::write(&path, "entity,target_time,value\nLa Paz,2024-05-01T12:00:00,1.0\n")?;

        assert!(matches!(
            store.revisions(&BucketId::IsoWeek(IsoWeek(2024, 18))),
            Err(StoreError::StorageCorruption { .. })
        ));
        Ok(())
    }
}
