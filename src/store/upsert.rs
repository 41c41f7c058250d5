//! Read–merge–write of keyed, wide observation rows into calendar partitions.
//!
//! Previously stored rows take precedence over freshly fetched rows with the
//! same key: the partition is read first and the new batch appended after it,
//! then only the first occurrence of every key is kept.

use crate::partition::io::{corruption, read_partition, require_columns, write_partition};
use crate::partition::layout::PartitionLayout;
use crate::store::config::StoreConfig;
use crate::store::error::StoreError;
use crate::types::bucket::BucketId;
use crate::types::record_kind::RecordKind;
use crate::types::timestamp::format_timestamp;
use crate::utils::{float_values, string_values, timestamp_values};
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Outcome of merging one batch into one partition file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeReport {
    pub bucket: BucketId,
    pub path: PathBuf,
    /// Rows in the partition before the merge.
    pub existing_rows: usize,
    /// Rows of the batch that belonged to this partition.
    pub incoming_rows: usize,
    /// Rows in the partition after the merge.
    pub stored_rows: usize,
}

impl MergeReport {
    pub fn added_rows(&self) -> usize {
        self.stored_rows.saturating_sub(self.existing_rows)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpsertReport {
    pub partitions: Vec<MergeReport>,
    /// Rows dropped because their key was missing or unparsable.
    pub skipped_rows: usize,
}

/// Concatenates `existing` and `new_rows`, keeps the first row per key and sorts by key.
///
/// Columns present on only one side are kept and filled with nulls on the other.
///
/// # Examples
///
/// ```
/// use meteo_archive::merge_frames;
/// use polars::prelude::*;
///
/// # fn main() -> PolarsResult<()> {
/// let existing = df!("t" => ["2024-01-01"], "e" => ["A"], "v" => [5.0])?;
/// let new_rows = df!("t" => ["2024-01-02", "2024-01-01"], "e" => ["A", "A"], "v" => [7.0, 9.0])?;
///
/// let keys = vec!["t".to_string(), "e".to_string()];
/// let merged = merge_frames(Some(existing), new_rows, &keys)?;
///
/// let values: Vec<Option<f64>> = merged.column("v")?.f64()?.into_iter().collect();
/// assert_eq!(values, vec![Some(5.0), Some(7.0)]);
/// # Ok(())
/// # }
/// ```
pub fn merge_frames(
    existing: Option<DataFrame>,
    new_rows: DataFrame,
    key_columns: &[String],
) -> PolarsResult<DataFrame> {
    let keys: Vec<PlSmallStr> = key_columns
        .iter()
        .map(|k| PlSmallStr::from_str(k))
        .collect();

    let combined = match existing {
        Some(existing) => concat_lf_diagonal(
            [existing.lazy(), new_rows.lazy()],
            UnionArgs {
                to_supertypes: true,
                ..Default::default()
            },
        )?,
        None => new_rows.lazy(),
    };

    combined
        .unique_stable(Some(keys.clone()), UniqueKeepStrategy::First)
        .sort(keys, SortMultipleOptions::default())
        .collect()
}

/// A directory of calendar-bucketed CSV partitions holding wide observation rows.
///
/// Every partition row is keyed by `(timestamp, entity)` as named in the
/// [`StoreConfig`]; every other column is a variable.
#[derive(Debug, Clone)]
pub struct PartitionedUpsertStore {
    layout: PartitionLayout,
    config: StoreConfig,
    timestamp_format: String,
}

impl PartitionedUpsertStore {
    pub fn new(layout: PartitionLayout, config: StoreConfig, timestamp_format: &str) -> Self {
        Self {
            layout,
            config,
            timestamp_format: timestamp_format.to_string(),
        }
    }

    /// The conventional store for `kind` under the archive root.
    pub fn for_kind(root: &Path, kind: RecordKind, config: StoreConfig) -> Self {
        Self::new(
            PartitionLayout::for_kind(root, kind),
            config,
            kind.timestamp_format(),
        )
    }

    pub fn layout(&self) -> &PartitionLayout {
        &self.layout
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Merges `new_rows` into the partitions their timestamps fall in.
    ///
    /// An empty batch leaves the store untouched. Rows with a missing or
    /// unparsable key, or a variable cell that is not a finite number, are
    /// dropped and counted in [`UpsertReport::skipped_rows`]. Empty variable
    /// cells are kept as nulls.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageCorruption`] if an existing partition cannot
    /// be parsed; that partition is left as it was. Write errors are reported as
    /// [`StoreError::WriteFailure`] or [`StoreError::Persist`] and never leave a
    /// partially written partition behind.
    pub fn upsert(&self, new_rows: DataFrame) -> Result<UpsertReport, StoreError> {
        if new_rows.height() == 0 {
            debug!("Empty batch for {}, nothing to merge", self.layout.directory().display());
            return Ok(UpsertReport::default());
        }
        for key in self.config.key_columns() {
            if let Err(e) = new_rows.column(&key) {
                return Err(StoreError::ColumnNotFound(key, e));
            }
        }

        let timestamps = timestamp_values(&new_rows, &self.config.timestamp_column)?;
        let entities = string_values(&new_rows, &self.config.entity_column)?;

        let non_numeric = self.non_numeric_rows(&new_rows)?;

        let mut skipped_rows = 0;
        let mut masks: BTreeMap<BucketId, Vec<bool>> = BTreeMap::new();
        for (idx, (timestamp, entity)) in timestamps.iter().zip(&entities).enumerate() {
            let (Some(timestamp), Some(_), false) = (timestamp, entity, non_numeric[idx]) else {
                skipped_rows += 1;
                continue;
            };
            let bucket = self.layout.bucket_id(*timestamp);
            masks
                .entry(bucket)
                .or_insert_with(|| vec![false; new_rows.height()])[idx] = true;
        }
        if skipped_rows > 0 {
            warn!(
                "Dropped {} rows without a valid key or with a non-numeric value while merging into {}",
                skipped_rows,
                self.layout.directory().display()
            );
        }

        let normalized = self.normalize(new_rows, &timestamps)?;

        let mut report = UpsertReport {
            partitions: Vec::with_capacity(masks.len()),
            skipped_rows,
        };
        for (bucket, mask) in masks {
            let mask = BooleanChunked::from_slice("bucket".into(), &mask);
            let incoming = normalized.filter(&mask)?;
            report.partitions.push(self.merge_bucket(bucket, incoming)?);
        }
        Ok(report)
    }

    fn merge_bucket(&self, bucket: BucketId, incoming: DataFrame) -> Result<MergeReport, StoreError> {
        let path = self.layout.path_for(&bucket);
        let existing = self.load_existing(&path)?;
        let existing_rows = existing.as_ref().map_or(0, DataFrame::height);
        let incoming_rows = incoming.height();

        let mut merged = merge_frames(existing, incoming, &self.config.key_columns())?;
        write_partition(&path, &mut merged)?;

        info!(
            "Merged {} rows into partition {} ({} -> {} rows)",
            incoming_rows,
            bucket,
            existing_rows,
            merged.height()
        );
        Ok(MergeReport {
            bucket,
            path,
            existing_rows,
            incoming_rows,
            stored_rows: merged.height(),
        })
    }

    /// Reads and types an existing partition. Any unparsable key or value is corruption.
    fn load_existing(&self, path: &Path) -> Result<Option<DataFrame>, StoreError> {
        let Some(df) = read_partition(path)? else {
            return Ok(None);
        };

        let keys = self.config.key_columns();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        require_columns(&df, &key_refs, path)?;

        let timestamps = timestamp_values(&df, &self.config.timestamp_column)?;
        if let Some(row) = timestamps.iter().position(Option::is_none) {
            return Err(corruption(
                path,
                format!(
                    "unparsable '{}' on data row {}",
                    self.config.timestamp_column,
                    row + 1
                ),
            ));
        }
        let entities = string_values(&df, &self.config.entity_column)?;
        if let Some(row) = entities.iter().position(Option::is_none) {
            return Err(corruption(
                path,
                format!("empty '{}' on data row {}", self.config.entity_column, row + 1),
            ));
        }

        let value_casts: Vec<Expr> = df
            .get_column_names()
            .into_iter()
            .filter(|name| !key_refs.contains(&name.as_str()))
            .map(|name| col(name.clone()).strict_cast(DataType::Float64))
            .collect();
        let typed = df
            .lazy()
            .with_columns(value_casts)
            .collect()
            .map_err(|e| corruption(path, format!("non-numeric value: {}", e)))?;

        Ok(Some(self.normalize(typed, &timestamps)?))
    }

    /// Flags rows holding a variable cell that is present but not a finite number.
    fn non_numeric_rows(&self, df: &DataFrame) -> PolarsResult<Vec<bool>> {
        let keys = self.config.key_columns();
        let mut flagged = vec![false; df.height()];
        for name in df.get_column_names() {
            if keys.iter().any(|k| k.as_str() == name.as_str()) {
                continue;
            }
            let present = string_values(df, name.as_str())?;
            let numbers = float_values(df, name.as_str())?;
            for (idx, (cell, number)) in present.iter().zip(&numbers).enumerate() {
                if cell.is_some() && number.is_none() {
                    flagged[idx] = true;
                }
            }
        }
        Ok(flagged)
    }

    /// Rewrites the timestamp column in the store's canonical format and
    /// aligns dtypes: keys as strings, variables as floats.
    fn normalize(
        &self,
        mut df: DataFrame,
        timestamps: &[Option<NaiveDateTime>],
    ) -> PolarsResult<DataFrame> {
        let formatted: Vec<Option<String>> = timestamps
            .iter()
            .map(|ts| ts.map(|t| format_timestamp(t, &self.timestamp_format)))
            .collect();
        df.with_column(Column::new(
            self.config.timestamp_column.as_str().into(),
            formatted,
        ))?;

        let keys = self.config.key_columns();
        let casts: Vec<Expr> = df
            .get_column_names()
            .into_iter()
            .map(|name| {
                if keys.iter().any(|k| k.as_str() == name.as_str()) {
                    col(name.clone()).cast(DataType::String)
                } else {
                    col(name.clone()).cast(DataType::Float64)
                }
            })
            .collect();
        df.lazy().with_columns(casts).collect()
    }
}
