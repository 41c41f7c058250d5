//! Maps buckets to partition files on disk.

use crate::types::bucket::{BucketId, Granularity};
use crate::types::record_kind::RecordKind;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// Where the partitions of one store live and how rows are bucketed into them.
///
/// ```text
/// <root>/data/202405.csv                    monthly observations
/// <root>/data_historical/2024.csv           yearly historical records
/// <root>/data_forecast/2024/202418.csv      weekly forecast revisions
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionLayout {
    directory: PathBuf,
    granularity: Granularity,
}

impl PartitionLayout {
    pub fn new(directory: &Path, granularity: Granularity) -> Self {
        Self {
            directory: directory.to_path_buf(),
            granularity,
        }
    }

    /// The conventional layout for `kind` under the archive root.
    pub fn for_kind(root: &Path, kind: RecordKind) -> Self {
        Self::new(&root.join(kind.path_segment()), kind.granularity())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn bucket_id(&self, timestamp: NaiveDateTime) -> BucketId {
        self.granularity.bucket_id(timestamp)
    }

    pub fn path_for(&self, bucket: &BucketId) -> PathBuf {
        let file_name = format!("{}.csv", bucket.file_stem());
        match bucket.subdirectory() {
            Some(sub) => self.directory.join(sub).join(file_name),
            None => self.directory.join(file_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_paths_per_kind() {
        let root = Path::new("/archive");

        let live = PartitionLayout::for_kind(root, RecordKind::Observation);
        let bucket = live.bucket_id(ts(2024, 5, 3));
        assert_eq!(live.path_for(&bucket), Path::new("/archive/data/202405.csv"));

        let historical = PartitionLayout::for_kind(root, RecordKind::Historical);
        let bucket = historical.bucket_id(ts(2023, 11, 30));
        assert_eq!(
            historical.path_for(&bucket),
            Path::new("/archive/data_historical/2023.csv")
        );

        let forecast = PartitionLayout::for_kind(root, RecordKind::Forecast);
        let bucket = forecast.bucket_id(ts(2024, 5, 3));
        assert_eq!(
            forecast.path_for(&bucket),
            Path::new("/archive/data_forecast/2024/202418.csv")
        );
    }
}
