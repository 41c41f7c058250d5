//! Reading and atomically rewriting CSV partition files.

use crate::store::error::StoreError;
use log::debug;
use polars::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

/// Reads a partition file with every column as a string.
///
/// Typing is left to the caller so that a malformed cell surfaces as
/// [`StoreError::StorageCorruption`] instead of a silently inferred schema.
/// Returns `Ok(None)` when the partition does not exist yet.
pub(crate) fn read_partition(path: &Path) -> Result<Option<DataFrame>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| corruption(path, format!("unreadable CSV: {}", e)))?;

    debug!(
        "Read partition {} ({} rows, {} columns)",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(Some(df))
}

/// Fails with [`StoreError::StorageCorruption`] unless `df` carries every column in `required`.
pub(crate) fn require_columns(
    df: &DataFrame,
    required: &[&str],
    path: &Path,
) -> Result<(), StoreError> {
    for name in required {
        if df.column(name).is_err() {
            return Err(corruption(path, format!("missing column '{}'", name)));
        }
    }
    Ok(())
}

/// Replaces the partition at `path` with `df`.
///
/// The frame is written to a temporary file in the destination directory,
/// flushed to disk and renamed over the old partition, so readers only ever
/// see the previous or the new version.
pub(crate) fn write_partition(path: &Path, df: &mut DataFrame) -> Result<(), StoreError> {
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory)
        .map_err(|e| StoreError::PartitionDirCreation(directory.to_path_buf(), e))?;

    let mut temp_file = NamedTempFile::new_in(directory)
        .map_err(|e| StoreError::WriteFailure(path.to_path_buf(), e))?;

    CsvWriter::new(temp_file.as_file_mut())
        .include_header(true)
        .finish(df)
        .map_err(|e| StoreError::CsvWrite(path.to_path_buf(), e))?;

    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| StoreError::WriteFailure(path.to_path_buf(), e))?;

    temp_file
        .persist(path)
        .map_err(|e| StoreError::Persist(path.to_path_buf(), e))?;

    debug!("Wrote partition {} ({} rows)", path.display(), df.height());
    Ok(())
}

pub(crate) fn corruption(path: &Path, reason: impl Into<String>) -> StoreError {
    StoreError::StorageCorruption {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
