use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create partition directory '{0}'")]
    PartitionDirCreation(PathBuf, #[source] std::io::Error),

    // The existing partition could not be read back. Never overwrite it.
    #[error("Partition file '{path}' is corrupt: {reason}")]
    StorageCorruption { path: PathBuf, reason: String },

    #[error("Failed to write partition file '{0}'")]
    WriteFailure(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing partition file '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),

    #[error("Failed to move temporary file into place at '{0}'")]
    Persist(PathBuf, #[source] tempfile::PersistError),

    #[error("Required column '{0}' not found in DataFrame")]
    ColumnNotFound(String, #[source] PolarsError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
