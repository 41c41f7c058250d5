use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Required column '{0}' not found in source frame")]
    ColumnNotFound(String, #[source] PolarsError),

    #[error("Failed processing source frame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
