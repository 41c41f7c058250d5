use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Station list is unavailable: {0}")]
    StationsUnavailable(String),

    #[error("Source unavailable for station '{station}': {reason}")]
    Unavailable { station: String, reason: String },

    #[error("Source returned an unusable frame for station '{station}'")]
    InvalidFrame {
        station: String,
        #[source]
        source: PolarsError,
    },
}
