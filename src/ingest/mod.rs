//! Turns normalized source frames into typed records.
//!
//! Rows that violate the expected schema are dropped one by one and counted in
//! an [`IngestReport`]; only a frame missing a whole column is rejected.

pub mod error;
pub mod forecasts;
pub mod observations;

use crate::ingest::error::IngestError;
use polars::prelude::DataFrame;
use serde::Serialize;
use std::ops::AddAssign;

pub const ENTITY_COLUMN: &str = "entity";
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const VARIABLE_COLUMN: &str = "variable";
pub const VALUE_COLUMN: &str = "value";
pub const ISSUED_AT_COLUMN: &str = "issued_at";
pub const TARGET_TIME_COLUMN: &str = "target_time";

/// Row accounting for one ingested frame (or a sum of several).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Rows turned into records.
    pub accepted: usize,
    /// Rows with a missing key field or a non-numeric value.
    pub malformed: usize,
    /// Rows repeating an earlier row's key within the same batch.
    pub duplicates: usize,
    /// Forecast rows closer to their issue instant than the minimum lead time.
    pub outside_window: usize,
}

impl IngestReport {
    /// Every row that did not become a record.
    pub fn skipped(&self) -> usize {
        self.malformed + self.duplicates + self.outside_window
    }
}

impl AddAssign for IngestReport {
    fn add_assign(&mut self, other: Self) {
        self.accepted += other.accepted;
        self.malformed += other.malformed;
        self.duplicates += other.duplicates;
        self.outside_window += other.outside_window;
    }
}

pub(crate) fn require_columns(frame: &DataFrame, required: &[&str]) -> Result<(), IngestError> {
    for name in required {
        if let Err(e) = frame.column(name) {
            return Err(IngestError::ColumnNotFound(name.to_string(), e));
        }
    }
    Ok(())
}
