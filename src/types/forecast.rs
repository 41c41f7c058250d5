//! Forecast snapshots as fetched, and the revisions they are compacted into.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One forecast value inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCell {
    pub entity: String,
    pub variable: String,
    pub target_time: NaiveDateTime,
    pub value: f64,
}

/// Everything one forecast fetch returned, stamped with the fetch instant.
///
/// Only cells at least the configured lead time ahead of `issued_at` are kept
/// (see [`crate::ForecastConfig::min_lead`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub issued_at: NaiveDateTime,
    pub cells: Vec<ForecastCell>,
}

impl ForecastSnapshot {
    pub fn new(issued_at: NaiveDateTime) -> Self {
        Self {
            issued_at,
            cells: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A stored forecast value: the forecast for `target_time` as known at
/// `issued_at`, valid until a later revision for the same target supersedes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRevision {
    pub entity: String,
    pub variable: String,
    pub target_time: NaiveDateTime,
    pub issued_at: NaiveDateTime,
    pub value: f64,
}

impl ForecastRevision {
    /// Lead time of this revision (`target_time - issued_at`).
    pub fn lead_time(&self) -> Duration {
        self.target_time - self.issued_at
    }
}
