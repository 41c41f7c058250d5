use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One measured variable at one station at one instant.
///
/// Values are rounded to the ingestion precision before they reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub entity: String,
    pub timestamp: NaiveDateTime,
    pub variable: String,
    pub value: f64,
}
