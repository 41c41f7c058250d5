//! Defines the kinds of records the archive consolidates and the storage
//! conventions (bucket granularity, directory, timestamp format) tied to each.

use crate::types::bucket::Granularity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three record kinds fetched from a weather source.
///
/// Each kind is archived into its own directory, partitioned by its own
/// calendar [`Granularity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Near-real-time station observations, re-fetched over a sliding window.
    /// Partitioned by calendar month.
    Observation,
    /// Daily historical station records. Partitioned by calendar year.
    Historical,
    /// Multi-horizon forecast snapshots, stored as a revision history.
    /// Partitioned by ISO week of the issue instant.
    Forecast,
}

impl RecordKind {
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            RecordKind::Observation => "data",
            RecordKind::Historical => "data_historical",
            RecordKind::Forecast => "data_forecast",
        }
    }

    /// The calendar bucket size used to split this kind into partition files.
    pub fn granularity(&self) -> Granularity {
        match self {
            RecordKind::Observation => Granularity::Month,
            RecordKind::Historical => Granularity::Year,
            RecordKind::Forecast => Granularity::IsoWeek,
        }
    }

    /// `strftime` pattern used when writing the primary timestamp of this kind.
    pub fn timestamp_format(&self) -> &'static str {
        match self {
            RecordKind::Historical => "%Y-%m-%d",
            RecordKind::Observation | RecordKind::Forecast => "%Y-%m-%dT%H:%M:%S",
        }
    }
}

/// Formats a `RecordKind` using its directory name.
///
/// # Examples
///
/// ```
/// use meteo_archive::RecordKind;
///
/// assert_eq!(RecordKind::Observation.to_string(), "data");
/// assert_eq!(format!("{}", RecordKind::Forecast), "data_forecast");
/// ```
impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}
