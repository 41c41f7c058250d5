//! The boundary to whatever fetches raw station lists and records.
//!
//! Network access, payload parsing and column renaming live behind
//! [`RawRecordSource`]; the archive only sees normalized frames:
//!
//! * observations and historical records: `{entity, timestamp, variable, value}`
//! * forecasts: `{entity, target_time, variable, value}`, optionally with `issued_at`

pub mod error;
#[cfg(test)]
pub(crate) mod memory;

use crate::source::error::SourceError;
use crate::types::record_kind::RecordKind;
use crate::types::station::Station;
use log::{debug, warn};
use polars::prelude::DataFrame;
use std::future::Future;

/// A provider of station metadata and normalized record frames.
pub trait RawRecordSource: Send + Sync {
    /// The stations to archive.
    fn stations(&self) -> impl Future<Output = Result<Vec<Station>, SourceError>> + Send;

    /// Fetches the current records of `kind` for one station.
    fn fetch(
        &self,
        kind: RecordKind,
        station: &Station,
    ) -> impl Future<Output = Result<DataFrame, SourceError>> + Send;
}

/// What a fetch for one station produced. A failed station never aborts the run.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched { station: Station, frame: DataFrame },
    Failed { station: Station, error: SourceError },
}

impl FetchOutcome {
    pub fn station(&self) -> &Station {
        match self {
            FetchOutcome::Fetched { station, .. } | FetchOutcome::Failed { station, .. } => station,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchOutcome::Fetched { .. })
    }
}

/// Fetches `kind` for every station in turn, one outcome per station in input order.
pub async fn fetch_each<S: RawRecordSource>(
    source: &S,
    kind: RecordKind,
    stations: &[Station],
) -> Vec<FetchOutcome> {
    let mut outcomes = Vec::with_capacity(stations.len());
    for station in stations {
        let outcome = match source.fetch(kind, station).await {
            Ok(frame) => {
                debug!(
                    "Fetched {} rows of {} for station {}",
                    frame.height(),
                    kind,
                    station.name
                );
                FetchOutcome::Fetched {
                    station: station.clone(),
                    frame,
                }
            }
            Err(error) => {
                warn!("Skipping station {} for {}: {}", station.name, kind, error);
                FetchOutcome::Failed {
                    station: station.clone(),
                    error,
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::MemorySource;
    use polars::prelude::*;

    #[tokio::test]
    async fn test_failed_station_does_not_stop_the_others() -> Result<(), Box<dyn std::error::Error>> {
        let source = MemorySource::new()
            .with_frame(
                RecordKind::Observation,
                "El Alto",
                df!("entity" => ["El Alto"], "timestamp" => ["2024-03-01T10:00:00"], "variable" => ["temperatura"], "value" => [8.0])?,
            )
            .failing("Oruro")
            .with_frame(
                RecordKind::Observation,
                "Potosi",
                df!("entity" => ["Potosi"], "timestamp" => ["2024-03-01T10:00:00"], "variable" => ["temperatura"], "value" => [2.0])?,
            );
        let stations = source.stations().await?;

        let outcomes = fetch_each(&source, RecordKind::Observation, &stations).await;

        let fetched: Vec<(&str, bool)> = outcomes
            .iter()
            .map(|o| (o.station().name.as_str(), o.is_fetched()))
            .collect();
        assert_eq!(
            fetched,
            vec![("El Alto", true), ("Oruro", false), ("Potosi", true)]
        );
        assert!(matches!(
            &outcomes[1],
            FetchOutcome::Failed { error: SourceError::Unavailable { .. }, .. }
        ));
        Ok(())
    }
}
