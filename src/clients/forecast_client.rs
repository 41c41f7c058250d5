//! Provides the `ForecastClient` for archiving forecast snapshots as a revision history.
//!
//! This client is obtained via [`Archive::forecasts()`]. Each run fetches one
//! snapshot per station, merges them into a single snapshot issued at the
//! current hour and compacts it into the weekly revision partitions.

use crate::archive::Archive;
use crate::clients::{resolve_stations, RunReport};
use crate::error::ArchiveError;
use crate::ingest::forecasts::snapshot_from_frame;
use crate::source::{fetch_each, FetchOutcome, RawRecordSource};
use crate::types::forecast::ForecastSnapshot;
use crate::types::record_kind::RecordKind;
use crate::types::station::Station;
use crate::types::timestamp::floor_to_hour;
use bon::bon;
use chrono::NaiveDateTime;
use log::{info, warn};
use tokio::task;

/// Compacts the forecasts of every station into the weekly revision
/// partitions under `<root>/data_forecast`. Created by [`Archive::forecasts()`].
pub struct ForecastClient<'a> {
    /// The archive whose data folder and forecast settings are used.
    archive: &'a Archive,
}

#[bon]
impl<'a> ForecastClient<'a> {
    /// Creates a new `ForecastClient`.
    ///
    /// # Arguments
    ///
    /// * `archive` - A reference to the configured `Archive` instance.
    pub(crate) fn new(archive: &'a Archive) -> Self {
        Self { archive }
    }

    /// Fetches forecasts from `source` and stores the values that changed.
    ///
    /// `now` is the fetch instant; it is truncated to the hour and used as the
    /// issue instant of every fetched cell. Cells less than
    /// [`crate::ForecastConfig::min_lead`] ahead of it are discarded.
    ///
    /// # Arguments (Initial Builder Method)
    ///
    /// * `source` - The [`RawRecordSource`] delivering forecast frames.
    ///
    /// Required: `.now(NaiveDateTime)`, the fetch instant in UTC. Optional:
    /// `.stations(Vec<Station>)` to restrict the run.
    ///
    /// # Returns
    ///
    /// A [`RunReport`]; `ingest.outside_window` counts the discarded cells and
    /// each partition report holds the revision counts before and after.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::Source`] if the station list cannot be fetched,
    /// [`ArchiveError::Store`] if the weekly partition is corrupt or cannot be
    /// written, [`ArchiveError::TaskJoin`] if the compaction task panics.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use meteo_archive::{Archive, ArchiveError, RawRecordSource};
    /// # async fn run(source: impl RawRecordSource) -> Result<(), ArchiveError> {
    /// let archive = Archive::new().await?;
    /// let now = chrono::Utc::now().naive_utc();
    /// let report = archive.forecasts().source(&source).now(now).call().await?;
    /// println!("{} new revisions", report.rows_added());
    /// # Ok(())
    /// # }
    /// ```
    #[builder(start_fn = source)]
    #[doc(hidden)]
    pub async fn build_source<S: RawRecordSource>(
        &self,
        #[builder(start_fn)] source: &S,
        now: NaiveDateTime,
        stations: Option<Vec<Station>>,
    ) -> Result<RunReport, ArchiveError> {
        let kind = RecordKind::Forecast;
        let issued_at = floor_to_hour(now);
        let stations = resolve_stations(source, stations).await?;
        let mut report = RunReport::new(kind, stations.len());
        let config = *self.archive.forecast_config();

        let mut snapshot = ForecastSnapshot::new(issued_at);
        for outcome in fetch_each(source, kind, &stations).await {
            match outcome {
                FetchOutcome::Fetched { station, frame } => {
                    match snapshot_from_frame(&frame, issued_at, &config) {
                        Ok((fetched, ingest)) => {
                            report.stations_fetched += 1;
                            report.ingest += ingest;
                            snapshot.cells.extend(fetched.cells);
                        }
                        Err(e) => {
                            warn!("Rejected forecast frame of station {}: {}", station.name, e);
                            report.failed_stations.push(station.name);
                        }
                    }
                }
                FetchOutcome::Failed { station, .. } => report.failed_stations.push(station.name),
            }
        }

        if snapshot.is_empty() {
            info!("No forecast cells issued at {} to archive", issued_at);
            return Ok(report);
        }

        let store = self.archive.forecast_store();
        report.partitions = task::spawn_blocking(move || store.update(&[snapshot])).await??;
        info!(
            "Archived forecasts issued at {}: {}/{} stations, {} cells, {} new revisions",
            issued_at,
            report.stations_fetched,
            report.stations_total,
            report.ingest.accepted,
            report.rows_added()
        );
        Ok(report)
    }
}
