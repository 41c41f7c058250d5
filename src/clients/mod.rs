//! Per-kind update runs: fetch every station through a [`RawRecordSource`],
//! ingest what arrived and merge it into the archive.
//!
//! A station whose fetch fails, or whose frame lacks a required column, is
//! logged and listed in the [`RunReport`]; the other stations are still archived.

pub mod forecast_client;
pub mod historical_client;
pub mod observation_client;

use crate::archive::Archive;
use crate::error::ArchiveError;
use crate::ingest::observations::{observations_from_frame, pivot_wide};
use crate::ingest::IngestReport;
use crate::source::{fetch_each, FetchOutcome, RawRecordSource};
use crate::store::error::StoreError;
use crate::store::upsert::{MergeReport, UpsertReport};
use crate::types::record_kind::RecordKind;
use crate::types::station::Station;
use log::{info, warn};
use serde::Serialize;
use tokio::task;

/// Summary of one update run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub kind: RecordKind,
    /// Stations the run attempted.
    pub stations_total: usize,
    /// Stations whose records were ingested.
    pub stations_fetched: usize,
    /// Stations skipped because the source failed or returned an unusable frame.
    pub failed_stations: Vec<String>,
    /// Row accounting over all ingested frames.
    pub ingest: IngestReport,
    /// Rows the store dropped for lacking a valid key.
    pub skipped_rows: usize,
    /// One entry per partition written.
    pub partitions: Vec<MergeReport>,
}

impl RunReport {
    pub(crate) fn new(kind: RecordKind, stations_total: usize) -> Self {
        Self {
            kind,
            stations_total,
            stations_fetched: 0,
            failed_stations: Vec::new(),
            ingest: IngestReport::default(),
            skipped_rows: 0,
            partitions: Vec::new(),
        }
    }

    /// Rows (or forecast revisions) that did not exist before the run.
    pub fn rows_added(&self) -> usize {
        self.partitions.iter().map(MergeReport::added_rows).sum()
    }
}

/// Uses the explicit station list if given, else asks the source for one.
pub(crate) async fn resolve_stations<S: RawRecordSource>(
    source: &S,
    stations: Option<Vec<Station>>,
) -> Result<Vec<Station>, ArchiveError> {
    match stations {
        Some(stations) => Ok(stations),
        None => Ok(source.stations().await?),
    }
}

/// Fetch, ingest and upsert for the two wide observation kinds.
pub(crate) async fn archive_observations<S: RawRecordSource>(
    archive: &Archive,
    source: &S,
    kind: RecordKind,
    stations: Option<Vec<Station>>,
) -> Result<RunReport, ArchiveError> {
    let stations = resolve_stations(source, stations).await?;
    let mut report = RunReport::new(kind, stations.len());
    let precision = archive.store_config().precision;

    let mut observations = Vec::new();
    for outcome in fetch_each(source, kind, &stations).await {
        match outcome {
            FetchOutcome::Fetched { station, frame } => {
                match observations_from_frame(&frame, precision) {
                    Ok((rows, ingest)) => {
                        report.stations_fetched += 1;
                        report.ingest += ingest;
                        observations.extend(rows);
                    }
                    Err(e) => {
                        warn!("Rejected {} frame of station {}: {}", kind, station.name, e);
                        report.failed_stations.push(station.name);
                    }
                }
            }
            FetchOutcome::Failed { station, .. } => report.failed_stations.push(station.name),
        }
    }

    if observations.is_empty() {
        info!("No {} records to archive", kind);
        return Ok(report);
    }

    let store = archive.upsert_store(kind);
    let upsert = task::spawn_blocking(move || -> Result<UpsertReport, StoreError> {
        let wide = pivot_wide(&observations, store.config(), kind.timestamp_format())?;
        store.upsert(wide)
    })
    .await??;

    report.skipped_rows = upsert.skipped_rows;
    report.partitions = upsert.partitions;
    info!(
        "Archived {}: {}/{} stations, {} rows accepted, {} new rows in {} partitions",
        kind,
        report.stations_fetched,
        report.stations_total,
        report.ingest.accepted,
        report.rows_added(),
        report.partitions.len()
    );
    Ok(report)
}
