//! Provides the `ObservationClient` for archiving near-real-time station observations.
//!
//! This client acts as an intermediate builder, obtained via [`Archive::observations()`],
//! allowing the user to hand over the record source (and optionally a subset of
//! stations) before running the fetch and merge into the monthly partitions.

use crate::archive::Archive;
use crate::clients::{archive_observations, RunReport};
use crate::error::ArchiveError;
use crate::source::RawRecordSource;
use crate::types::record_kind::RecordKind;
use crate::types::station::Station;
use bon::bon;

/// Merges the latest observations of every station into the monthly
/// partitions under `<root>/data`.
///
/// Instances are created by calling [`Archive::observations()`]. Rows already
/// in the archive win over re-sent rows with the same timestamp and station.
pub struct ObservationClient<'a> {
    /// The archive whose data folder and store settings are used.
    archive: &'a Archive,
}

#[bon]
impl<'a> ObservationClient<'a> {
    /// Creates a new `ObservationClient`.
    ///
    /// This is typically called internally by [`Archive::observations()`].
    ///
    /// # Arguments
    ///
    /// * `archive` - A reference to the configured `Archive` instance.
    pub(crate) fn new(archive: &'a Archive) -> Self {
        Self { archive }
    }

    /// Fetches observations from `source` and merges them into the archive.
    ///
    /// This method starts a builder pattern. You can optionally specify:
    /// *   `.stations(Vec<Station>)`: The stations to fetch. By default every
    ///     station returned by [`RawRecordSource::stations`] is fetched.
    ///
    /// Finally, call `.call().await` on the builder to run the fetch and merge.
    ///
    /// # Arguments (Initial Builder Method)
    ///
    /// * `source` - The [`RawRecordSource`] delivering station lists and observation frames.
    ///
    /// # Returns
    ///
    /// A [`RunReport`] listing how many stations were fetched, which failed, how
    /// many rows were accepted or rejected, and one merge report per touched
    /// monthly partition.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Source`] if the station list cannot be fetched,
    /// and [`ArchiveError::Store`] if a partition is corrupt or cannot be
    /// written. Failures of single stations are reported in [`RunReport::failed_stations`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use meteo_archive::{Archive, ArchiveError, RawRecordSource};
    /// # async fn run(source: impl RawRecordSource) -> Result<(), ArchiveError> {
    /// let archive = Archive::new().await?;
    /// let report = archive.observations().source(&source).call().await?;
    /// println!("{} new rows, {} stations failed", report.rows_added(), report.failed_stations.len());
    /// # Ok(())
    /// # }
    /// ```
    #[builder(start_fn = source)]
    #[doc(hidden)]
    pub async fn build_source<S: RawRecordSource>(
        &self,
        #[builder(start_fn)] source: &S,
        stations: Option<Vec<Station>>,
    ) -> Result<RunReport, ArchiveError> {
        archive_observations(self.archive, source, RecordKind::Observation, stations).await
    }
}
