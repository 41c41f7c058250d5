//! Provides the `HistoricalClient` for archiving daily historical station records.
//!
//! Obtained via [`Archive::historical()`]. Works like the observation client,
//! but keys rows by date and partitions them per calendar year.

use crate::archive::Archive;
use crate::clients::{archive_observations, RunReport};
use crate::error::ArchiveError;
use crate::source::RawRecordSource;
use crate::types::record_kind::RecordKind;
use crate::types::station::Station;
use bon::bon;

/// Merges daily historical records into the yearly partitions under
/// `<root>/data_historical`. Created by [`Archive::historical()`].
pub struct HistoricalClient<'a> {
    /// The archive whose data folder and store settings are used.
    archive: &'a Archive,
}

#[bon]
impl<'a> HistoricalClient<'a> {
    /// Creates a new `HistoricalClient`. Called by [`Archive::historical()`].
    pub(crate) fn new(archive: &'a Archive) -> Self {
        Self { archive }
    }

    /// Fetches historical records from `source` and merges them into the archive.
    /// Timestamps are stored as dates (`%Y-%m-%d`).
    ///
    /// # Arguments (Initial Builder Method)
    ///
    /// * `source` - The [`RawRecordSource`] delivering daily record frames.
    ///
    /// Optional: `.stations(Vec<Station>)` restricts the run to those stations.
    ///
    /// # Returns
    ///
    /// A [`RunReport`] with one merge report per touched yearly partition.
    ///
    /// # Errors
    ///
    /// Same as [`crate::ObservationClient`]: [`ArchiveError::Source`] when the
    /// station list is unavailable, [`ArchiveError::Store`] when a partition is
    /// corrupt or cannot be written.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use meteo_archive::{Archive, ArchiveError, RawRecordSource, Station};
    /// # async fn run(source: impl RawRecordSource, oruro: Station) -> Result<(), ArchiveError> {
    /// let archive = Archive::new().await?;
    /// let report = archive
    ///     .historical()
    ///     .source(&source)
    ///     .stations(vec![oruro])
    ///     .call()
    ///     .await?;
    /// println!("{} days added", report.rows_added());
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
        archive_observations(self.archive, source, RecordKind::Historical, stations).await
    }
}
