//! The main entry point: an archive directory plus the settings its stores share.

use crate::clients::forecast_client::ForecastClient;
use crate::clients::historical_client::HistoricalClient;
use crate::clients::observation_client::ObservationClient;
use crate::error::ArchiveError;
use crate::forecast::config::ForecastConfig;
use crate::forecast::store::ForecastRevisionStore;
use crate::store::config::StoreConfig;
use crate::store::upsert::PartitionedUpsertStore;
use crate::types::record_kind::RecordKind;
use crate::utils::{ensure_data_dir_exists, get_data_dir};
use std::path::{Path, PathBuf};

/// A weather archive rooted at one data directory.
///
/// ```text
/// <root>/data/               monthly observation partitions
/// <root>/data_historical/    yearly historical partitions
/// <root>/data_forecast/      weekly forecast revision partitions
/// ```
///
/// Create one with [`Archive::new()`] to use the platform data directory, or
/// [`Archive::with_data_folder()`] for an explicit location. Updates are run
/// through the per-kind clients returned by [`Archive::observations()`],
/// [`Archive::historical()`] and [`Archive::forecasts()`].
///
/// # Examples
///
/// ```no_run
/// # use meteo_archive::{Archive, ArchiveError, StoreConfig};
/// # async fn run() -> Result<(), ArchiveError> {
/// let archive = Archive::with_data_folder("/var/lib/meteo".into())
///     .await?
///     .with_store_config(StoreConfig::builder().precision(1).build());
/// assert_eq!(archive.store_config().precision, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Archive {
    /// Directory holding the partition folders.
    root: PathBuf,
    /// Key columns and precision of the observation and historical stores.
    store_config: StoreConfig,
    /// Lead-time filter and precision of the forecast store.
    forecast_config: ForecastConfig,
}

impl Archive {
    /// Opens the archive at `data_folder`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::DataDirCreation`] if the directory cannot be
    /// created or the path exists but is not a directory.
    pub async fn with_data_folder(data_folder: PathBuf) -> Result<Self, ArchiveError> {
        ensure_data_dir_exists(&data_folder)
            .await
            .map_err(|e| ArchiveError::DataDirCreation(data_folder.clone(), e))?;
        Ok(Self {
            root: data_folder,
            store_config: StoreConfig::default(),
            forecast_config: ForecastConfig::default(),
        })
    }

    /// Opens the archive in the platform data directory (e.g.
    /// `~/.local/share/meteo_archive` on Linux).
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::DataDirResolution`] if there is no platform data
    /// directory and [`ArchiveError::DataDirCreation`] if it cannot be created.
    pub async fn new() -> Result<Self, ArchiveError> {
        let data_folder = get_data_dir().map_err(ArchiveError::DataDirResolution)?;
        Self::with_data_folder(data_folder).await
    }

    /// Replaces the settings of the observation and historical stores.
    ///
    /// # Arguments
    ///
    /// * `store_config` - Column names and value precision, see [`StoreConfig`].
    pub fn with_store_config(mut self, store_config: StoreConfig) -> Self {
        self.store_config = store_config;
        self
    }

    /// Replaces the settings of the forecast revision store.
    ///
    /// # Arguments
    ///
    /// * `forecast_config` - Minimum lead time and value precision, see [`ForecastConfig`].
    pub fn with_forecast_config(mut self, forecast_config: ForecastConfig) -> Self {
        self.forecast_config = forecast_config;
        self
    }

    /// The archive's data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store_config(&self) -> &StoreConfig {
        &self.store_config
    }

    pub fn forecast_config(&self) -> &ForecastConfig {
        &self.forecast_config
    }

    /// Near-real-time observations, merged into monthly partitions.
    pub fn observations(&self) -> ObservationClient<'_> {
        ObservationClient::new(self)
    }

    /// Daily historical records, merged into yearly partitions.
    pub fn historical(&self) -> HistoricalClient<'_> {
        HistoricalClient::new(self)
    }

    /// Forecast snapshots, compacted into weekly revision partitions.
    pub fn forecasts(&self) -> ForecastClient<'_> {
        ForecastClient::new(self)
    }

    /// The store behind [`Archive::observations()`], for merging frames directly.
    pub fn observation_store(&self) -> PartitionedUpsertStore {
        self.upsert_store(RecordKind::Observation)
    }

    pub fn historical_store(&self) -> PartitionedUpsertStore {
        self.upsert_store(RecordKind::Historical)
    }

    /// The weekly forecast revision store, e.g. to read back a
    /// [`crate::RevisionHistory`].
    pub fn forecast_store(&self) -> ForecastRevisionStore {
        ForecastRevisionStore::for_root(&self.root, self.forecast_config)
    }

    pub(crate) fn upsert_store(&self, kind: RecordKind) -> PartitionedUpsertStore {
        PartitionedUpsertStore::for_kind(&self.root, kind, self.store_config.clone())
    }
}
