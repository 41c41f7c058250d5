mod archive;
mod clients;
mod error;
mod forecast;
mod ingest;
mod partition;
mod source;
mod store;
mod types;
mod utils;

pub use archive::Archive;
pub use error::ArchiveError;

pub use clients::forecast_client::ForecastClient;
pub use clients::historical_client::HistoricalClient;
pub use clients::observation_client::ObservationClient;
pub use clients::RunReport;

pub use source::error::SourceError;
pub use source::{fetch_each, FetchOutcome, RawRecordSource};

pub use ingest::error::IngestError;
pub use ingest::forecasts::{snapshot_from_frame, snapshots_from_frame};
pub use ingest::observations::{observations_from_frame, pivot_wide};
pub use ingest::IngestReport;

pub use store::config::StoreConfig;
pub use store::error::StoreError;
pub use store::upsert::{merge_frames, MergeReport, PartitionedUpsertStore, UpsertReport};

pub use forecast::compactor::{CompactionReport, ForecastRevisionCompactor};
pub use forecast::config::ForecastConfig;
pub use forecast::grid::RevisionGrid;
pub use forecast::history::RevisionHistory;
pub use forecast::store::ForecastRevisionStore;

pub use partition::layout::PartitionLayout;

pub use types::bucket::{BucketId, Granularity, IsoWeek, Month, Year};
pub use types::forecast::{ForecastCell, ForecastRevision, ForecastSnapshot};
pub use types::observation::Observation;
pub use types::record_kind::RecordKind;
pub use types::station::{Location, Region, Station};
pub use types::timestamp::{floor_to_hour, parse_timestamp};
