use bon::Builder;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMESTAMP_COLUMN: &str = "timestamp";
pub const DEFAULT_ENTITY_COLUMN: &str = "entity";
pub const DEFAULT_PRECISION: u32 = 2;

/// Column naming and rounding for a wide observation store.
///
/// The unique key of every partition row is `(timestamp_column, entity_column)`;
/// all other columns hold one measured variable each.
///
/// # Examples
///
/// ```
/// use meteo_archive::StoreConfig;
///
/// let config = StoreConfig::builder()
///     .timestamp_column("fecha")
///     .entity_column("estacion")
///     .build();
/// assert_eq!(config.key_columns(), vec!["fecha".to_string(), "estacion".to_string()]);
/// assert_eq!(config.precision, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct StoreConfig {
    /// Column holding the primary timestamp. Rows are bucketed on it.
    #[builder(into, default = DEFAULT_TIMESTAMP_COLUMN.to_string())]
    pub timestamp_column: String,
    /// Column holding the station name.
    #[builder(into, default = DEFAULT_ENTITY_COLUMN.to_string())]
    pub entity_column: String,
    /// Decimal places values are rounded to at ingestion.
    #[builder(default = DEFAULT_PRECISION)]
    pub precision: u32,
}

impl StoreConfig {
    /// The unique key, in sort order.
    pub fn key_columns(&self) -> Vec<String> {
        vec![self.timestamp_column.clone(), self.entity_column.clone()]
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
