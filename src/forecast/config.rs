use crate::store::config::DEFAULT_PRECISION;
use bon::Builder;
use chrono::{Duration, NaiveDateTime};

/// Settings of the forecast revision pipeline.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, NaiveDateTime};
/// use meteo_archive::ForecastConfig;
///
/// let config = ForecastConfig::default();
/// assert_eq!(config.min_lead, Duration::hours(1));
/// assert_eq!(config.precision, 2);
///
/// let strict = ForecastConfig::builder().min_lead(Duration::hours(3)).build();
/// assert_eq!(strict.min_lead, Duration::hours(3));
///
/// let issued = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
///     .unwrap()
///     .and_hms_opt(9, 0, 0)
///     .unwrap();
/// let zero = ForecastConfig::builder().min_lead(Duration::zero()).build();
/// assert!(!zero.accepts(issued, issued));
/// assert!(zero.accepts(issued, issued + Duration::minutes(1)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct ForecastConfig {
    /// Cells with `target_time - issued_at` below this are discarded at ingestion.
    /// Targets at or before the issue instant are discarded whatever this is.
    #[builder(default = Duration::hours(1))]
    pub min_lead: Duration,
    /// Decimal places values are rounded to before comparison.
    #[builder(default = DEFAULT_PRECISION)]
    pub precision: u32,
}

impl ForecastConfig {
    /// Whether a cell forecast at `issued_at` for `target_time` is kept.
    pub fn accepts(&self, issued_at: NaiveDateTime, target_time: NaiveDateTime) -> bool {
        target_time > issued_at && target_time - issued_at >= self.min_lead
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
