use crate::forecast::grid::RevisionGrid;
use crate::types::forecast::ForecastRevision;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Revision grids of every `(entity, variable)` series, ordered by entity then variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevisionHistory {
    series: BTreeMap<(String, String), RevisionGrid>,
}

impl RevisionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        entity: &str,
        variable: &str,
        issued_at: NaiveDateTime,
        target_time: NaiveDateTime,
        value: f64,
    ) {
        self.series
            .entry((entity.to_string(), variable.to_string()))
            .or_default()
            .insert(issued_at, target_time, value);
    }

    pub fn insert_revision(&mut self, revision: &ForecastRevision) {
        self.insert(
            &revision.entity,
            &revision.variable,
            revision.issued_at,
            revision.target_time,
            revision.value,
        );
    }

    pub fn series(&self, entity: &str, variable: &str) -> Option<&RevisionGrid> {
        self.series.get(&(entity.to_string(), variable.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// The forecast for `target_time` as known at issue instant `at`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use meteo_archive::RevisionHistory;
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    /// let hour = |h| day.and_hms_opt(h, 0, 0).unwrap();
    ///
    /// let mut history = RevisionHistory::new();
    /// history.insert("La Paz", "temperatura", hour(0), hour(12), 18.0);
    /// history.insert("La Paz", "temperatura", hour(3), hour(12), 19.5);
    ///
    /// assert_eq!(history.value_as_of("La Paz", "temperatura", hour(12), hour(2)), Some(18.0));
    /// assert_eq!(history.value_as_of("La Paz", "temperatura", hour(12), hour(4)), Some(19.5));
    /// assert_eq!(history.value_as_of("Oruro", "temperatura", hour(12), hour(4)), None);
    /// ```
    pub fn value_as_of(
        &self,
        entity: &str,
        variable: &str,
        target_time: NaiveDateTime,
        at: NaiveDateTime,
    ) -> Option<f64> {
        self.series(entity, variable)?.value_as_of(target_time, at)
    }

    /// Every compacted revision, ordered by entity, variable, target and issue instant.
    pub fn compacted(&self) -> Vec<ForecastRevision> {
        self.series
            .iter()
            .flat_map(|((entity, variable), grid)| {
                grid.compacted()
                    .into_iter()
                    .map(move |(target_time, issued_at, value)| ForecastRevision {
                        entity: entity.clone(),
                        variable: variable.clone(),
                        target_time,
                        issued_at,
                        value,
                    })
            })
            .collect()
    }
}

impl<'a> FromIterator<&'a ForecastRevision> for RevisionHistory {
    fn from_iter<I: IntoIterator<Item = &'a ForecastRevision>>(iter: I) -> Self {
        let mut history = RevisionHistory::new();
        for revision in iter {
            history.insert_revision(revision);
        }
        history
    }
}
