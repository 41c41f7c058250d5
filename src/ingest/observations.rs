//! Long `{entity, timestamp, variable, value}` frames in, wide store rows out.

use crate::ingest::error::IngestError;
use crate::ingest::{
    require_columns, IngestReport, ENTITY_COLUMN, TIMESTAMP_COLUMN, VALUE_COLUMN, VARIABLE_COLUMN,
};
use crate::store::config::StoreConfig;
use crate::types::observation::Observation;
use crate::types::timestamp::{format_timestamp, round_to};
use crate::utils::{float_values, string_values, timestamp_values};
use chrono::NaiveDateTime;
use log::{debug, warn};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Validates a long observation frame.
///
/// Values are rounded to `precision` decimals. Within the frame the first row
/// for an `(entity, timestamp, variable)` key wins; later repeats are counted as
/// duplicates.
///
/// # Errors
///
/// Returns [`IngestError::ColumnNotFound`] if one of the four columns is absent.
/// Individual bad rows never fail the frame.
pub fn observations_from_frame(
    frame: &DataFrame,
    precision: u32,
) -> Result<(Vec<Observation>, IngestReport), IngestError> {
    require_columns(
        frame,
        &[ENTITY_COLUMN, TIMESTAMP_COLUMN, VARIABLE_COLUMN, VALUE_COLUMN],
    )?;

    let entities = string_values(frame, ENTITY_COLUMN)?;
    let timestamps = timestamp_values(frame, TIMESTAMP_COLUMN)?;
    let variables = string_values(frame, VARIABLE_COLUMN)?;
    let values = float_values(frame, VALUE_COLUMN)?;

    let mut report = IngestReport::default();
    let mut seen: HashSet<(String, NaiveDateTime, String)> = HashSet::new();
    let mut observations = Vec::with_capacity(frame.height());

    for (((entity, timestamp), variable), value) in
        entities.into_iter().zip(timestamps).zip(variables).zip(values)
    {
        let (Some(entity), Some(timestamp), Some(variable), Some(value)) =
            (entity, timestamp, variable, value)
        else {
            report.malformed += 1;
            continue;
        };
        if !seen.insert((entity.clone(), timestamp, variable.clone())) {
            report.duplicates += 1;
            continue;
        }
        observations.push(Observation {
            entity,
            timestamp,
            variable,
            value: round_to(value, precision),
        });
    }

    report.accepted = observations.len();
    if report.malformed > 0 {
        warn!(
            "Skipped {} malformed observation rows out of {}",
            report.malformed,
            frame.height()
        );
    }
    debug!("Ingested observation frame: {:?}", report);
    Ok((observations, report))
}

/// Pivots observations into the store's wide layout: one row per
/// `(timestamp, entity)`, one column per variable, sorted by key.
///
/// Variable columns are ordered alphabetically. If two observations share a
/// key and variable, the first one wins.
pub fn pivot_wide(
    observations: &[Observation],
    config: &StoreConfig,
    timestamp_format: &str,
) -> PolarsResult<DataFrame> {
    let mut rows: BTreeMap<(NaiveDateTime, &str), BTreeMap<&str, f64>> = BTreeMap::new();
    let mut variables: BTreeSet<&str> = BTreeSet::new();

    for observation in observations {
        let variable = observation.variable.as_str();
        if variable == config.timestamp_column || variable == config.entity_column {
            warn!("Ignoring variable '{}' that clashes with a key column", variable);
            continue;
        }
        variables.insert(variable);
        rows.entry((observation.timestamp, observation.entity.as_str()))
            .or_default()
            .entry(variable)
            .or_insert(observation.value);
    }

    let timestamps: Vec<String> = rows
        .keys()
        .map(|(timestamp, _)| format_timestamp(*timestamp, timestamp_format))
        .collect();
    let entities: Vec<&str> = rows.keys().map(|(_, entity)| *entity).collect();

    let mut columns = Vec::with_capacity(variables.len() + 2);
    columns.push(Column::new(config.timestamp_column.as_str().into(), timestamps));
    columns.push(Column::new(config.entity_column.as_str().into(), entities));
    for variable in variables {
        let values: Vec<Option<f64>> = rows.values().map(|row| row.get(variable).copied()).collect();
        columns.push(Column::new(variable.into(), values));
    }
    DataFrame::new(columns)
}
