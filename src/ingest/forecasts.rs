//! Forecast frames in, lead-time filtered [`ForecastSnapshot`]s out.

use crate::forecast::config::ForecastConfig;
use crate::ingest::error::IngestError;
use crate::ingest::{
    require_columns, IngestReport, ENTITY_COLUMN, ISSUED_AT_COLUMN, TARGET_TIME_COLUMN,
    VALUE_COLUMN, VARIABLE_COLUMN,
};
use crate::types::forecast::{ForecastCell, ForecastSnapshot};
use crate::types::timestamp::round_to;
use crate::utils::{float_values, string_values, timestamp_values};
use chrono::NaiveDateTime;
use log::{debug, warn};
use polars::prelude::*;
use std::collections::BTreeMap;

/// Builds the snapshot of one fetch from a `{entity, target_time, variable, value}`
/// frame. `issued_at` is the fetch instant; an `issued_at` column, if present, is ignored.
///
/// Cells less than [`ForecastConfig::min_lead`] ahead of `issued_at`, or not
/// ahead of it at all, are dropped and counted as outside the window.
pub fn snapshot_from_frame(
    frame: &DataFrame,
    issued_at: NaiveDateTime,
    config: &ForecastConfig,
) -> Result<(ForecastSnapshot, IngestReport), IngestError> {
    let issue_instants = vec![Some(issued_at); frame.height()];
    let (mut snapshots, report) = group_cells(frame, &issue_instants, config)?;
    let snapshot = snapshots
        .pop()
        .unwrap_or_else(|| ForecastSnapshot::new(issued_at));
    Ok((snapshot, report))
}

/// Splits a `{entity, issued_at, target_time, variable, value}` frame into one
/// snapshot per issue instant, ordered by issue instant. Within a snapshot,
/// cells keep frame order.
pub fn snapshots_from_frame(
    frame: &DataFrame,
    config: &ForecastConfig,
) -> Result<(Vec<ForecastSnapshot>, IngestReport), IngestError> {
    require_columns(frame, &[ISSUED_AT_COLUMN])?;
    let issue_instants = timestamp_values(frame, ISSUED_AT_COLUMN)?;
    group_cells(frame, &issue_instants, config)
}

fn group_cells(
    frame: &DataFrame,
    issue_instants: &[Option<NaiveDateTime>],
    config: &ForecastConfig,
) -> Result<(Vec<ForecastSnapshot>, IngestReport), IngestError> {
    require_columns(
        frame,
        &[ENTITY_COLUMN, TARGET_TIME_COLUMN, VARIABLE_COLUMN, VALUE_COLUMN],
    )?;

    let entities = string_values(frame, ENTITY_COLUMN)?;
    let targets = timestamp_values(frame, TARGET_TIME_COLUMN)?;
    let variables = string_values(frame, VARIABLE_COLUMN)?;
    let values = float_values(frame, VALUE_COLUMN)?;

    let mut report = IngestReport::default();
    let mut snapshots: BTreeMap<NaiveDateTime, ForecastSnapshot> = BTreeMap::new();

    let rows = entities
        .into_iter()
        .zip(issue_instants.iter().copied())
        .zip(targets)
        .zip(variables)
        .zip(values);
    for ((((entity, issued_at), target_time), variable), value) in rows {
        let (Some(entity), Some(issued_at), Some(target_time), Some(variable), Some(value)) =
            (entity, issued_at, target_time, variable, value)
        else {
            report.malformed += 1;
            continue;
        };
        if !config.accepts(issued_at, target_time) {
            report.outside_window += 1;
            continue;
        }
        snapshots
            .entry(issued_at)
            .or_insert_with(|| ForecastSnapshot::new(issued_at))
            .cells
            .push(ForecastCell {
                entity,
                variable,
                target_time,
                value: round_to(value, config.precision),
            });
        report.accepted += 1;
    }

    if report.malformed > 0 {
        warn!(
            "Skipped {} malformed forecast rows out of {}",
            report.malformed,
            frame.height()
        );
    }
    debug!("Ingested forecast frame: {:?}", report);
    Ok((snapshots.into_values().collect(), report))
}
