use crate::types::timestamp::parse_timestamp;
use chrono::NaiveDateTime;
use log::info;
use polars::prelude::*;
use std::io;
use std::path::{Path, PathBuf};

const DATA_DIR_NAME: &str = "meteo_archive";

pub fn get_data_dir() -> io::Result<PathBuf> {
    dirs::data_dir()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine system data directory",
            )
        })
        .map(|p| p.join(DATA_DIR_NAME))
}

pub async fn ensure_data_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Data path exists but is not a directory: {}", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating data directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

/// Parses every cell of `name` as a timestamp. Nulls and unparsable cells become `None`.
pub(crate) fn timestamp_values(
    df: &DataFrame,
    name: &str,
) -> PolarsResult<Vec<Option<NaiveDateTime>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_timestamp))
        .collect())
}

/// Reads `name` as trimmed strings. Nulls and blank cells become `None`.
pub(crate) fn string_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect())
}

/// Reads `name` as finite floats. Nulls, NaN and non-numeric cells become `None`.
pub(crate) fn float_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let column = df.column(name)?;
    let values: Vec<Option<f64>> = match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
            .collect(),
        _ => column.cast(&DataType::Float64)?.f64()?.into_iter().collect(),
    };
    Ok(values
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}
