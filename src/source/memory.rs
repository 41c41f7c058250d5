use crate::source::error::SourceError;
use crate::source::RawRecordSource;
use crate::types::record_kind::RecordKind;
use crate::types::station::Station;
use polars::prelude::DataFrame;
use std::collections::{HashMap, HashSet};

/// Canned frames per station and record kind, for driving orchestrators in tests.
#[derive(Debug, Default, Clone)]
pub(crate) struct MemorySource {
    stations: Vec<Station>,
    frames: HashMap<(RecordKind, String), DataFrame>,
    failing: HashSet<String>,
    stations_unavailable: bool,
}

impl MemorySource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, name: &str) {
        if !self.stations.iter().any(|s| s.name == name) {
            self.stations.push(Station::new(name));
        }
    }

    pub(crate) fn with_frame(mut self, kind: RecordKind, station: &str, frame: DataFrame) -> Self {
        self.register(station);
        self.frames.insert((kind, station.to_string()), frame);
        self
    }

    /// Lists `station` but fails every fetch for it.
    pub(crate) fn failing(mut self, station: &str) -> Self {
        self.register(station);
        self.failing.insert(station.to_string());
        self
    }

    pub(crate) fn without_station_list(mut self) -> Self {
        self.stations_unavailable = true;
        self
    }
}

impl RawRecordSource for MemorySource {
    async fn stations(&self) -> Result<Vec<Station>, SourceError> {
        if self.stations_unavailable {
            return Err(SourceError::StationsUnavailable("connection refused".to_string()));
        }
        Ok(self.stations.clone())
    }

    async fn fetch(&self, kind: RecordKind, station: &Station) -> Result<DataFrame, SourceError> {
        if self.failing.contains(&station.name) {
            return Err(SourceError::Unavailable {
                station: station.name.clone(),
                reason: "timed out".to_string(),
            });
        }
        self.frames
            .get(&(kind, station.name.clone()))
            .cloned()
            .ok_or_else(|| SourceError::Unavailable {
                station: station.name.clone(),
                reason: format!("no {} records", kind),
            })
    }
}
