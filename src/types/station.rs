//! Monitoring stations, the entities every archived record belongs to.

use serde::{Deserialize, Serialize};

/// A weather station as listed by the source's station directory.
///
/// The archive only ever reads stations: `name` is the identifier written into
/// every partition row, the remaining fields are descriptive.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Station {
    /// Unique station name, used as the entity key (e.g. "El Alto").
    pub name: String,
    /// Administrative region the station belongs to.
    pub region: Region,
    /// Geographical position, if the directory reports one.
    pub location: Option<Location>,
}

impl Station {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: Region::default(),
            location: None,
        }
    }
}

/// Administrative subdivisions reported for a station.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Region {
    pub department: Option<String>,
    pub province: Option<String>,
    pub municipality: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub longitude: f64,
}
