//! Forecast revision history: compaction of repeated forecast snapshots and
//! the weekly partition store that persists the result.

pub mod compactor;
pub mod config;
pub mod grid;
pub mod history;
pub mod store;
