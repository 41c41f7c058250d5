pub mod bucket;
pub mod forecast;
pub mod observation;
pub mod record_kind;
pub mod station;
pub mod timestamp;
