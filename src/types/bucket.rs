//! Calendar buckets used to split the archive into partition files.
//!
//! A [`Granularity`] maps a record's primary timestamp to a [`BucketId`]. The
//! mapping is pure, so the same timestamp always lands in the same file.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Year(pub i32);
impl Year {
    pub fn get(self) -> i32 {
        self.0
    }
}

impl Display for Year {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Month(pub i32, pub u32);
impl Month {
    pub fn year(self) -> i32 {
        self.0
    }
    pub fn month(self) -> u32 {
        self.1
    }
    pub fn new(month: u32, year: i32) -> Self {
        Self(year, month)
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0, self.1)
    }
}

/// An ISO-8601 week: ISO year plus week number (1..=53).
///
/// The ISO year differs from the calendar year around New Year, e.g.
/// 2024-12-30 belongs to week 1 of ISO year 2025.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct IsoWeek(pub i32, pub u32);
impl IsoWeek {
    pub fn year(self) -> i32 {
        self.0
    }
    pub fn week(self) -> u32 {
        self.1
    }
}

impl Display for IsoWeek {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.0, self.1)
    }
}

/// The calendar period size used to bucket a record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    /// ISO year + week number. Used for hourly forecast snapshots.
    IsoWeek,
    /// Calendar month. Used for near-real-time observations.
    Month,
    /// Calendar year. Used for daily historical records.
    Year,
}

impl Granularity {
    /// Assigns `timestamp` to its bucket.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use meteo_archive::{BucketId, Granularity, IsoWeek, Month};
    ///
    /// let ts = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap().and_hms_opt(9, 0, 0).unwrap();
    /// assert_eq!(Granularity::Month.bucket_id(ts), BucketId::Month(Month(2024, 12)));
    /// assert_eq!(Granularity::IsoWeek.bucket_id(ts), BucketId::IsoWeek(IsoWeek(2025, 1)));
    /// ```
    pub fn bucket_id(&self, timestamp: NaiveDateTime) -> BucketId {
        match self {
            Granularity::IsoWeek => {
                let week = timestamp.date().iso_week();
                BucketId::IsoWeek(IsoWeek(week.year(), week.week()))
            }
            Granularity::Month => BucketId::Month(Month(timestamp.year(), timestamp.month())),
            Granularity::Year => BucketId::Year(Year(timestamp.year())),
        }
    }
}

/// Identity of one partition file.
///
/// Ids of the same granularity order chronologically.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum BucketId {
    IsoWeek(IsoWeek),
    Month(Month),
    Year(Year),
}

impl BucketId {
    /// File name (without extension) of the partition.
    pub fn file_stem(&self) -> String {
        match self {
            BucketId::IsoWeek(w) => format!("{:04}{:02}", w.year(), w.week()),
            BucketId::Month(m) => format!("{:04}{:02}", m.year(), m.month()),
            BucketId::Year(y) => format!("{}", y),
        }
    }

    /// Sub-directory the partition lives in, relative to the record kind's directory.
    /// Weekly partitions are grouped per ISO year.
    pub fn subdirectory(&self) -> Option<String> {
        match self {
            BucketId::IsoWeek(w) => Some(format!("{:04}", w.year())),
            BucketId::Month(_) | BucketId::Year(_) => None,
        }
    }
}

impl Display for BucketId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BucketId::IsoWeek(w) => w.fmt(f),
            BucketId::Month(m) => m.fmt(f),
            BucketId::Year(y) => y.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_month_buckets() {
        let bucket = Granularity::Month.bucket_id(at(2024, 2, 29));
        assert_eq!(bucket, BucketId::Month(Month(2024, 2)));
        assert_eq!(bucket.file_stem(), "202402");
        assert_eq!(bucket.subdirectory(), None);
        assert_eq!(bucket.to_string(), "2024-02");
    }

    #[test]
    fn test_year_buckets() {
        let bucket = Granularity::Year.bucket_id(at(2023, 12, 31));
        assert_eq!(bucket, BucketId::Year(Year(2023)));
        assert_eq!(bucket.file_stem(), "2023");
    }

    #[test]
    fn test_iso_week_crosses_calendar_year() {
        // 2021-01-01 is a Friday in ISO week 53 of 2020.
        let bucket = Granularity::IsoWeek.bucket_id(at(2021, 1, 1));
        assert_eq!(bucket, BucketId::IsoWeek(IsoWeek(2020, 53)));
        assert_eq!(bucket.file_stem(), "202053");
        assert_eq!(bucket.subdirectory().as_deref(), Some("2020"));
        assert_eq!(bucket.to_string(), "2020-W53");
    }

    #[test]
    fn test_buckets_order_chronologically() {
        let earlier = Granularity::IsoWeek.bucket_id(at(2024, 3, 4));
        let later = Granularity::IsoWeek.bucket_id(at(2024, 3, 11));
        assert!(earlier < later);

        let jan = Granularity::Month.bucket_id(at(2024, 1, 31));
        let feb = Granularity::Month.bucket_id(at(2024, 2, 1));
        assert!(jan < feb);
    }

    #[test]
    fn test_same_week_same_bucket() {
        // Monday through Sunday of one ISO week.
        let monday = Granularity::IsoWeek.bucket_id(at(2024, 1, 8));
        let sunday = Granularity::IsoWeek.bucket_id(at(2024, 1, 14));
        assert_eq!(monday, sunday);
    }
}
