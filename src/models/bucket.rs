use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";
const FOREVER_KEY: &str = "forever";

/// Calendar date with no time component, serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Today in the local timezone.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// `None` when the result falls outside the supported calendar range.
    pub fn offset_days(&self, days: i64) -> Option<Self> {
        self.0.checked_add_signed(TimeDelta::try_days(days)?).map(Self)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        NaiveDate::parse_from_str(value, DATE_KEY_FORMAT)
            .map(Self)
            .map_err(|err| anyhow!("invalid date key '{value}': {err}"))
    }
}

impl TryFrom<String> for DateKey {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.to_string()
    }
}

/// A content partition of a group: one calendar date or the forever backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Bucket {
    Date(DateKey),
    Forever,
}

impl Bucket {
    pub fn today() -> Self {
        Bucket::Date(DateKey::today())
    }

    pub fn date_key(&self) -> Option<DateKey> {
        match self {
            Bucket::Date(key) => Some(*key),
            Bucket::Forever => None,
        }
    }
}

impl From<DateKey> for Bucket {
    fn from(key: DateKey) -> Self {
        Bucket::Date(key)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Date(key) => write!(f, "{key}"),
            Bucket::Forever => f.write_str(FOREVER_KEY),
        }
    }
}

impl FromStr for Bucket {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        if value == FOREVER_KEY {
            Ok(Bucket::Forever)
        } else {
            value.parse().map(Bucket::Date)
        }
    }
}

impl TryFrom<String> for Bucket {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Bucket> for String {
    fn from(bucket: Bucket) -> Self {
        bucket.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> DateKey {
        raw.parse().unwrap()
    }

    #[test]
    fn date_key_round_trips_through_json_as_plain_string() {
        let json = serde_json::to_string(&key("2024-03-09")).unwrap();
        assert_eq!(json, "\"2024-03-09\"");

        let parsed: DateKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key("2024-03-09"));
    }

    #[test]
    fn rejects_date_keys_with_time_component() {
        assert!("2024-03-09T10:00:00Z".parse::<DateKey>().is_err());
        assert!("".parse::<DateKey>().is_err());
    }

    #[test]
    fn offset_crosses_month_boundaries() {
        assert_eq!(key("2024-02-28").offset_days(2), Some(key("2024-03-01")));
        assert_eq!(key("2024-01-01").offset_days(-1), Some(key("2023-12-31")));
    }

    #[test]
    fn offset_out_of_calendar_range_is_none() {
        assert_eq!(key("2024-01-01").offset_days(1_000_000_000), None);
        assert_eq!(key("2024-01-01").offset_days(i64::MIN), None);
    }

    #[test]
    fn forever_bucket_uses_sentinel() {
        assert_eq!(Bucket::Forever.to_string(), "forever");
        assert_eq!("forever".parse::<Bucket>().unwrap(), Bucket::Forever);
        assert_eq!(
            "2024-05-01".parse::<Bucket>().unwrap(),
            Bucket::Date(key("2024-05-01"))
        );
    }
}
