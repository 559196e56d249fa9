use chrono::{Datelike, Days, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use timeline_core::{Commit, Granularity};

/// Commits sharing a day or week key; one timeline column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    /// Calendar day, or the Sunday starting the week
    pub key: NaiveDate,
    /// In the order they appear in the loaded sequence
    pub commits: Vec<Commit>,
}

impl Bucket {
    /// ISO date form of the key
    pub fn key_string(&self) -> String {
        self.key.format("%Y-%m-%d").to_string()
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// UTC calendar date of a millisecond timestamp
pub fn utc_date(timestamp_ms: i64) -> NaiveDate {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.date_naive())
        .unwrap_or(NaiveDate::MIN)
}

/// Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

pub fn bucket_key(timestamp_ms: i64, granularity: Granularity) -> NaiveDate {
    let date = utc_date(timestamp_ms);
    match granularity {
        Granularity::Day => date,
        Granularity::Week => week_start(date),
    }
}

/// Group commits into buckets ordered oldest key first
pub fn bucket(commits: &[Commit], granularity: Granularity) -> Vec<Bucket> {
    let mut grouped: BTreeMap<NaiveDate, Vec<Commit>> = BTreeMap::new();

    for commit in commits {
        grouped
            .entry(bucket_key(commit.timestamp_ms, granularity))
            .or_default()
            .push(commit.clone());
    }

    grouped
        .into_iter()
        .map(|(key, commits)| Bucket { key, commits })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ms(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap().timestamp_millis()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn shas(bucket: &Bucket) -> Vec<&str> {
        bucket.commits.iter().map(|c| c.sha.as_str()).collect()
    }

    #[test]
    fn test_same_day_shares_bucket() {
        let commits = vec![
            Commit::new("a1", "first", "Alice", ms(2024, 3, 4, 9, 0)),
            Commit::new("b2", "second", "Bob", ms(2024, 3, 4, 23, 59)),
            Commit::new("c3", "third", "Alice", ms(2024, 3, 5, 0, 1)),
        ];

        let buckets = bucket(&commits, Granularity::Day);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, date(2024, 3, 4));
        assert_eq!(shas(&buckets[0]), vec!["a1", "b2"]);
        assert_eq!(buckets[1].key_string(), "2024-03-05");
        assert_eq!(shas(&buckets[1]), vec!["c3"]);
    }

    #[test]
    fn test_keeps_sequence_order_within_bucket() {
        // newest-first input stays newest-first inside the day
        let commits = vec![
            Commit::new("late", "late", "Alice", ms(2024, 3, 4, 18, 0)),
            Commit::new("early", "early", "Alice", ms(2024, 3, 4, 8, 0)),
            Commit::new("prev", "prev", "Alice", ms(2024, 3, 3, 8, 0)),
        ];

        let buckets = bucket(&commits, Granularity::Day);
        assert_eq!(buckets[0].key, date(2024, 3, 3));
        assert_eq!(shas(&buckets[1]), vec!["late", "early"]);
    }

    #[test]
    fn test_week_starts_on_sunday() {
        // 2024-03-03 is a Sunday
        assert_eq!(week_start(date(2024, 3, 3)), date(2024, 3, 3));
        assert_eq!(week_start(date(2024, 3, 9)), date(2024, 3, 3));
        assert_eq!(week_start(date(2024, 3, 10)), date(2024, 3, 10));
        // across a year boundary
        assert_eq!(week_start(date(2025, 1, 1)), date(2024, 12, 29));

        let commits = vec![
            Commit::new("sat", "sat", "Alice", ms(2024, 3, 9, 23, 0)),
            Commit::new("sun", "sun", "Alice", ms(2024, 3, 10, 1, 0)),
            Commit::new("mon", "mon", "Alice", ms(2024, 3, 4, 12, 0)),
        ];
        let buckets = bucket(&commits, Granularity::Week);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, date(2024, 3, 3));
        assert_eq!(shas(&buckets[0]), vec!["sat", "mon"]);
        assert_eq!(shas(&buckets[1]), vec!["sun"]);
    }

    #[test]
    fn test_bucketing_is_idempotent() {
        let commits: Vec<Commit> = (0..40)
            .map(|i| Commit::new(format!("c{}", i), "m", "A", ms(2024, 1, 1, 0, 0) + i * 7_200_000))
            .collect();

        let first = bucket(&commits, Granularity::Day);
        let second = bucket(&commits, Granularity::Day);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_and_out_of_range_input() {
        assert!(bucket(&[], Granularity::Week).is_empty());

        let buckets = bucket(&[Commit::new("x", "m", "A", i64::MAX)], Granularity::Day);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].key, NaiveDate::MIN);
    }

    #[test]
    fn test_pre_epoch_timestamps() {
        assert_eq!(utc_date(-1), date(1969, 12, 31));
    }
}
