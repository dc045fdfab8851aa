//! Maps arbitrary keyed rows (scraped or CSV-loaded) onto the canonical
//! tweet schema. Pure and idempotent: normalizing its own output changes
//! nothing.

use crate::db::NewTweet;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// The fixed column set every store row and export carries, in order.
pub const CANONICAL_COLUMNS: [&str; 12] = [
    "id",
    "username",
    "created_at",
    "text",
    "lang",
    "retweet_count",
    "reply_count",
    "like_count",
    "quote_count",
    "scraped_at",
    "sentiment",
    "sentiment_score",
];

/// One input row keyed by column name. Empty values count as absent.
pub type RawRow = BTreeMap<String, String>;

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("row {row}: required column `text` is missing or empty")]
    MissingText { row: usize },
    #[error("row {row}: id `{value}` is not an integer")]
    InvalidId { row: usize, value: String },
}

fn get<'a>(row: &'a RawRow, key: &str) -> Option<&'a str> {
    row.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// `label` stands in for `sentiment` in labeled sample files.
fn sentiment_value<'a>(row: &'a RawRow) -> Option<&'a str> {
    get(row, "sentiment").or_else(|| get(row, "label"))
}

pub fn parse_timestamp(value: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt).timestamp());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0)?).timestamp());
    }
    value.parse::<i64>().ok()
}

pub fn format_timestamp(epoch: i64) -> String {
    match Utc.timestamp_opt(epoch, 0) {
        chrono::LocalResult::Single(dt) => dt.to_rfc3339(),
        _ => epoch.to_string(),
    }
}

fn parse_count(row: &RawRow, key: &str) -> Option<i32> {
    get(row, key).and_then(|v| v.parse().ok())
}

/// Produces canonical rows from arbitrary input. Columns outside the
/// canonical set are dropped; absent canonical columns become null, except
/// that ids are synthesized as a 1-based sequence when the id column is
/// entirely absent and timestamps default to now.
pub fn normalize(rows: &[RawRow]) -> Result<Vec<NewTweet>, SchemaError> {
    let now = Utc::now().timestamp();
    let ids_present = rows.iter().any(|row| get(row, "id").is_some());

    let mut out = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let text = get(row, "text")
            .ok_or(SchemaError::MissingText { row: idx })?
            .to_string();

        let id = if ids_present {
            let value = get(row, "id").unwrap_or("");
            value.parse::<i64>().map_err(|_| SchemaError::InvalidId {
                row: idx,
                value: value.to_string(),
            })?
        } else {
            idx as i64 + 1
        };

        let created_at = get(row, "created_at")
            .and_then(parse_timestamp)
            .unwrap_or(now);
        let scraped_at = get(row, "scraped_at")
            .and_then(parse_timestamp)
            .unwrap_or(now);

        out.push(NewTweet {
            id,
            username: get(row, "username").map(str::to_string),
            created_at: Some(created_at),
            text,
            lang: get(row, "lang").map(str::to_string),
            retweet_count: parse_count(row, "retweet_count"),
            reply_count: parse_count(row, "reply_count"),
            like_count: parse_count(row, "like_count"),
            quote_count: parse_count(row, "quote_count"),
            scraped_at: Some(scraped_at),
            sentiment: sentiment_value(row).map(str::to_string),
            sentiment_score: get(row, "sentiment_score").and_then(|v| v.parse().ok()),
        });
    }

    Ok(out)
}

/// Inverse of [`normalize`] for canonical rows; used for export and for the
/// idempotence property.
pub fn to_raw_row(tweet: &NewTweet) -> RawRow {
    let mut row = RawRow::new();
    let mut put = |key: &str, value: Option<String>| {
        row.insert(key.to_string(), value.unwrap_or_default());
    };

    put("id", Some(tweet.id.to_string()));
    put("username", tweet.username.clone());
    put("created_at", tweet.created_at.map(format_timestamp));
    put("text", Some(tweet.text.clone()));
    put("lang", tweet.lang.clone());
    put("retweet_count", tweet.retweet_count.map(|v| v.to_string()));
    put("reply_count", tweet.reply_count.map(|v| v.to_string()));
    put("like_count", tweet.like_count.map(|v| v.to_string()));
    put("quote_count", tweet.quote_count.map(|v| v.to_string()));
    put("scraped_at", tweet.scraped_at.map(format_timestamp));
    put("sentiment", tweet.sentiment.clone());
    put(
        "sentiment_score",
        tweet.sentiment_score.map(|v| v.to_string()),
    );
    row
}

/// Canonical-order values for one row, for CSV output.
pub fn csv_values(tweet: &NewTweet) -> Vec<String> {
    let raw = to_raw_row(tweet);
    CANONICAL_COLUMNS
        .iter()
        .map(|col| raw.get(*col).cloned().unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_label_renamed_and_id_synthesized() {
        let rows = vec![row(&[("text", "hi"), ("label", "pos")])];
        let out = normalize(&rows).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 1);
        assert_eq!(out[0].sentiment.as_deref(), Some("pos"));
        assert!(out[0].created_at.is_some());
        assert!(out[0].scraped_at.is_some());
        assert!(out[0].username.is_none());
    }

    #[test]
    fn test_sentiment_wins_over_label() {
        let rows = vec![row(&[
            ("text", "hi"),
            ("label", "pos"),
            ("sentiment", "negative"),
        ])];
        let out = normalize(&rows).unwrap();
        assert_eq!(out[0].sentiment.as_deref(), Some("negative"));
    }

    #[test]
    fn test_extra_columns_dropped() {
        let rows = vec![row(&[
            ("text", "hello"),
            ("id", "42"),
            ("follower_count", "9000"),
            ("source_app", "web"),
        ])];
        let out = normalize(&rows).unwrap();
        let raw = to_raw_row(&out[0]);
        assert_eq!(raw.len(), CANONICAL_COLUMNS.len());
        assert!(!raw.contains_key("follower_count"));
    }

    #[test]
    fn test_missing_text_is_fatal() {
        let rows = vec![
            row(&[("text", "ok"), ("id", "1")]),
            row(&[("id", "2"), ("username", "bob")]),
        ];
        let err = normalize(&rows).unwrap_err();
        assert_eq!(err, SchemaError::MissingText { row: 1 });
    }

    #[test]
    fn test_bad_id_is_fatal() {
        let rows = vec![row(&[("text", "ok"), ("id", "abc")])];
        let err = normalize(&rows).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidId { row: 0, .. }));
    }

    #[test]
    fn test_synthetic_ids_are_sequential() {
        let rows = vec![
            row(&[("text", "one")]),
            row(&[("text", "two")]),
            row(&[("text", "three")]),
        ];
        let out = normalize(&rows).unwrap();
        let ids: Vec<i64> = out.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(
            parse_timestamp("1970-01-01T00:01:00+00:00"),
            Some(60)
        );
        assert_eq!(parse_timestamp("1970-01-01 00:01:00"), Some(60));
        assert_eq!(parse_timestamp("1970-01-02"), Some(86400));
        assert_eq!(parse_timestamp("3600"), Some(3600));
        assert_eq!(parse_timestamp("soon"), None);
    }

    #[test]
    fn test_unparseable_created_at_defaults_to_now() {
        let before = Utc::now().timestamp();
        let rows = vec![row(&[("text", "hi"), ("created_at", "whenever")])];
        let out = normalize(&rows).unwrap();
        assert!(out[0].created_at.unwrap() >= before);
    }

    #[test]
    fn test_idempotent() {
        let rows = vec![
            row(&[
                ("text", "first post"),
                ("id", "10"),
                ("username", "alice"),
                ("created_at", "2024-03-01 12:00:00"),
                ("like_count", "5"),
                ("label", "positive"),
                ("sentiment_score", "0.5"),
            ]),
            row(&[("text", "second, with commas"), ("id", "11")]),
        ];
        let once = normalize(&rows).unwrap();
        let raw_again: Vec<RawRow> = once.iter().map(to_raw_row).collect();
        let twice = normalize(&raw_again).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_counts_parsed_or_null() {
        let rows = vec![row(&[
            ("text", "hi"),
            ("id", "1"),
            ("retweet_count", "7"),
            ("reply_count", "many"),
        ])];
        let out = normalize(&rows).unwrap();
        assert_eq!(out[0].retweet_count, Some(7));
        assert_eq!(out[0].reply_count, None);
    }
}
