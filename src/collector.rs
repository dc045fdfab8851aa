//! Bounded wrapper over the search endpoint that feeds the pipeline.

use crate::normalizer::RawRow;
use crate::settings::settings;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("search API returned {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed search response: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub posts: Vec<CollectedPost>,
    pub cursor: Option<String>,
}

/// One raw post from the source. `id` and `text` are guaranteed; everything
/// else is best-effort.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectedPost {
    pub id: i64,
    pub username: Option<String>,
    pub created_at: Option<String>,
    pub text: String,
    pub lang: Option<String>,
    pub retweet_count: Option<i64>,
    pub reply_count: Option<i64>,
    pub like_count: Option<i64>,
    pub quote_count: Option<i64>,
}

impl CollectedPost {
    /// Keyed row for the normalizer, which owns defaulting and the canonical
    /// column set.
    pub fn into_raw_row(self) -> RawRow {
        let mut row = RawRow::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                row.insert(key.to_string(), value);
            }
        };

        put("id", Some(self.id.to_string()));
        put("username", self.username);
        put("created_at", self.created_at);
        put("text", Some(self.text));
        put("lang", self.lang);
        put("retweet_count", self.retweet_count.map(|v| v.to_string()));
        put("reply_count", self.reply_count.map(|v| v.to_string()));
        put("like_count", self.like_count.map(|v| v.to_string()));
        put("quote_count", self.quote_count.map(|v| v.to_string()));
        row
    }
}

pub fn parse_response(body: &str) -> Result<SearchResponse, CollectError> {
    Ok(serde_json::from_str(body)?)
}

pub struct Collector {
    client: reqwest::Client,
    search_url: String,
    page_size: usize,
}

impl Collector {
    pub fn new() -> Result<Self, CollectError> {
        let s = settings();
        Self::with_endpoint(&s.collector.search_url, s.collector.page_size)
    }

    pub fn with_endpoint(search_url: &str, page_size: usize) -> Result<Self, CollectError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                settings().collector.request_timeout_secs,
            ))
            .build()?;
        Ok(Self {
            client,
            search_url: search_url.to_string(),
            page_size: page_size.max(1),
        })
    }

    /// Fetches at most `max` posts for `query`, paging until the source is
    /// exhausted or the bound is hit. Zero results is valid output.
    pub async fn search(&self, query: &str, max: usize) -> Result<Vec<CollectedPost>, CollectError> {
        let mut collected: Vec<CollectedPost> = Vec::new();
        let mut cursor: Option<String> = None;

        while collected.len() < max {
            let limit = self.page_size.min(max - collected.len());
            let page = self.fetch_page(query, limit, cursor.as_deref()).await?;
            let fetched = page.posts.len();
            collected.extend(page.posts);

            cursor = page.cursor;
            if fetched == 0 || cursor.is_none() {
                break;
            }
        }

        collected.truncate(max);
        Ok(collected)
    }

    async fn fetch_page(
        &self,
        query: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<SearchResponse, CollectError> {
        let mut url = format!(
            "{}?q={}&limit={}",
            self.search_url,
            urlencoding::encode(query),
            limit
        );
        if let Some(cursor) = cursor {
            url.push_str(&format!("&cursor={}", urlencoding::encode(cursor)));
        }

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CollectError::Status(response.status()));
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_response() {
        let body = r#"{
            "posts": [{
                "id": 1234567890,
                "username": "alice",
                "created_at": "2024-03-01T12:00:00+00:00",
                "text": "loving this weather",
                "lang": "en",
                "retweet_count": 3,
                "reply_count": 1,
                "like_count": 10,
                "quote_count": 0
            }],
            "cursor": "next-page"
        }"#;
        let response = parse_response(body).unwrap();
        assert_eq!(response.posts.len(), 1);
        assert_eq!(response.posts[0].id, 1234567890);
        assert_eq!(response.posts[0].username.as_deref(), Some("alice"));
        assert_eq!(response.cursor.as_deref(), Some("next-page"));
    }

    #[test]
    fn test_parse_minimal_post() {
        let body = r#"{"posts": [{"id": 7, "text": "hi"}], "cursor": null}"#;
        let response = parse_response(body).unwrap();
        assert_eq!(response.posts[0].id, 7);
        assert!(response.posts[0].lang.is_none());
        assert!(response.cursor.is_none());
    }

    #[test]
    fn test_parse_empty_is_valid() {
        let response = parse_response(r#"{"posts": [], "cursor": null}"#).unwrap();
        assert!(response.posts.is_empty());
    }

    #[test]
    fn test_parse_missing_text_is_malformed() {
        let body = r#"{"posts": [{"id": 7}], "cursor": null}"#;
        assert!(matches!(
            parse_response(body),
            Err(CollectError::Malformed(_))
        ));
    }

    #[test]
    fn test_into_raw_row_skips_absent_fields() {
        let post = CollectedPost {
            id: 42,
            username: None,
            created_at: Some("2024-03-01T12:00:00+00:00".to_string()),
            text: "hello".to_string(),
            lang: None,
            retweet_count: Some(2),
            reply_count: None,
            like_count: None,
            quote_count: None,
        };
        let row = post.into_raw_row();
        assert_eq!(row.get("id").map(String::as_str), Some("42"));
        assert_eq!(row.get("text").map(String::as_str), Some("hello"));
        assert_eq!(row.get("retweet_count").map(String::as_str), Some("2"));
        assert!(!row.contains_key("username"));
        assert!(!row.contains_key("lang"));
    }
}
