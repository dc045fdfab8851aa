//! The two-phase ETL: ingest (collect or load, normalize, append) and
//! reconcile (score unscored rows, write sentiment back). The phases are
//! separate operations so either can be retried on its own.

use crate::collector::{CollectError, CollectedPost, Collector};
use crate::db::{self, SentimentUpdate, StoreError};
use crate::normalizer::{self, RawRow, SchemaError, CANONICAL_COLUMNS};
use crate::sentiment::Scorer;
use crate::utils::csv;
use crate::utils::logs::{log_collect_fetched, log_inserted, log_scored};
use diesel::sqlite::SqliteConnection;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to access {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn file_err(path: &Path) -> impl FnOnce(std::io::Error) -> PipelineError + '_ {
    move |source| PipelineError::File {
        path: path.display().to_string(),
        source,
    }
}

/// Normalizes keyed rows and appends them. Returns the count inserted.
pub fn ingest_rows(conn: &mut SqliteConnection, rows: &[RawRow]) -> Result<usize, PipelineError> {
    let records = normalizer::normalize(rows)?;
    Ok(db::insert_append(conn, &records)?)
}

/// Ingest phase for scraped posts.
pub fn ingest_posts(
    conn: &mut SqliteConnection,
    posts: Vec<CollectedPost>,
) -> Result<usize, PipelineError> {
    let rows: Vec<RawRow> = posts.into_iter().map(CollectedPost::into_raw_row).collect();
    ingest_rows(conn, &rows)
}

/// Collect → normalize → append. `max` bounds the fetch, not the insert.
pub async fn run_collect(
    conn: &mut SqliteConnection,
    collector: &Collector,
    query: &str,
    max: usize,
) -> Result<usize, PipelineError> {
    let posts = collector.search(query, max).await?;
    log_collect_fetched(query, posts.len());
    let inserted = ingest_posts(conn, posts)?;
    log_inserted(inserted);
    Ok(inserted)
}

fn read_raw_rows(path: &Path) -> Result<Vec<RawRow>, PipelineError> {
    let (headers, records) = csv::read_file(path).map_err(file_err(path))?;
    let rows = records
        .into_iter()
        .map(|record| {
            headers
                .iter()
                .cloned()
                .zip(record)
                .collect::<RawRow>()
        })
        .collect();
    Ok(rows)
}

/// File-fallback ingest: a delimited file with at least `text` and
/// (`label` | `sentiment`) columns.
pub fn run_load(conn: &mut SqliteConnection, path: &Path) -> Result<usize, PipelineError> {
    let rows = read_raw_rows(path)?;
    let inserted = ingest_rows(conn, &rows)?;
    log_inserted(inserted);
    Ok(inserted)
}

/// Reconcile phase: score rows without sentiment and write both sentiment
/// columns back. Rerunning is a no-op once everything is scored.
pub fn run_score(
    conn: &mut SqliteConnection,
    scorer: &dyn Scorer,
    limit: Option<usize>,
) -> Result<usize, PipelineError> {
    let pending = db::load_unscored(conn, limit)?;
    if pending.is_empty() {
        return Ok(0);
    }

    let updates: Vec<SentimentUpdate> = pending
        .iter()
        .map(|tweet| {
            let scored = scorer.score(&tweet.text);
            SentimentUpdate {
                id: tweet.id,
                label: scored.label,
                score: scored.score,
            }
        })
        .collect();

    let applied = db::upsert_sentiment(conn, &updates)?;
    log_scored(applied);
    Ok(applied)
}

/// Writes the most recent rows as canonical CSV. Returns the row count.
pub fn run_export(
    conn: &mut SqliteConnection,
    path: &Path,
    limit: usize,
) -> Result<usize, PipelineError> {
    let tweets = db::query_recent(conn, limit)?;
    let rows: Vec<Vec<String>> = tweets
        .into_iter()
        .map(|t| normalizer::csv_values(&t.into()))
        .collect();
    csv::write_file(path, &CANONICAL_COLUMNS, &rows).map_err(file_err(path))?;
    Ok(rows.len())
}

/// Degraded-mode export: normalize the sample file and write it out without
/// touching the store.
pub fn run_export_fallback(
    sample_path: &Path,
    out_path: &Path,
    limit: usize,
) -> Result<usize, PipelineError> {
    let raw = read_raw_rows(sample_path)?;
    let mut records = normalizer::normalize(&raw)?;
    records.truncate(limit);
    let rows: Vec<Vec<String>> = records.iter().map(normalizer::csv_values).collect();
    csv::write_file(out_path, &CANONICAL_COLUMNS, &rows).map_err(file_err(out_path))?;
    Ok(rows.len())
}

pub struct StoreStats {
    pub total: i64,
    pub by_sentiment: Vec<(Option<String>, i64)>,
}

pub fn run_stats(conn: &mut SqliteConnection) -> Result<StoreStats, PipelineError> {
    Ok(StoreStats {
        total: db::count_tweets(conn)?,
        by_sentiment: db::sentiment_counts(conn)?,
    })
}
