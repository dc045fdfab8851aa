use crate::schema::tweets;
use crate::sentiment::Sentiment;
use crate::settings::settings;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use thiserror::Error;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("duplicate primary key: {0}")]
    DuplicateKey(String),
    #[error("query failed: {0}")]
    Query(#[source] DieselError),
    #[error("schema migration failed: {0}")]
    Migration(String),
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::DuplicateKey(info.message().to_string())
            }
            other => StoreError::Query(other),
        }
    }
}

impl From<PoolError> for StoreError {
    fn from(err: PoolError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

pub fn establish_pool(database_url: &str) -> Result<DbPool, StoreError> {
    let s = settings();
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(s.store.max_connections)
        .connection_timeout(Duration::from_millis(s.store.connect_timeout_ms))
        .build(manager)
        .map_err(StoreError::from)
}

pub fn configure_connection(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    let s = settings();
    conn.batch_execute(&format!("PRAGMA busy_timeout = {};", s.store.busy_timeout_ms))
        .map_err(StoreError::from)?;
    conn.batch_execute("PRAGMA journal_mode = WAL;")?;
    conn.batch_execute("PRAGMA synchronous = NORMAL;")?;
    Ok(())
}

/// Creates the `tweets` table if absent. Safe to call on every startup.
pub fn ensure_schema(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|e| StoreError::Migration(e.to_string()))
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = tweets)]
pub struct Tweet {
    pub id: i64,
    pub username: Option<String>,
    pub created_at: Option<i64>,
    pub text: String,
    pub lang: Option<String>,
    pub retweet_count: Option<i32>,
    pub reply_count: Option<i32>,
    pub like_count: Option<i32>,
    pub quote_count: Option<i32>,
    pub scraped_at: Option<i64>,
    pub sentiment: Option<String>,
    pub sentiment_score: Option<f32>,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = tweets)]
pub struct NewTweet {
    pub id: i64,
    pub username: Option<String>,
    pub created_at: Option<i64>,
    pub text: String,
    pub lang: Option<String>,
    pub retweet_count: Option<i32>,
    pub reply_count: Option<i32>,
    pub like_count: Option<i32>,
    pub quote_count: Option<i32>,
    pub scraped_at: Option<i64>,
    pub sentiment: Option<String>,
    pub sentiment_score: Option<f32>,
}

impl From<Tweet> for NewTweet {
    fn from(t: Tweet) -> Self {
        NewTweet {
            id: t.id,
            username: t.username,
            created_at: t.created_at,
            text: t.text,
            lang: t.lang,
            retweet_count: t.retweet_count,
            reply_count: t.reply_count,
            like_count: t.like_count,
            quote_count: t.quote_count,
            scraped_at: t.scraped_at,
            sentiment: t.sentiment,
            sentiment_score: t.sentiment_score,
        }
    }
}

/// A scoring write-back row. Label and score travel together so the two
/// sentiment columns are never set apart.
#[derive(Debug, Clone)]
pub struct SentimentUpdate {
    pub id: i64,
    pub label: Sentiment,
    pub score: f32,
}

/// Appends rows. A primary-key clash is the caller's policy error and
/// surfaces as [`StoreError::DuplicateKey`]; the statement is atomic, so the
/// existing rows are left untouched.
pub fn insert_append(conn: &mut SqliteConnection, rows: &[NewTweet]) -> Result<usize, StoreError> {
    if rows.is_empty() {
        return Ok(0);
    }
    diesel::insert_into(tweets::table)
        .values(rows)
        .execute(conn)
        .map_err(StoreError::from)
}

/// Overwrites the sentiment columns of matching rows, nothing else. Rows
/// whose id has no match update nothing and are dropped silently; the call
/// is idempotent. Returns the number of rows actually updated.
pub fn upsert_sentiment(
    conn: &mut SqliteConnection,
    updates: &[SentimentUpdate],
) -> Result<usize, StoreError> {
    use crate::schema::tweets::dsl::*;

    conn.transaction(|conn| -> QueryResult<usize> {
        let mut applied = 0;
        for update in updates {
            applied += diesel::update(tweets.filter(id.eq(update.id)))
                .set((
                    sentiment.eq(update.label.to_string()),
                    sentiment_score.eq(update.score),
                ))
                .execute(conn)?;
        }
        Ok(applied)
    })
    .map_err(StoreError::from)
}

/// Up to `limit` rows, newest `created_at` first, `id` descending on ties.
pub fn query_recent(conn: &mut SqliteConnection, limit: usize) -> Result<Vec<Tweet>, StoreError> {
    use crate::schema::tweets::dsl::*;

    tweets
        .order((created_at.desc(), id.desc()))
        .limit(limit as i64)
        .select(Tweet::as_select())
        .load(conn)
        .map_err(StoreError::from)
}

/// Rows not yet scored, oldest id first so reruns make forward progress.
pub fn load_unscored(
    conn: &mut SqliteConnection,
    limit: Option<usize>,
) -> Result<Vec<Tweet>, StoreError> {
    use crate::schema::tweets::dsl::*;

    let mut query = tweets
        .filter(sentiment.is_null())
        .order(id.asc())
        .select(Tweet::as_select())
        .into_boxed();
    if let Some(limit) = limit {
        query = query.limit(limit as i64);
    }
    query.load(conn).map_err(StoreError::from)
}

pub fn count_tweets(conn: &mut SqliteConnection) -> Result<i64, StoreError> {
    use crate::schema::tweets::dsl::*;

    tweets.count().get_result(conn).map_err(StoreError::from)
}

pub fn sentiment_counts(
    conn: &mut SqliteConnection,
) -> Result<Vec<(Option<String>, i64)>, StoreError> {
    use crate::schema::tweets::dsl::*;
    use diesel::dsl::count_star;

    tweets
        .group_by(sentiment)
        .select((sentiment, count_star()))
        .load(conn)
        .map_err(StoreError::from)
}
