use anyhow::{Context, Result};
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::env;
use std::path::Path;
use std::process;
use tracing::subscriber::set_global_default;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tweet_pulse::collector::Collector;
use tweet_pulse::db::{configure_connection, ensure_schema, establish_pool, DbPool, StoreError};
use tweet_pulse::pipeline;
use tweet_pulse::sentiment::scorer_from_settings;
use tweet_pulse::settings::settings;
use tweet_pulse::utils::logs::{
    log_collect_start, log_export_done, log_fallback, log_schema_ready, log_startup, log_stats,
    log_store_error,
};

type PooledConn = PooledConnection<ConnectionManager<SqliteConnection>>;

fn print_usage() {
    eprintln!("Usage: tweet-pulse <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  collect <query> [--max N]    fetch posts and insert them (default max 500)");
    eprintln!("  load <path>                  load a delimited sample file into the store");
    eprintln!("  score [--limit N]            score unscored rows and write sentiment back");
    eprintln!("  export [path] [--limit N]    export recent rows as CSV");
    eprintln!("  stats                        row count and sentiment distribution");
}

fn flag_value(args: &[String], name: &str) -> Option<usize> {
    let idx = args.iter().position(|a| a == name)?;
    args.get(idx + 1).and_then(|v| v.parse().ok())
}

fn positional(args: &[String]) -> Vec<&String> {
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if arg.starts_with("--") {
            skip = true;
            continue;
        }
        out.push(arg);
    }
    out
}

fn open_store(database_url: &str) -> Result<(DbPool, PooledConn), StoreError> {
    let pool = establish_pool(database_url)?;
    let mut conn = pool.get().map_err(StoreError::from)?;
    configure_connection(&mut conn)?;
    ensure_schema(&mut conn)?;
    log_schema_ready();
    Ok((pool, conn))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("tweet_pulse=info".parse()?))
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        );
    set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        process::exit(1);
    };
    let rest = &args[1..];

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "tweets.db".to_string());
    log_startup(&database_url);

    match command.as_str() {
        "collect" => {
            let positionals = positional(rest);
            let Some(query) = positionals.first() else {
                print_usage();
                process::exit(1);
            };
            let max = flag_value(rest, "--max").unwrap_or(settings().collector.default_max);
            log_collect_start(query, max);

            let (_pool, mut conn) = open_store(&database_url).map_err(|e| {
                log_store_error("cannot open store:", &e);
                anyhow::anyhow!(e)
            })?;
            let collector = Collector::new().context("building search client")?;
            pipeline::run_collect(&mut conn, &collector, query, max)
                .await
                .context("collection failed")?;
        }
        "load" => {
            let positionals = positional(rest);
            let Some(path) = positionals.first() else {
                print_usage();
                process::exit(1);
            };
            let (_pool, mut conn) = open_store(&database_url).map_err(|e| {
                log_store_error("cannot open store:", &e);
                anyhow::anyhow!(e)
            })?;
            pipeline::run_load(&mut conn, Path::new(path)).context("load failed")?;
        }
        "score" => {
            let limit = flag_value(rest, "--limit");
            let (_pool, mut conn) = open_store(&database_url).map_err(|e| {
                log_store_error("cannot open store:", &e);
                anyhow::anyhow!(e)
            })?;
            let scorer =
                scorer_from_settings().map_err(|e| anyhow::anyhow!("unknown scorer: {e}"))?;
            pipeline::run_score(&mut conn, scorer.as_ref(), limit).context("scoring failed")?;
        }
        "export" => {
            let s = settings();
            let positionals = positional(rest);
            let path = positionals
                .first()
                .map(|p| p.to_string())
                .unwrap_or_else(|| s.export.default_path.clone());
            let limit = flag_value(rest, "--limit").unwrap_or(s.export.default_limit);

            match open_store(&database_url) {
                Ok((_pool, mut conn)) => {
                    let count = pipeline::run_export(&mut conn, Path::new(&path), limit)
                        .context("export failed")?;
                    log_export_done(&path, count);
                }
                Err(e) => {
                    // degraded read-only mode: the sample file stands in for
                    // the store, and the real cause is shown first
                    log_store_error("cannot open store:", &e);
                    log_fallback(&s.fallback.sample_path);
                    let count = pipeline::run_export_fallback(
                        Path::new(&s.fallback.sample_path),
                        Path::new(&path),
                        limit,
                    )
                    .context("fallback export failed")?;
                    log_export_done(&path, count);
                }
            }
        }
        "stats" => {
            let (_pool, mut conn) = open_store(&database_url).map_err(|e| {
                log_store_error("cannot open store:", &e);
                anyhow::anyhow!(e)
            })?;
            let stats = pipeline::run_stats(&mut conn).context("stats failed")?;
            log_stats(stats.total, &stats.by_sentiment);
        }
        _ => {
            print_usage();
            process::exit(1);
        }
    }

    Ok(())
}
