use crate::sentiment::SentimentScore;
use console::Style;

fn dim() -> Style {
    Style::new().dim()
}

fn cyan() -> Style {
    Style::new().cyan()
}

fn green() -> Style {
    Style::new().green()
}

fn red() -> Style {
    Style::new().red()
}

fn yellow() -> Style {
    Style::new().yellow()
}

fn bold() -> Style {
    Style::new().bold()
}

fn etl_prefix() -> String {
    cyan().apply_to("[ETL]").to_string()
}

fn db_prefix() -> String {
    Style::new().blue().apply_to("[DB]").to_string()
}

fn score_prefix() -> String {
    Style::new().magenta().apply_to("[SCORE]").to_string()
}

pub fn log_startup(database_url: &str) {
    println!(
        "{} using store at {}",
        db_prefix(),
        cyan().apply_to(database_url)
    );
}

pub fn log_schema_ready() {
    println!("{} schema ready.", db_prefix());
}

pub fn log_collect_start(query: &str, max: usize) {
    println!(
        "{} collecting up to {} posts for {}",
        etl_prefix(),
        bold().apply_to(max),
        cyan().apply_to(query)
    );
}

pub fn log_collect_fetched(query: &str, fetched: usize) {
    println!(
        "{} fetched {} {} posts",
        etl_prefix(),
        bold().apply_to(fetched),
        cyan().apply_to(query)
    );
}

pub fn log_inserted(count: usize) {
    println!("Inserted {} tweets", bold().apply_to(count));
}

pub fn log_scored(count: usize) {
    println!(
        "{} wrote sentiment for {} tweets",
        score_prefix(),
        bold().apply_to(count)
    );
}

pub fn log_export_done(path: &str, count: usize) {
    println!(
        "{} exported {} rows to {}",
        etl_prefix(),
        bold().apply_to(count),
        cyan().apply_to(path)
    );
}

/// Store failures always show the underlying cause, not just "failed".
pub fn log_store_error(context: &str, error: &dyn std::error::Error) {
    eprintln!(
        "{} {} {}",
        db_prefix(),
        red().apply_to(context),
        dim().apply_to(error.to_string())
    );
    let mut source = error.source();
    while let Some(cause) = source {
        eprintln!("{}   caused by: {}", db_prefix(), dim().apply_to(cause));
        source = cause.source();
    }
}

pub fn log_fallback(sample_path: &str) {
    println!(
        "{} continuing in read-only file mode ({})",
        yellow().apply_to("[FALLBACK]"),
        dim().apply_to(sample_path)
    );
}

pub fn log_stats(total: i64, by_sentiment: &[(Option<String>, i64)]) {
    println!("{} {} tweets stored", db_prefix(), bold().apply_to(total));
    for (label, count) in by_sentiment {
        let name = label.as_deref().unwrap_or("unscored");
        println!("  {} {}", dim().apply_to(name), bold().apply_to(count));
    }
}

pub fn log_score_result(text: &str, result: &SentimentScore) {
    let preview = if text.chars().count() > 60 {
        format!("{}...", text.chars().take(57).collect::<String>())
    } else {
        text.to_string()
    };
    println!("\"{}\"", dim().apply_to(preview.replace('\n', " ")));

    let label_style = match result.label {
        crate::sentiment::Sentiment::Positive => green(),
        crate::sentiment::Sentiment::Negative => red(),
        crate::sentiment::Sentiment::Neutral => dim(),
    };
    println!(
        "{} {} (compound {:+.3})",
        score_prefix(),
        label_style.apply_to(bold().apply_to(result.label.to_string())),
        result.score
    );
    for hit in &result.hits {
        println!(
            "  {} {:+.2}",
            dim().apply_to(&hit.word),
            hit.valence
        );
    }
}
