use std::env;
use std::process;
use tweet_pulse::sentiment::{scorer_from_settings, Scorer};
use tweet_pulse::utils::logs::log_score_result;

fn print_usage() {
    eprintln!("Usage: score-text <text...>");
    eprintln!();
    eprintln!("Scores the given text with the configured sentiment scorer and");
    eprintln!("prints the label, compound score and lexicon hits.");
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        process::exit(1);
    }

    let text = args.join(" ");

    let scorer: Box<dyn Scorer + Send + Sync> = match scorer_from_settings() {
        Ok(scorer) => scorer,
        Err(e) => {
            eprintln!("[ERROR] unknown scorer in settings: {e}");
            process::exit(1);
        }
    };

    let result = scorer.score(&text);
    log_score_result(&text, &result);
}
