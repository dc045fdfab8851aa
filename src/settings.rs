use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub collector: Collector,
    pub store: Store,
    pub scoring: Scoring,
    pub fallback: Fallback,
    pub export: Export,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collector {
    pub search_url: String,
    pub page_size: usize,
    pub default_max: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoring {
    pub scorer: String,
    pub positive_threshold: f32,
    pub negative_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fallback {
    pub sample_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Export {
    pub default_path: String,
    pub default_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            collector: Collector {
                search_url: "https://public.api.example.com/search/tweets".to_string(),
                page_size: 100,
                default_max: 500,
                request_timeout_secs: 30,
            },
            store: Store {
                max_connections: 5,
                connect_timeout_ms: 5000,
                busy_timeout_ms: 2000,
            },
            scoring: Scoring {
                scorer: "lexicon".to_string(),
                positive_threshold: 0.05,
                negative_threshold: -0.05,
            },
            fallback: Fallback {
                sample_path: "sample_data/labeled_tweets.csv".to_string(),
            },
            export: Export {
                default_path: "tweets_sentiment.csv".to_string(),
                default_limit: 500,
            },
        }
    }
}

impl Settings {
    pub fn load() -> &'static Settings {
        SETTINGS.get_or_init(Self::load_from_files)
    }

    fn load_from_files() -> Settings {
        let default_path = Path::new("settings.default.ron");
        let override_path = Path::new("settings.ron");

        let mut settings = if default_path.exists() {
            fs::read_to_string(default_path)
                .ok()
                .and_then(|content| ron::from_str(&content).ok())
                .unwrap_or_default()
        } else {
            Settings::default()
        };

        if override_path.exists() {
            if let Ok(content) = fs::read_to_string(override_path) {
                if let Ok(overrides) = ron::from_str::<Settings>(&content) {
                    settings = overrides;
                }
            }
        }

        settings
    }
}

pub fn settings() -> &'static Settings {
    Settings::load()
}
