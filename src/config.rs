use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CATEGORY: &str = "cs.CL";
pub const DEFAULT_MAX_RESULTS: u32 = 200;
pub const MAX_RESULTS_LIMIT: u32 = 2000;
pub const DEFAULT_OUTPUT_FILE: &str = "arxiv_clean.json";
pub const DEFAULT_FEED_URL: &str = "http://export.arxiv.org/api/query";
pub const DEFAULT_SETTLE_SECS: u64 = 2;

/// Run configuration. Defaults are the baked-in constants; environment
/// variables override them.
#[derive(Debug, Clone)]
pub struct Config {
    pub category: String,
    pub max_results: u32,
    pub output_file: PathBuf,
    pub feed_url: String,
    pub settle_delay: Duration,
    pub chrome_executable: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            feed_url: DEFAULT_FEED_URL.to_string(),
            settle_delay: Duration::from_secs(DEFAULT_SETTLE_SECS),
            chrome_executable: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let category = lookup("ARXIV_CATEGORY")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.category);

        let max_results = lookup("ARXIV_MAX_RESULTS")
            .map(|raw| parse_max_results(&raw))
            .unwrap_or(defaults.max_results);

        let output_file = lookup("ARXIV_OUTPUT_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.output_file);

        let feed_url = lookup("ARXIV_FEED_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.feed_url);

        let settle_delay = match lookup("ARXIV_SETTLE_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    tracing::warn!("Ignoring ARXIV_SETTLE_SECS={:?}: not a number of seconds", raw);
                    defaults.settle_delay
                }
            },
            None => defaults.settle_delay,
        };

        let chrome_executable = lookup("CHROME_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            category,
            max_results,
            output_file,
            feed_url,
            settle_delay,
            chrome_executable,
        }
    }
}

fn parse_max_results(raw: &str) -> u32 {
    match raw.trim().parse::<i64>() {
        Ok(n) if n < 1 => {
            tracing::warn!("ARXIV_MAX_RESULTS={} is below 1, using 1", n);
            1
        }
        Ok(n) if n > MAX_RESULTS_LIMIT as i64 => {
            tracing::warn!("ARXIV_MAX_RESULTS={} exceeds {}, clamping", n, MAX_RESULTS_LIMIT);
            MAX_RESULTS_LIMIT
        }
        Ok(n) => n as u32,
        Err(_) => {
            tracing::warn!("Ignoring ARXIV_MAX_RESULTS={:?}: not an integer", raw);
            DEFAULT_MAX_RESULTS
        }
    }
}
