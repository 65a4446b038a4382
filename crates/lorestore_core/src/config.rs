//! Store configuration.

use lorestore_storage::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Environment variable overriding the flush delay, in seconds.
pub const FLUSH_DELAY_ENV: &str = "STORE_FLUSH_DELAY_SEC";

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the documents.
    pub data_dir: PathBuf,

    /// Document file name inside `data_dir`.
    pub data_file: String,

    /// Template file name inside `data_dir`.
    pub templates_file: String,

    /// Quiet interval after the last write before flushing.
    pub flush_delay: Duration,

    /// Maximum number of undo entries.
    pub history_capacity: usize,

    /// Retry policy for the atomic rename.
    pub retry: RetryPolicy,

    /// Whether to hold an advisory `LOCK` file in `data_dir`.
    pub lock_dir: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            data_file: "data.json".to_string(),
            templates_file: "templates.json".to_string(),
            flush_delay: Duration::from_millis(800),
            history_capacity: 100,
            retry: RetryPolicy::default(),
            lock_dir: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with [`FLUSH_DELAY_ENV`] applied.
    ///
    /// An unset or unparseable variable keeps the default delay.
    #[must_use]
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(FLUSH_DELAY_ENV) {
            Ok(raw) => match parse_delay_secs(&raw) {
                Some(delay) => config.flush_delay(delay),
                None => {
                    warn!(value = %raw, "ignoring invalid {FLUSH_DELAY_ENV}");
                    config
                }
            },
            Err(_) => config,
        }
    }

    /// Sets the data directory.
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Sets the document file name.
    #[must_use]
    pub fn data_file(mut self, name: impl Into<String>) -> Self {
        self.data_file = name.into();
        self
    }

    /// Sets the template file name.
    #[must_use]
    pub fn templates_file(mut self, name: impl Into<String>) -> Self {
        self.templates_file = name.into();
        self
    }

    /// Sets the flush delay.
    #[must_use]
    pub fn flush_delay(mut self, delay: Duration) -> Self {
        self.flush_delay = delay;
        self
    }

    /// Sets the undo capacity.
    #[must_use]
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Sets the rename retry policy.
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets whether to lock the data directory.
    #[must_use]
    pub fn lock_dir(mut self, value: bool) -> Self {
        self.lock_dir = value;
        self
    }

    /// Full path of the document file.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.data_dir.join(&self.data_file)
    }

    /// Full path of the template file.
    #[must_use]
    pub fn templates_path(&self) -> PathBuf {
        self.data_dir.join(&self.templates_file)
    }
}

/// Parses non-negative float seconds.
#[must_use]
pub fn parse_delay_secs(raw: &str) -> Option<Duration> {
    let secs = raw.trim().parse::<f64>().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}
