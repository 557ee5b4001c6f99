use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://tasks.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    /// Where tracing output goes; the terminal UI owns stdout.
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Reads `DATABASE_URL` and `TASKBOARD_LOG_FILE`. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            database_url: non_empty("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            log_file: non_empty("TASKBOARD_LOG_FILE").map(PathBuf::from),
        }
    }
}
