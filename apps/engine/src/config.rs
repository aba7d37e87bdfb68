//! Engine configuration from the environment.

use anyhow::{bail, Context};
use std::path::PathBuf;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub db_path: PathBuf,
    pub log_filter: String,
    /// Attempts per storage write, including the first.
    pub retry_attempts: u32,
}

impl EngineConfig {
    /// Load from process environment, after reading `.env` if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("VOCAB_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);
        let log_filter = lookup("RUST_LOG").unwrap_or_else(|| "info".into());
        let retry_attempts = match lookup("VOCAB_RETRY_ATTEMPTS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("VOCAB_RETRY_ATTEMPTS must be a number, got '{raw}'"))?,
            None => DEFAULT_RETRY_ATTEMPTS,
        };
        if retry_attempts == 0 {
            bail!("VOCAB_RETRY_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            db_path,
            log_filter,
            retry_attempts,
        })
    }
}

fn default_db_path() -> PathBuf {
    // Use app data directory, fallback to current dir
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vocab-engine")
        .join("vocab.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.db_path.ends_with("vocab-engine/vocab.db"));
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.retry_attempts, 3);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("VOCAB_DB_PATH", "/tmp/words.db"),
            ("RUST_LOG", "vocab_engine=debug"),
            ("VOCAB_RETRY_ATTEMPTS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/words.db"));
        assert_eq!(config.log_filter, "vocab_engine=debug");
        assert_eq!(config.retry_attempts, 5);
    }

    #[test]
    fn test_rejects_bad_retry_count() {
        assert!(EngineConfig::from_lookup(lookup(&[("VOCAB_RETRY_ATTEMPTS", "many")])).is_err());
        assert!(EngineConfig::from_lookup(lookup(&[("VOCAB_RETRY_ATTEMPTS", "0")])).is_err());
    }
}
