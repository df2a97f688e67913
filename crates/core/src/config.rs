use std::{path::PathBuf, str::FromStr, time::Duration};

use crate::{provider::ProviderConfig, retry::RetryPolicy};

/// Bounds for waiting on the provider's processing job.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 120,
            deadline: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub provider: ProviderConfig,
    pub poll: PollPolicy,
    pub retry: RetryPolicy,
    pub http_timeout: Duration,
    pub temp_dir: PathBuf,
    pub cache_ttl: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            poll: PollPolicy::default(),
            retry: RetryPolicy::default(),
            http_timeout: Duration::from_secs(300),
            temp_dir: std::env::temp_dir(),
            // Provider files are kept for 48 hours.
            cache_ttl: Duration::from_secs(47 * 60 * 60),
        }
    }
}

impl AnalyzerConfig {
    pub fn from_env() -> Self {
        let mut config = Self {
            provider: ProviderConfig::from_env(),
            ..Self::default()
        };

        if let Some(secs) = env_parse::<u64>("SENTISCOPE_POLL_INTERVAL_SECS") {
            config.poll.interval = Duration::from_secs(secs);
        }
        if let Some(attempts) = env_parse::<u32>("SENTISCOPE_POLL_MAX_ATTEMPTS") {
            config.poll.max_attempts = attempts.max(1);
        }
        if let Some(secs) = env_parse::<u64>("SENTISCOPE_POLL_DEADLINE_SECS") {
            config.poll.deadline = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("SENTISCOPE_HTTP_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Ok(dir) = std::env::var("SENTISCOPE_TEMP_DIR") {
            config.temp_dir = PathBuf::from(dir);
        }

        config
    }
}

/// Read and parse an environment variable, ignoring it when malformed.
pub fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring malformed environment variable");
            None
        }
    }
}
