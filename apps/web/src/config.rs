use std::{net::SocketAddr, time::Duration};

use sentiscope_core::config::env_parse;

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
    pub session_ttl: Duration,
    pub purge_interval: Duration,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
            max_upload_bytes: 512 * 1024 * 1024,
            session_ttl: Duration::from_secs(60 * 60),
            purge_interval: Duration::from_secs(60),
        }
    }
}

impl WebConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(bind) = env_parse::<SocketAddr>("SENTISCOPE_BIND") {
            config.bind = bind;
        }
        if let Some(mb) = env_parse::<usize>("SENTISCOPE_MAX_UPLOAD_MB") {
            config.max_upload_bytes = mb.saturating_mul(1024 * 1024);
        }
        if let Some(secs) = env_parse::<u64>("SENTISCOPE_SESSION_TTL_SECS") {
            config.session_ttl = Duration::from_secs(secs);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = WebConfig::default();
        assert_eq!(config.bind.to_string(), "127.0.0.1:8501");
        assert_eq!(config.max_upload_bytes, 536_870_912);
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
    }
}
