//! Sync client configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_WEBSOCKET_URL: &str = "ws://localhost:1234";
pub const DEFAULT_BACKOFF_INITIAL_MS: u64 = 100;
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 2500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Relay endpoint; the room id is appended as a path segment.
    pub endpoint: String,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_WEBSOCKET_URL.to_string(),
            backoff_initial: Duration::from_millis(DEFAULT_BACKOFF_INITIAL_MS),
            backoff_max: Duration::from_millis(DEFAULT_BACKOFF_MAX_MS),
        }
    }
}

impl SyncConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `SYNCDRAW_WEBSOCKET_URL`: default `ws://localhost:1234`
    /// - `SYNCDRAW_BACKOFF_INITIAL_MS`: default 100
    /// - `SYNCDRAW_BACKOFF_MAX_MS`: default 2500
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let endpoint = lookup("SYNCDRAW_WEBSOCKET_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_WEBSOCKET_URL.to_string());
        let backoff_initial = parse_u64(&lookup, "SYNCDRAW_BACKOFF_INITIAL_MS", DEFAULT_BACKOFF_INITIAL_MS);
        let backoff_max = parse_u64(&lookup, "SYNCDRAW_BACKOFF_MAX_MS", DEFAULT_BACKOFF_MAX_MS);

        Self {
            endpoint,
            backoff_initial: Duration::from_millis(backoff_initial),
            backoff_max: Duration::from_millis(backoff_max),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
