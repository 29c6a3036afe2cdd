//! Configuration module for Pulseboard.
//!
//! Loads run configuration from environment variables with sensible defaults.
//! The registry itself lives in a JSON file; see [`crate::registry`].

use std::env;
use std::time::Duration;

/// Per-run configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Path to the endpoint registry JSON file (default: "registry.json")
    pub registry_path: String,
    /// Path to the history ledger JSON file (default: "history.json")
    pub ledger_path: String,
    /// URL of the incident feed; empty disables incident correlation
    pub feed_url: String,
    /// Path the finished snapshot JSON is written to (default: "snapshot.json")
    pub snapshot_path: String,
    /// Per-probe timeout (default: 5s)
    pub probe_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            registry_path: "registry.json".to_string(),
            ledger_path: "history.json".to_string(),
            feed_url: String::new(),
            snapshot_path: "snapshot.json".to_string(),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

impl RunConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PULSEBOARD_REGISTRY_PATH`: registry file path (default: "registry.json")
    /// - `PULSEBOARD_LEDGER_PATH`: ledger file path (default: "history.json")
    /// - `PULSEBOARD_FEED_URL`: incident feed URL (default: unset, correlation off)
    /// - `PULSEBOARD_SNAPSHOT_PATH`: snapshot output path (default: "snapshot.json")
    /// - `PULSEBOARD_PROBE_TIMEOUT_SECS`: per-probe timeout in seconds (default: 5)
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(path) = env::var("PULSEBOARD_REGISTRY_PATH") {
            cfg.registry_path = path;
        }

        if let Ok(path) = env::var("PULSEBOARD_LEDGER_PATH") {
            cfg.ledger_path = path;
        }

        if let Ok(url) = env::var("PULSEBOARD_FEED_URL") {
            cfg.feed_url = url;
        }

        if let Ok(path) = env::var("PULSEBOARD_SNAPSHOT_PATH") {
            cfg.snapshot_path = path;
        }

        if let Ok(secs_str) = env::var("PULSEBOARD_PROBE_TIMEOUT_SECS") {
            if let Ok(secs) = secs_str.parse::<u64>() {
                if secs > 0 {
                    cfg.probe_timeout = Duration::from_secs(secs);
                }
            }
        }

        cfg
    }
}
