//! ============================================================================
//! Client Configuration
//! ============================================================================
//! Backend base URL, session database location and request timeout.
//! Read from the environment (after loading `.env`), overridable by callers.
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::types::{QuestError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

const ENV_API_URL: &str = "TASKQUEST_API_URL";
const ENV_DB_PATH: &str = "TASKQUEST_DB_PATH";
const ENV_TIMEOUT: &str = "TASKQUEST_TIMEOUT_SECS";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Session database path. `None` means `~/.taskquest/session.redb`.
    pub db_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            db_path: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Load `.env` (if any) and read configuration from the environment
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            api_base_url: lookup(ENV_API_URL)
                .map(|url| normalize_base_url(&url))
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.api_base_url),
            db_path: lookup(ENV_DB_PATH).filter(|p| !p.is_empty()).map(PathBuf::from),
            request_timeout_secs: lookup(ENV_TIMEOUT)
                .and_then(|v| v.trim().parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_base_url = normalize_base_url(url);
        self
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the session database path, creating `~/.taskquest` if needed
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| QuestError::Storage("Cannot determine home directory".into()))?;
        let dir = home.join(".taskquest");
        std::fs::create_dir_all(&dir)
            .map_err(|e| QuestError::Storage(format!("Failed to create {}: {}", dir.display(), e)))?;
        Ok(dir.join("session.redb"))
    }
}

/// Strip whitespace and trailing slashes so paths can be appended with `/`
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
