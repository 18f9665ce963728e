use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the API base URL.
pub const API_ENV_VAR: &str = "MOVIE_EXPLORER_API";

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin serving the `/api/v1` routes.
    pub api_base_url: String,
    pub search_debounce_ms: u64,
    pub min_query_len: usize,
    /// Cast members shown on detail pages.
    pub cast_limit: usize,
    /// No timeout unless set.
    pub request_timeout_secs: Option<u64>,
    /// Where file-backed session storage lives; defaults to the cache dir.
    pub session_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            search_debounce_ms: 400,
            min_query_len: 2,
            cast_limit: 20,
            request_timeout_secs: None,
            session_file: None,
        }
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "movie-explorer", "movie-explorer")
        .ok_or_else(|| AppError::Configuration("Could not determine home directory".to_string()))
}

impl Config {
    /// Load `config.json` from the user config dir (defaults when absent),
    /// then apply the environment override.
    pub fn load() -> Result<Self> {
        let path = project_dirs()?.config_dir().join("config.json");
        let config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            AppError::Configuration(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_ENV_VAR) {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_base_url)?;
        if self.min_query_len == 0 {
            return Err(AppError::Configuration(
                "min_query_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn session_path(&self) -> Result<PathBuf> {
        match &self.session_file {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.cache_dir().join("session.json")),
        }
    }

    pub fn log_path() -> Result<PathBuf> {
        Ok(project_dirs()?.cache_dir().join("movie-explorer.log"))
    }
}
