use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub(crate) const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) api_url: String,
    pub(crate) request_timeout: Duration,
    pub(crate) data_dir: PathBuf,
    pub(crate) log_filter: String,
    pub(crate) log_format: LogFormat,
}

impl Config {
    /// Read configuration from the environment, honouring a `.env` file.
    pub(crate) fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok(), default_data_dir)
    }

    fn from_lookup<F, D>(lookup: F, default_dir: D) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
        D: FnOnce() -> Result<PathBuf>,
    {
        let api_url = lookup("PFT_API_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            anyhow::bail!("PFT_API_URL must start with http:// or https:// (got {api_url})");
        }

        let timeout_secs = match lookup("PFT_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .with_context(|| format!("Invalid PFT_REQUEST_TIMEOUT_SECS: {raw}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let data_dir = match lookup("PFT_DATA_DIR").filter(|s| !s.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_dir()?,
        };

        let log_filter = lookup("PFT_LOG").unwrap_or_else(|| "info".to_string());
        let log_format = match lookup("PFT_LOG_FORMAT") {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
            data_dir,
            log_filter,
            log_format,
        })
    }

    pub(crate) fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    pub(crate) fn log_path(&self) -> PathBuf {
        self.data_dir.join("pftui.log")
    }

    pub(crate) fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!(
                "Failed to create data directory: {}",
                self.data_dir.display()
            )
        })
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "pftui", "pftui")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(proj_dirs.data_dir().to_path_buf())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
