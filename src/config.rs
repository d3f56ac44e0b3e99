use reqwest::Url;
use std::path::PathBuf;

use crate::error::{ClientError, Result};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
pub const DEFAULT_SHORTLIST_SIZE: u32 = 10;

/// Client configuration, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: Url,
    pub data_dir: PathBuf,
    pub shortlist_size: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = match lookup("SCOUT_API_BASE") {
            Some(raw) => parse_api_base(&raw)?,
            None => parse_api_base(DEFAULT_API_BASE)?,
        };

        let data_dir = lookup("SCOUT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let shortlist_size = match lookup("SCOUT_SHORTLIST_SIZE") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                ClientError::Config(format!("SCOUT_SHORTLIST_SIZE must be a whole number, got '{raw}'"))
            })?,
            None => DEFAULT_SHORTLIST_SIZE,
        };

        Ok(Config {
            api_base,
            data_dir,
            shortlist_size,
        })
    }

    /// Overrides the API base, e.g. from a command-line flag.
    pub fn with_api_base(mut self, raw: &str) -> Result<Self> {
        self.api_base = parse_api_base(raw)?;
        Ok(self)
    }

    pub fn current_result_path(&self) -> PathBuf {
        self.data_dir.join("current_result.json")
    }
}

pub fn parse_api_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ClientError::Config(format!("invalid API base '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::Config(format!(
            "API base must be http or https, got '{other}'"
        ))),
    }
}

fn default_data_dir() -> PathBuf {
    // Use XDG data directory or fallback
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "scout") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        PathBuf::from(".scout")
    }
}
