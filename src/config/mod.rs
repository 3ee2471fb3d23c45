//! Settings read from the environment.

use std::env;

use crate::Error;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_REGION_CODE: &str = "KR";
pub const DEFAULT_RELEVANCE_LANGUAGE: &str = "ko";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Data API key. A missing key only becomes an error once a search is made.
    pub api_key: Option<String>,
    pub base_url: String,
    pub region_code: String,
    pub relevance_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            region_code: DEFAULT_REGION_CODE.to_string(),
            relevance_language: DEFAULT_RELEVANCE_LANGUAGE.to_string(),
        }
    }
}

impl Config {
    /// Reads `YOUTUBE_API_KEY`, `YOUTUBE_API_BASE_URL`, `YOUTUBE_REGION_CODE`
    /// and `YOUTUBE_RELEVANCE_LANGUAGE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [Config::from_env], against an arbitrary source of variables.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            api_key: var("YOUTUBE_API_KEY"),
            base_url: var("YOUTUBE_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            region_code: var("YOUTUBE_REGION_CODE").unwrap_or(defaults.region_code),
            relevance_language: var("YOUTUBE_RELEVANCE_LANGUAGE")
                .unwrap_or(defaults.relevance_language),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// The key, or [Error::Configuration] if there isn't one.
    pub fn api_key(&self) -> Result<&str, Error> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::Configuration(
                "YOUTUBE_API_KEY is not set; add it to the environment or a .env file".to_string(),
            )
        })
    }
}
