use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the listings API, without a trailing slash
    pub api_base: String,
    /// Optional client-wide request deadline. Unset by default: a request
    /// runs until the server answers or the connection fails.
    pub timeout: Option<Duration>,
    /// Directory holding the persisted bearer token
    pub token_dir: PathBuf,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        let token_dir = std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".wisekey"))
            .unwrap_or_else(|| PathBuf::from(".wisekey"));

        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: None,
            token_dir,
            user_agent: concat!("wisekey-scout/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Defaults overlaid with `WISEKEY_API_BASE`, `WISEKEY_TIMEOUT_SECS` and
    /// `WISEKEY_TOKEN_DIR`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(base) = lookup("WISEKEY_API_BASE") {
            config = config.with_api_base(&base);
        }
        if let Some(secs) = lookup("WISEKEY_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("WISEKEY_TIMEOUT_SECS is not a number: {secs}"))?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(dir) = lookup("WISEKEY_TOKEN_DIR") {
            config.token_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim().trim_end_matches('/').to_string();
        self
    }
}
