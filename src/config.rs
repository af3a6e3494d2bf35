// Bot configuration: JSON file plus environment overrides

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::bot::dispatcher::{DispatchSettings, DEFAULT_MAX_CONCURRENT_REQUESTS};
use crate::downloader::extractors::{ExtractorConfig, DEFAULT_SOCKET_TIMEOUT_SECS};
use crate::downloader::format_selector::DEFAULT_MAX_HEIGHT;
use crate::downloader::mux::DEFAULT_AUDIO_CODEC;
use crate::downloader::utils::find_binary;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
/// Overrides the config file location
pub const CONFIG_PATH_ENV: &str = "TUBE_RELAY_CONFIG";
/// Overrides `tgbotkey`
pub const BOT_TOKEN_ENV: &str = "TUBE_RELAY_BOT_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Telegram bot token
    pub tgbotkey: String,
    /// Root for temp artifacts; platform cache dir when unset
    pub scratch_dir: Option<PathBuf>,
    /// yt-dlp executable; auto-detected when unset
    pub ytdlp_path: Option<String>,
    pub ffmpeg_path: String,
    pub max_concurrent_requests: usize,
    pub max_height: u32,
    pub audio_codec: String,
    pub proxy: Option<String>,
    pub cookies_path: Option<String>,
    pub socket_timeout_secs: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            tgbotkey: String::new(),
            scratch_dir: None,
            ytdlp_path: None,
            ffmpeg_path: "ffmpeg".to_string(),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            max_height: DEFAULT_MAX_HEIGHT,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            proxy: None,
            cookies_path: None,
            socket_timeout_secs: DEFAULT_SOCKET_TIMEOUT_SECS,
        }
    }
}

impl BotConfig {
    /// Load from `TUBE_RELAY_CONFIG` (or `config.json`), apply environment
    /// overrides and validate
    pub fn from_env() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(&path, |key| std::env::var(key).ok())
    }

    /// Load `path`, taking overrides from `env`
    pub fn load(
        path: impl AsRef<Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?
            .with_env_overrides(env);
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content).context("Failed to parse config JSON")
    }

    pub fn with_env_overrides(mut self, env: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(token) = env(BOT_TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            self.tgbotkey = token;
        }
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tgbotkey.trim().is_empty() {
            bail!("Bot token is empty: set `tgbotkey` or {}", BOT_TOKEN_ENV);
        }
        if self.max_concurrent_requests == 0 {
            bail!("`max_concurrent_requests` must be at least 1");
        }
        Ok(())
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.tgbotkey = token.into();
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn with_ytdlp_path(mut self, path: impl Into<String>) -> Self {
        self.ytdlp_path = Some(path.into());
        self
    }

    pub fn with_ffmpeg_path(mut self, path: impl Into<String>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    pub fn with_max_concurrent_requests(mut self, limit: usize) -> Self {
        self.max_concurrent_requests = limit;
        self
    }

    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = height;
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Scratch root: configured dir, else `<cache dir>/tube-relay/scratch`,
    /// else `<temp dir>/tube-relay`
    pub fn scratch_root(&self) -> PathBuf {
        if let Some(dir) = &self.scratch_dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .map(|cache| cache.join("tube-relay").join("scratch"))
            .unwrap_or_else(|| std::env::temp_dir().join("tube-relay"))
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        let ytdlp = self
            .ytdlp_path
            .clone()
            .unwrap_or_else(|| find_binary("yt-dlp"));
        ExtractorConfig::default()
            .with_ytdlp_path(ytdlp)
            .with_proxy(self.proxy.clone())
            .with_cookies_path(self.cookies_path.clone())
            .with_timeout(self.socket_timeout_secs)
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            max_height: self.max_height,
            max_concurrent_requests: self.max_concurrent_requests,
        }
    }
}
