// Configuration for the yt-dlp backed media source

/// Default socket timeout handed to yt-dlp, in seconds
pub const DEFAULT_SOCKET_TIMEOUT_SECS: u32 = 30;

/// Configuration for catalog lookups and stream requests
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// yt-dlp executable (path or bare name)
    pub ytdlp_path: String,
    /// SOCKS5/HTTP proxy URL, used by yt-dlp and by stream requests
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<String>,
    /// yt-dlp `--socket-timeout` in seconds
    pub timeout_seconds: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            proxy: None,
            cookies_path: None,
            timeout_seconds: DEFAULT_SOCKET_TIMEOUT_SECS,
        }
    }
}

impl ExtractorConfig {
    pub fn with_ytdlp_path(mut self, path: impl Into<String>) -> Self {
        self.ytdlp_path = path.into();
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<String>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}
