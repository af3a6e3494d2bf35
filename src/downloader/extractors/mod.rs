// Media source backed by the yt-dlp CLI
//
// Catalog lookup shells out to `yt-dlp --dump-json`; stream bytes are pulled
// over HTTP from the direct URLs yt-dlp reports.

mod cli;
mod config;

pub use cli::YtDlpSource;
pub use config::{ExtractorConfig, DEFAULT_SOCKET_TIMEOUT_SECS};
