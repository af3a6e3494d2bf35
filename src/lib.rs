pub mod bot;
pub mod config;
pub mod downloader;

#[cfg(test)]
mod testing;

use anyhow::Context;
use std::sync::Arc;
use teloxide::prelude::*;

use bot::{RequestDispatcher, TelegramTransport};
use config::BotConfig;
use downloader::{DownloadOrchestrator, FfmpegMuxer, TempStore, YtDlpSource};

/// Wire the pipeline together and serve Telegram updates until Ctrl-C
pub async fn run(config: BotConfig) -> anyhow::Result<()> {
    let scratch = config.scratch_root();
    let store = TempStore::new(&scratch)
        .with_context(|| format!("Failed to create scratch dir {}", scratch.display()))?;
    tracing::info!("[Bootstrap] Scratch dir: {}", store.root().display());

    let extractor = config.extractor_config();
    tracing::info!("[Bootstrap] Using yt-dlp at {}", extractor.ytdlp_path);
    let source = Arc::new(YtDlpSource::new(extractor).context("Failed to build HTTP client")?);
    let muxer = Arc::new(FfmpegMuxer::new(config.ffmpeg_path.clone(), config.audio_codec.clone()));
    let orchestrator = Arc::new(DownloadOrchestrator::new(source.clone(), muxer, store));

    let bot = Bot::new(config.tgbotkey.clone());
    let me = bot.get_me().await.context("Failed to authorize with Telegram")?;
    tracing::info!("[Bootstrap] Authorized as @{}", me.username());

    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let dispatcher = Arc::new(RequestDispatcher::new(
        source,
        orchestrator,
        transport,
        config.dispatch_settings(),
    ));

    bot::telegram::run(bot, dispatcher).await;
    tracing::info!("[Bootstrap] Stopped");
    Ok(())
}
