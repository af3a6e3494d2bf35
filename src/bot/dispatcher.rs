// Request dispatcher
//
// Message with a video link -> catalog lookup -> ladder -> choice buttons.
// Button press -> decode token -> fresh lookup -> bounds check -> download.
//
// Every inbound event runs in its own task. A semaphore caps how many run at
// once; waiting for a permit happens inside the spawned task, so accepting
// events never blocks.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::transport::{ChatTransport, Choice, InboundEvent, MediaUpload};
use crate::downloader::errors::{PipelineError, PipelineResult};
use crate::downloader::format_selector::{FormatSelector, DEFAULT_MAX_HEIGHT};
use crate::downloader::models::{Catalog, QualityOption, VideoReference};
use crate::downloader::orchestrator::DownloadOrchestrator;
use crate::downloader::traits::MediaSource;
use crate::downloader::{token, utils};

pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 8;

const FETCHING_FORMATS_TEXT: &str = "Fetching available formats...";
const DOWNLOADING_TEXT: &str = "Downloading video...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Ladder cap in pixels
    pub max_height: u32,
    /// Upper bound of events handled at the same time
    pub max_concurrent_requests: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_height: DEFAULT_MAX_HEIGHT,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
        }
    }
}

pub struct RequestDispatcher {
    source: Arc<dyn MediaSource>,
    orchestrator: Arc<DownloadOrchestrator>,
    transport: Arc<dyn ChatTransport>,
    permits: Semaphore,
    settings: DispatchSettings,
}

impl RequestDispatcher {
    pub fn new(
        source: Arc<dyn MediaSource>,
        orchestrator: Arc<DownloadOrchestrator>,
        transport: Arc<dyn ChatTransport>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            source,
            orchestrator,
            transport,
            permits: Semaphore::new(settings.max_concurrent_requests.max(1)),
            settings,
        }
    }

    /// Spawn handling of one event and return immediately
    pub fn dispatch(self: &Arc<Self>, event: InboundEvent) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.handle(event).await })
    }

    /// Handle one event to completion. Never fails: every error is reported
    /// to the chat and logged here.
    pub async fn handle(&self, event: InboundEvent) {
        let Ok(_permit) = self.permits.acquire().await else {
            tracing::error!("[Dispatcher] Semaphore closed, dropping {:?}", event);
            return;
        };

        let chat_id = event.chat_id();
        let result = match event {
            InboundEvent::Message { chat_id, text } => self.on_message(chat_id, &text).await,
            InboundEvent::Interaction {
                chat_id,
                message_id,
                data,
            } => self.on_interaction(chat_id, message_id, &data).await,
        };

        if let Err(e) = result {
            self.report(chat_id, &e).await;
        }
    }

    async fn on_message(&self, chat_id: i64, text: &str) -> PipelineResult<()> {
        let Some(reference) = utils::detect_video_reference(text) else {
            tracing::debug!("[Dispatcher] chat {}: ignoring non-link message", chat_id);
            return Ok(());
        };

        tracing::info!("[Dispatcher] chat {}: formats requested for {}", chat_id, reference);
        self.notify(chat_id, FETCHING_FORMATS_TEXT).await;

        let catalog = self.source.lookup(&reference).await?;
        let ladder = self.ladder(&catalog);
        if ladder.is_empty() {
            return Err(PipelineError::NoFormatsFound);
        }

        let choices: Vec<Choice> = ladder
            .iter()
            .enumerate()
            .map(|(index, option)| Choice {
                label: option.label.clone(),
                id: token::encode(&reference, index),
            })
            .collect();

        let prompt = if catalog.metadata.title.is_empty() {
            "Choose quality:".to_string()
        } else {
            format!("{}\nChoose quality:", catalog.metadata.title)
        };

        if let Err(e) = self.transport.send_choices(chat_id, &prompt, &choices).await {
            tracing::warn!("[Dispatcher] chat {}: failed to send choices: {}", chat_id, e);
        }
        Ok(())
    }

    async fn on_interaction(&self, chat_id: i64, message_id: i32, data: &str) -> PipelineResult<()> {
        if let Err(e) = self.transport.remove_message(chat_id, message_id).await {
            tracing::warn!("[Dispatcher] chat {}: failed to remove choices: {}", chat_id, e);
        }

        let selection = token::decode(data)?;

        // fresh lookup on purpose: the ladder is never cached between the
        // two halves of the round trip
        // an empty ladder here is a stale selection, not a missing format
        let catalog = self.source.lookup(&selection.reference).await?;
        let ladder = self.ladder(&catalog);
        let option = ladder
            .get(selection.index)
            .ok_or(PipelineError::StaleSelection {
                index: selection.index,
                available: ladder.len(),
            })?;

        tracing::info!(
            "[Dispatcher] chat {}: downloading {} at {}",
            chat_id,
            selection.reference,
            option.label
        );
        self.notify(chat_id, DOWNLOADING_TEXT).await;

        self.download(chat_id, &selection.reference, option, &catalog)
            .await
    }

    async fn download(
        &self,
        chat_id: i64,
        reference: &VideoReference,
        option: &QualityOption,
        catalog: &Catalog,
    ) -> PipelineResult<()> {
        let label = format!("{} [{}]", reference, option.label);
        let file_name = format!("{}.mp4", catalog.metadata.id);
        let caption = catalog.metadata.title.clone();
        let transport = &self.transport;

        let deliver = |path: &Path| {
            let path = path.to_path_buf();
            async move {
                transport
                    .send_media(
                        chat_id,
                        MediaUpload {
                            path: &path,
                            file_name: &file_name,
                            caption: &caption,
                        },
                    )
                    .await
                    .map_err(|e| PipelineError::DeliveryFailed(e.to_string()))
            }
        };

        self.orchestrator
            .run(&label, &option.descriptor, &catalog.audio_streams(), deliver)
            .await?;
        Ok(())
    }

    fn ladder(&self, catalog: &Catalog) -> Vec<QualityOption> {
        FormatSelector::build_quality_options(&catalog.streams, self.settings.max_height)
    }

    async fn report(&self, chat_id: i64, err: &PipelineError) {
        tracing::warn!("[Dispatcher] chat {}: {}", chat_id, err);
        self.notify(chat_id, &err.user_message()).await;
    }

    /// Send a text; failures are logged, never returned
    async fn notify(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.transport.send_text(chat_id, text).await {
            tracing::warn!("[Dispatcher] chat {}: failed to send text: {}", chat_id, e);
        }
    }
}
