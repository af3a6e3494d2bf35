// Download orchestrator: one or two fetches, optional mux, delivery
//
// Idle -> FetchingPrimary -> (FetchingAudio -> Muxing)? -> Delivering -> Done
// Any step may end in Failed. Every scratch file is an `Artifact`, so a
// failure at any step drops (and deletes) whatever was fetched so far.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use super::errors::{PipelineError, PipelineResult, StreamRole};
use super::format_selector::FormatSelector;
use super::models::StreamDescriptor;
use super::storage::{Artifact, CopyError, TempStore};
use super::traits::{MediaSource, Muxer};

const ARTIFACT_PREFIX: &str = "yt-";

/// Steps of a single download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadState {
    Idle,
    FetchingPrimary,
    FetchingAudio,
    Muxing,
    Delivering,
    Done,
    Failed(String),
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::FetchingPrimary => write!(f, "fetching primary stream"),
            Self::FetchingAudio => write!(f, "fetching audio stream"),
            Self::Muxing => write!(f, "muxing"),
            Self::Delivering => write!(f, "delivering"),
            Self::Done => write!(f, "done"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Every state the run went through, `Idle` to `Done`
    pub states: Vec<DownloadState>,
    /// Bytes fetched over all streams
    pub bytes_fetched: u64,
    /// Whether a separate audio stream was fetched and muxed in
    pub muxed: bool,
}

/// Tracks the state of one run and logs transitions
struct Job<'a> {
    label: &'a str,
    states: Vec<DownloadState>,
}

impl<'a> Job<'a> {
    fn new(label: &'a str) -> Self {
        Self {
            label,
            states: vec![DownloadState::Idle],
        }
    }

    fn enter(&mut self, state: DownloadState) {
        tracing::debug!("[Orchestrator] {}: {}", self.label, state);
        self.states.push(state);
    }

    // the dispatcher logs the failure when it reports it
    fn fail(&mut self, err: PipelineError) -> PipelineError {
        tracing::debug!("[Orchestrator] {}: {}", self.label, err);
        self.states.push(DownloadState::Failed(err.to_string()));
        err
    }
}

pub struct DownloadOrchestrator {
    source: Arc<dyn MediaSource>,
    muxer: Arc<dyn Muxer>,
    store: TempStore,
}

impl DownloadOrchestrator {
    pub fn new(source: Arc<dyn MediaSource>, muxer: Arc<dyn Muxer>, store: TempStore) -> Self {
        Self {
            source,
            muxer,
            store,
        }
    }

    /// Fetch the chosen stream (plus the best audio stream when it is
    /// video-only), mux if needed, and hand the final file to `deliver`.
    ///
    /// The final file is removed after `deliver` returns, whatever it
    /// returned. A delivery error is passed through unchanged.
    pub async fn run<F, Fut>(
        &self,
        label: &str,
        chosen: &StreamDescriptor,
        audio_streams: &[StreamDescriptor],
        deliver: F,
    ) -> PipelineResult<DownloadReport>
    where
        F: FnOnce(&Path) -> Fut,
        Fut: Future<Output = PipelineResult<()>>,
    {
        let mut job = Job::new(label);

        let (output, bytes_fetched, muxed) = if chosen.carries_audio() {
            job.enter(DownloadState::FetchingPrimary);
            let (artifact, bytes) = self
                .fetch(chosen, StreamRole::Video)
                .await
                .map_err(|e| job.fail(e))?;
            (artifact, bytes, false)
        } else {
            let audio = FormatSelector::find_best_audio(audio_streams)
                .ok_or_else(|| job.fail(PipelineError::NoAudioAvailable))?;

            job.enter(DownloadState::FetchingPrimary);
            let (video_file, video_bytes) = self
                .fetch(chosen, StreamRole::Video)
                .await
                .map_err(|e| job.fail(e))?;

            // video_file is dropped (and removed) if anything below fails
            job.enter(DownloadState::FetchingAudio);
            let (audio_file, audio_bytes) = self
                .fetch(audio, StreamRole::Audio)
                .await
                .map_err(|e| job.fail(e))?;

            job.enter(DownloadState::Muxing);
            let merged = self.merge(&video_file, &audio_file).await.map_err(|e| job.fail(e))?;
            video_file.release();
            audio_file.release();

            (merged, video_bytes + audio_bytes, true)
        };

        job.enter(DownloadState::Delivering);
        let delivered = deliver(output.path()).await;
        output.release();

        match delivered {
            Ok(()) => {
                job.enter(DownloadState::Done);
                tracing::info!(
                    "[Orchestrator] {}: delivered ({} bytes fetched, muxed: {})",
                    label,
                    bytes_fetched,
                    muxed
                );
                Ok(DownloadReport {
                    states: job.states,
                    bytes_fetched,
                    muxed,
                })
            }
            Err(e) => Err(job.fail(e)),
        }
    }

    /// Open one descriptor and copy it into a fresh scratch file
    async fn fetch(
        &self,
        descriptor: &StreamDescriptor,
        role: StreamRole,
    ) -> PipelineResult<(Artifact, u64)> {
        let stream = self
            .source
            .open(descriptor)
            .await
            .map_err(|e| PipelineError::StreamUnavailable {
                role,
                reason: e.to_string(),
            })?;

        let suffix = if descriptor.container.is_empty() {
            String::new()
        } else {
            format!(".{}", descriptor.container)
        };
        let mut artifact = self
            .store
            .create(ARTIFACT_PREFIX, &suffix)
            .map_err(|source| PipelineError::WriteError { role, source })?;

        let written = artifact.write_from(stream).await.map_err(|e| match e {
            CopyError::Source(e) => PipelineError::StreamUnavailable {
                role,
                reason: e.to_string(),
            },
            CopyError::Sink(source) => PipelineError::WriteError { role, source },
        })?;

        tracing::debug!(
            "[Orchestrator] Fetched {} stream {} ({} bytes) via {}",
            role,
            descriptor.handle.format_id,
            written,
            self.source.name()
        );
        Ok((artifact, written))
    }

    async fn merge(&self, video: &Artifact, audio: &Artifact) -> PipelineResult<Artifact> {
        let output = self
            .store
            .create(ARTIFACT_PREFIX, ".mp4")
            .map_err(|e| PipelineError::MuxFailed(format!("cannot allocate output: {}", e)))?;

        self.muxer
            .mux(video.path(), audio.path(), output.path())
            .await?;

        tracing::debug!("[Orchestrator] Merged with {}", self.muxer.name());
        Ok(output)
    }
}
