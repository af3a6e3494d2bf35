// In-memory fakes for the pipeline seams, test builds only

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::bot::transport::{ChatTransport, Choice, MediaUpload, TransportError};
use crate::downloader::errors::PipelineError;
use crate::downloader::models::{
    Catalog, FetchHandle, MediaKind, StreamDescriptor, VideoMetadata, VideoReference,
};
use crate::downloader::traits::{ByteStream, MediaSource, Muxer};

fn descriptor(kind: MediaKind, container: &str, height: u32, bitrate: u32, id: &str) -> StreamDescriptor {
    StreamDescriptor {
        kind,
        container: container.to_string(),
        height,
        bitrate,
        audio_channels: 0,
        handle: FetchHandle {
            format_id: id.to_string(),
            url: format!("https://media.test/{}", id),
            http_headers: HashMap::new(),
        },
    }
}

pub fn video(height: u32, id: &str) -> StreamDescriptor {
    descriptor(MediaKind::Video, "mp4", height, 0, id)
}

pub fn audio(bitrate: u32, id: &str) -> StreamDescriptor {
    descriptor(MediaKind::Audio, "m4a", 0, bitrate, id)
}

pub fn combined(height: u32, id: &str) -> StreamDescriptor {
    descriptor(MediaKind::Combined, "mp4", height, 96, id)
}

/// Number of entries left in a scratch directory
pub fn scratch_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// Media source serving `bytes:<format_id>` for every descriptor
#[derive(Default)]
pub struct FakeSource {
    catalogs: HashMap<String, Catalog>,
    gates: HashMap<String, Arc<Notify>>,
    failing_open: HashSet<String>,
    failing_body: HashSet<String>,
    lookups: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(id: &str, title: &str, streams: Vec<StreamDescriptor>) -> Catalog {
        Catalog {
            metadata: VideoMetadata {
                id: id.to_string(),
                title: title.to_string(),
            },
            streams,
        }
    }

    pub fn with_catalog(mut self, reference: &str, catalog: Catalog) -> Self {
        self.catalogs.insert(reference.to_string(), catalog);
        self
    }

    /// Hold lookups of `reference` until `gate` is notified
    pub fn gated(mut self, reference: &str, gate: Arc<Notify>) -> Self {
        self.gates.insert(reference.to_string(), gate);
        self
    }

    pub fn failing_open(mut self, format_id: &str) -> Self {
        self.failing_open.insert(format_id.to_string());
        self
    }

    /// Open succeeds but the body breaks after the first chunk
    pub fn failing_body(mut self, format_id: &str) -> Self {
        self.failing_body.insert(format_id.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaSource for FakeSource {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn lookup(&self, reference: &VideoReference) -> Result<Catalog, PipelineError> {
        self.lookups.lock().unwrap().push(reference.to_string());

        if let Some(gate) = self.gates.get(reference.as_str()) {
            gate.notified().await;
        }

        self.catalogs
            .get(reference.as_str())
            .cloned()
            .ok_or_else(|| PipelineError::CatalogUnavailable(format!("unknown video {}", reference)))
    }

    async fn open(&self, descriptor: &StreamDescriptor) -> Result<ByteStream, io::Error> {
        let id = descriptor.handle.format_id.clone();
        self.opened.lock().unwrap().push(id.clone());

        if self.failing_open.contains(&id) {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "HTTP 403"));
        }

        let body = Bytes::from(format!("bytes:{}", id));
        let chunks = if self.failing_body.contains(&id) {
            vec![
                Ok(body),
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
            ]
        } else {
            vec![Ok(body)]
        };
        Ok(Box::pin(stream::iter(chunks)))
    }
}

/// Muxer writing `<video>+<audio>` into the output
#[derive(Default)]
pub struct FakeMuxer {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeMuxer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Muxer for FakeMuxer {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PipelineError::MuxFailed("exit status: 1".to_string()));
        }

        let mut merged = tokio::fs::read(video).await.map_err(|e| PipelineError::MuxFailed(e.to_string()))?;
        merged.push(b'+');
        merged.extend(tokio::fs::read(audio).await.map_err(|e| PipelineError::MuxFailed(e.to_string()))?);
        tokio::fs::write(output, merged)
            .await
            .map_err(|e| PipelineError::MuxFailed(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRecord {
    pub chat_id: i64,
    pub file_name: String,
    pub caption: String,
    /// File content read at send time
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { chat_id: i64, text: String },
    Media(MediaRecord),
    Choices { chat_id: i64, text: String, choices: Vec<Choice> },
    Removed { chat_id: i64, message_id: i32 },
}

/// Transport recording every successful call
#[derive(Default)]
pub struct RecordingTransport {
    fail_text: bool,
    fail_media: bool,
    sent: Mutex<Vec<Sent>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_text(mut self) -> Self {
        self.fail_text = true;
        self
    }

    pub fn failing_media(mut self) -> Self {
        self.fail_media = true;
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn media(&self) -> Vec<MediaRecord> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Media(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn choices(&self) -> Vec<(String, Vec<Choice>)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Choices { text, choices, .. } => Some((text, choices)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        if self.fail_text {
            return Err(TransportError("chat unavailable".to_string()));
        }
        self.record(Sent::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_media(&self, chat_id: i64, media: MediaUpload<'_>) -> Result<(), TransportError> {
        if self.fail_media {
            return Err(TransportError("file too large".to_string()));
        }
        let content = tokio::fs::read(media.path)
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        self.record(Sent::Media(MediaRecord {
            chat_id,
            file_name: media.file_name.to_string(),
            caption: media.caption.to_string(),
            content,
        }));
        Ok(())
    }

    async fn send_choices(&self, chat_id: i64, text: &str, choices: &[Choice]) -> Result<(), TransportError> {
        self.record(Sent::Choices {
            chat_id,
            text: text.to_string(),
            choices: choices.to_vec(),
        });
        Ok(())
    }

    async fn remove_message(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError> {
        self.record(Sent::Removed { chat_id, message_id });
        Ok(())
    }
}
