// Common data models for the download pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// User-supplied identifier of a remote video (URL or id).
///
/// Never validated locally; a bad reference surfaces as a catalog failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoReference(String);

impl VideoReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a stream descriptor carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    /// Video elementary stream only
    Video,
    /// Audio elementary stream only
    Audio,
    /// Video and audio already muxed together
    Combined,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Combined => write!(f, "combined"),
        }
    }
}

/// Where the stream fetcher finds the bytes of one descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchHandle {
    /// Source-specific format id (e.g. "137")
    pub format_id: String,
    /// Direct media URL
    pub url: String,
    /// Headers the source requires on the media request
    pub http_headers: HashMap<String, String>,
}

/// One fetchable representation of a video from a single catalog lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub kind: MediaKind,
    /// Container/codec hint (mp4, webm, m4a)
    pub container: String,
    /// Pixel height, 0 for audio
    pub height: u32,
    /// Bitrate in kbps, 0 for video-only
    pub bitrate: u32,
    /// Audio channel count reported by the source, 0 when unknown or absent
    pub audio_channels: u32,
    pub handle: FetchHandle,
}

impl StreamDescriptor {
    /// Whether a single fetch of this descriptor yields a playable file.
    ///
    /// `Combined` always does; a `Video` descriptor does when the source
    /// reports audio channels for it.
    pub fn carries_audio(&self) -> bool {
        match self.kind {
            MediaKind::Combined => true,
            MediaKind::Video => self.audio_channels > 0,
            MediaKind::Audio => false,
        }
    }

    pub fn is_audio_only(&self) -> bool {
        self.kind == MediaKind::Audio
    }
}

/// Title and id of the looked-up video
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
}

/// Result of one catalog lookup. Built fresh per request, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub metadata: VideoMetadata,
    pub streams: Vec<StreamDescriptor>,
}

impl Catalog {
    pub fn audio_streams(&self) -> Vec<StreamDescriptor> {
        self.streams
            .iter()
            .filter(|s| s.is_audio_only())
            .cloned()
            .collect()
    }
}

/// One entry of the quality ladder shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityOption {
    /// Display label (e.g. "720p")
    pub label: String,
    pub descriptor: StreamDescriptor,
}
