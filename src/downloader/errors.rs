// Error types for the download pipeline

use std::fmt;
use thiserror::Error;

/// Which of the (up to two) fetches of a request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRole {
    Video,
    Audio,
}

impl fmt::Display for StreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Every way a single request can fail.
///
/// None of these escape the request dispatcher; each one is turned into a
/// short chat message by [`PipelineError::user_message`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Catalog lookup failed (network, remote error, unparsable output)
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// A descriptor could not be opened for reading
    #[error("{role} stream unavailable: {reason}")]
    StreamUnavailable { role: StreamRole, reason: String },

    /// The ladder reduced to zero options
    #[error("no video formats found")]
    NoFormatsFound,

    /// A video-only stream was chosen but the catalog has no audio stream
    #[error("no audio stream in catalog")]
    NoAudioAvailable,

    /// Copying a stream into its scratch file failed
    #[error("failed to write {role} artifact: {source}")]
    WriteError {
        role: StreamRole,
        #[source]
        source: std::io::Error,
    },

    /// The muxer could not be started or exited non-zero
    #[error("mux failed: {0}")]
    MuxFailed(String),

    /// Selection token could not be decoded
    #[error("malformed selection token: {0}")]
    MalformedToken(String),

    /// Decoded index is out of bounds of a freshly built ladder
    #[error("stale selection: index {index} but only {available} options")]
    StaleSelection { index: usize, available: usize },

    /// Final media send failed
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
}

impl PipelineError {
    /// Short text sent back to the chat. One distinct text per failure kind.
    pub fn user_message(&self) -> String {
        match self {
            Self::CatalogUnavailable(_) => "Could not fetch video info".to_string(),
            Self::StreamUnavailable { role, .. } => format!("{} download failed", capitalize(role)),
            Self::NoFormatsFound => "No available formats".to_string(),
            Self::NoAudioAvailable => "No audio track available for this video".to_string(),
            Self::WriteError { role, .. } => format!("Could not save the {} stream", role),
            Self::MuxFailed(_) => "Merge failed".to_string(),
            Self::MalformedToken(_) => "Could not process selection".to_string(),
            Self::StaleSelection { .. } => {
                "Could not process selection: the format list changed, send the link again"
                    .to_string()
            }
            Self::DeliveryFailed(_) => "Could not send the video".to_string(),
        }
    }
}

fn capitalize(role: &StreamRole) -> &'static str {
    match role {
        StreamRole::Video => "Video",
        StreamRole::Audio => "Audio",
    }
}
