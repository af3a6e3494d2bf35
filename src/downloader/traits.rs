// Capability traits the download pipeline is built on

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use std::path::Path;
use std::pin::Pin;

use super::errors::PipelineError;
use super::models::{Catalog, StreamDescriptor, VideoReference};

/// Body of one opened stream
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Remote media source: catalog lookup plus stream access.
///
/// Both calls are single attempts. Implementations must not retry and must
/// not return partial catalogs.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Name of the source (for logging)
    fn name(&self) -> &'static str;

    /// Look up every stream descriptor of a video.
    /// Fails with `CatalogUnavailable`.
    async fn lookup(&self, reference: &VideoReference) -> Result<Catalog, PipelineError>;

    /// Open one descriptor for reading.
    ///
    /// The caller knows which role the stream plays and turns the error
    /// into `StreamUnavailable`.
    async fn open(&self, descriptor: &StreamDescriptor) -> Result<ByteStream, std::io::Error>;
}

/// Combines a video-only file and an audio-only file into one container.
#[async_trait]
pub trait Muxer: Send + Sync {
    /// Name of the muxer (for logging)
    fn name(&self) -> &'static str;

    /// Copy the video stream, encode audio to the target codec, write `output`.
    /// Inputs are complete local files. Fails with `MuxFailed`.
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), PipelineError>;
}
