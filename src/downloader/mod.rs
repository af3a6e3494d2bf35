// Downloader module - format selection, fetch, scratch storage and mux

pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod mux;
pub mod orchestrator;
pub mod storage;
pub mod token;
pub mod traits;
pub mod utils;

pub use errors::{PipelineError, PipelineResult, StreamRole};
pub use extractors::{ExtractorConfig, YtDlpSource};
pub use format_selector::FormatSelector;
pub use models::{Catalog, MediaKind, QualityOption, StreamDescriptor, VideoMetadata, VideoReference};
pub use mux::FfmpegMuxer;
pub use orchestrator::{DownloadOrchestrator, DownloadReport, DownloadState};
pub use storage::{Artifact, TempStore};
pub use traits::{ByteStream, MediaSource, Muxer};
