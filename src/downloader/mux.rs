// ffmpeg-backed muxer
//
// Video is stream-copied, audio is re-encoded to one fixed codec. Inputs must
// be complete local files since ffmpeg needs to seek.

use async_trait::async_trait;
use std::path::Path;

use super::errors::PipelineError;
use super::traits::Muxer;
use super::utils::{run_output, stderr_tail};

/// Default audio codec for muxed output
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

pub struct FfmpegMuxer {
    ffmpeg_path: String,
    audio_codec: String,
}

impl FfmpegMuxer {
    pub fn new(ffmpeg_path: impl Into<String>, audio_codec: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            audio_codec: audio_codec.into(),
        }
    }

    /// Build command arguments
    fn build_args(&self, video: &Path, audio: &Path, output: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            // output file already exists as an empty scratch file
            "-y".to_string(),
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-i".to_string(),
            audio.to_string_lossy().into_owned(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self::new("ffmpeg", DEFAULT_AUDIO_CODEC)
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), PipelineError> {
        let args = self.build_args(video, audio, output);
        tracing::debug!("[FfmpegMuxer] Running: {} {}", self.ffmpeg_path, args.join(" "));

        let out = run_output(&self.ffmpeg_path, args)
            .await
            .map_err(PipelineError::MuxFailed)?;

        if !out.status.success() {
            return Err(PipelineError::MuxFailed(format!(
                "{} exited with {}: {}",
                self.ffmpeg_path,
                out.status,
                stderr_tail(&out.stderr, 5)
            )));
        }

        Ok(())
    }
}
