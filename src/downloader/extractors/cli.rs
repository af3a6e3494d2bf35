// yt-dlp backed media source
//
// Catalog: `yt-dlp --dump-json` on the reference, `formats` array mapped to
// stream descriptors. Streams: plain HTTP GET on each format's direct URL
// with the headers yt-dlp reports for it.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::io;

use super::config::ExtractorConfig;
use crate::downloader::errors::PipelineError;
use crate::downloader::models::{
    Catalog, FetchHandle, MediaKind, StreamDescriptor, VideoMetadata, VideoReference,
};
use crate::downloader::traits::{ByteStream, MediaSource};
use crate::downloader::utils::{run_output, stderr_tail};

/// Protocols whose `url` is the complete stream
const DIRECT_PROTOCOLS: [&str; 2] = ["https", "http"];

/// CLI-based media source using the yt-dlp binary
pub struct YtDlpSource {
    config: ExtractorConfig,
    http: reqwest::Client,
}

impl YtDlpSource {
    pub fn new(config: ExtractorConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            config,
            http: builder.build()?,
        })
    }

    /// Build command arguments
    fn build_args(&self, reference: &VideoReference) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.config.timeout_seconds.to_string(),
        ];

        if let Some(path) = &self.config.cookies_path {
            args.push("--cookies".to_string());
            args.push(path.clone());
        }

        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        // keep references starting with '-' from being read as options
        args.push("--".to_string());
        args.push(reference.as_str().to_string());
        args
    }

    /// Parse JSON output into a catalog
    fn parse_json(stdout: &[u8]) -> Result<Catalog, PipelineError> {
        let json: Value = serde_json::from_slice(stdout)
            .map_err(|e| PipelineError::CatalogUnavailable(format!("Invalid JSON: {}", e)))?;

        let streams = Self::parse_formats(&json)?;

        Ok(Catalog {
            metadata: VideoMetadata {
                id: json["id"].as_str().unwrap_or("video").to_string(),
                title: json["title"].as_str().unwrap_or("").to_string(),
            },
            streams,
        })
    }

    fn parse_formats(json: &Value) -> Result<Vec<StreamDescriptor>, PipelineError> {
        let formats_array = json["formats"].as_array().ok_or_else(|| {
            PipelineError::CatalogUnavailable("No formats array in JSON".to_string())
        })?;

        Ok(formats_array.iter().filter_map(Self::parse_format).collect())
    }

    /// One `formats` entry; `None` for entries that cannot be fetched with a
    /// single request (manifests, storyboards, missing URL).
    fn parse_format(f: &Value) -> Option<StreamDescriptor> {
        let url = f["url"].as_str()?;
        let protocol = f["protocol"].as_str().unwrap_or("https");
        if !DIRECT_PROTOCOLS.contains(&protocol) {
            return None;
        }

        let has_video = f["vcodec"].as_str().map_or(false, |v| v != "none");
        let has_audio = f["acodec"].as_str().map_or(false, |a| a != "none");
        let kind = match (has_video, has_audio) {
            (true, true) => MediaKind::Combined,
            (true, false) => MediaKind::Video,
            (false, true) => MediaKind::Audio,
            (false, false) => return None,
        };

        // video without a usable height cannot be placed on the ladder
        let height = match kind {
            MediaKind::Audio => 0,
            _ => f["height"]
                .as_u64()
                .and_then(|h| u32::try_from(h).ok())
                .filter(|h| *h > 0)?,
        };
        let bitrate = match kind {
            MediaKind::Video => 0,
            _ => f["abr"]
                .as_f64()
                .or_else(|| f["tbr"].as_f64())
                .map_or(0, |b| b.round() as u32),
        };

        let http_headers: HashMap<String, String> = f["http_headers"]
            .as_object()
            .map(|headers| {
                headers
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Some(StreamDescriptor {
            kind,
            container: f["ext"].as_str().unwrap_or("").to_string(),
            height,
            bitrate,
            audio_channels: f["audio_channels"]
                .as_u64()
                .and_then(|c| u32::try_from(c).ok())
                .unwrap_or(0),
            handle: FetchHandle {
                format_id: f["format_id"].as_str().unwrap_or("").to_string(),
                url: url.to_string(),
                http_headers,
            },
        })
    }
}

#[async_trait]
impl MediaSource for YtDlpSource {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    async fn lookup(&self, reference: &VideoReference) -> Result<Catalog, PipelineError> {
        let args = self.build_args(reference);
        tracing::debug!(
            "[YtDlpSource] Running: {} {}",
            self.config.ytdlp_path,
            args.join(" ")
        );

        let output = run_output(&self.config.ytdlp_path, args)
            .await
            .map_err(PipelineError::CatalogUnavailable)?;

        if !output.status.success() {
            return Err(PipelineError::CatalogUnavailable(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr, 3)
            )));
        }

        let catalog = Self::parse_json(&output.stdout)?;
        tracing::info!(
            "[YtDlpSource] {} ({}): {} streams",
            catalog.metadata.id,
            catalog.metadata.title,
            catalog.streams.len()
        );
        Ok(catalog)
    }

    async fn open(&self, descriptor: &StreamDescriptor) -> Result<ByteStream, io::Error> {
        let mut request = self.http.get(&descriptor.handle.url);
        for (name, value) in &descriptor.handle.http_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(io::Error::other)?;

        let stream = response.bytes_stream().map_err(io::Error::other);
        Ok(Box::pin(stream))
    }
}
