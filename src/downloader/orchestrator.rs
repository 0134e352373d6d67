// Pipeline orchestrator: resolve -> select -> fetch -> mux -> open output

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;
use uuid::Uuid;

use super::errors::DownloadError;
use super::extractors::StreamResolver;
use super::fetcher::StreamFetcher;
use super::format_selector::FormatSelector;
use super::models::{DownloadRequest, OutputArtifact};
use super::muxer::{CodecPair, Muxer};
use super::scratch::{ScratchDir, ScratchFile};
use super::utils::sanitize_filename;

/// Default request deadline in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;

pub struct Downloader {
    resolver: Arc<dyn StreamResolver>,
    fetcher: Arc<dyn StreamFetcher>,
    muxer: Arc<dyn Muxer>,
    scratch_root: PathBuf,
    codecs: CodecPair,
    request_timeout: Duration,
}

impl Downloader {
    pub fn new(
        resolver: Arc<dyn StreamResolver>,
        fetcher: Arc<dyn StreamFetcher>,
        muxer: Arc<dyn Muxer>,
        scratch_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            muxer,
            scratch_root: scratch_root.into(),
            codecs: CodecPair::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_codecs(mut self, codecs: CodecPair) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Run the whole pipeline for one request.
    ///
    /// On failure, timeout or cancellation the scratch directory is removed
    /// before this returns. On success it is owned by the artifact and goes
    /// away when the artifact (or the response body built from it) is dropped.
    pub async fn download(&self, request: &DownloadRequest) -> Result<OutputArtifact, DownloadError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "download",
            %request_id,
            url = %request.url,
            quality = %request.quality
        );

        async move {
            let start_time = Instant::now();
            let result = match tokio::time::timeout(self.request_timeout, self.run(request_id, request)).await {
                Ok(result) => result,
                Err(_) => Err(DownloadError::Timeout(self.request_timeout)),
            };

            let elapsed_ms = start_time.elapsed().as_millis() as u64;
            match &result {
                Ok(artifact) => tracing::info!(bytes = artifact.content.size(), elapsed_ms, "download finished"),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(kind = e.kind(), error = %e, elapsed_ms, "download failed")
                }
                Err(e) => tracing::error!(kind = e.kind(), error = %e, elapsed_ms, "download failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request_id: Uuid, request: &DownloadRequest) -> Result<OutputArtifact, DownloadError> {
        let scratch = ScratchDir::create(&self.scratch_root, request_id)
            .await
            .map_err(|e| DownloadError::Fetch(format!("cannot create scratch directory: {}", e)))?;

        let media = self.resolver.resolve(&request.url).await?;

        let (video, audio) = FormatSelector::select(&media.streams, request.quality).require_both()?;
        tracing::info!(
            video_format = %video.format_id,
            video_resolution = video.resolution.as_deref().unwrap_or("unknown"),
            video_mime = %video.mime_type,
            audio_format = %audio.format_id,
            audio_mime = %audio.mime_type,
            audio_abr = audio.abr.unwrap_or_default() as f64,
            "streams selected"
        );

        let video_path = scratch.video_file(&video.ext);
        let audio_path = scratch.audio_file(&audio.ext);
        let (video_bytes, audio_bytes) = tokio::try_join!(
            self.fetcher.fetch(video, &video_path),
            self.fetcher.fetch(audio, &audio_path)
        )?;
        tracing::debug!(video_bytes, audio_bytes, "streams fetched");

        let combined = scratch.combined_file();
        self.muxer.mux(&video_path, &audio_path, &combined, &self.codecs).await?;

        let content = ScratchFile::open(scratch, &combined)
            .await
            .map_err(|e| DownloadError::Mux(format!("cannot open combined file: {}", e)))?;

        Ok(OutputArtifact {
            title: sanitize_filename(&media.title),
            quality: request.quality,
            content,
        })
    }
}
