// Muxer - combines the video and audio scratch files into one MP4

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;

use super::errors::DownloadError;
use super::utils::{run_output_with_timeout, summarize_stderr};

/// Codecs the combined file is encoded with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecPair {
    pub video: String,
    pub audio: String,
}

impl Default for CodecPair {
    fn default() -> Self {
        Self {
            video: "libx264".to_string(),
            audio: "aac".to_string(),
        }
    }
}

/// Abstraction over the encoder so the pipeline can run without ffmpeg in tests
#[async_trait]
pub trait Muxer: Send + Sync {
    /// Combine the picture track of `video` with the sound track of `audio`
    ///
    /// # Errors
    /// - `DownloadError::Mux` - encoder missing, failed, timed out or wrote nothing
    async fn mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        codecs: &CodecPair,
    ) -> Result<(), DownloadError>;
}

/// ffmpeg subprocess muxer
pub struct FfmpegMuxer {
    ffmpeg_path: String,
    timeout_secs: u64,
}

impl FfmpegMuxer {
    pub fn new(ffmpeg_path: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout_secs,
        }
    }

    fn build_args(video: &Path, audio: &Path, output: &Path, codecs: &CodecPair) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            video.display().to_string(),
            "-i".to_string(),
            audio.display().to_string(),
            // picture from the first input, sound from the second
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-c:v".to_string(),
            codecs.video.clone(),
            "-c:a".to_string(),
            codecs.audio.clone(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.display().to_string(),
        ]
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        codecs: &CodecPair,
    ) -> Result<(), DownloadError> {
        let start_time = Instant::now();
        tracing::info!(
            video = %video.display(),
            audio = %audio.display(),
            video_codec = %codecs.video,
            audio_codec = %codecs.audio,
            "starting ffmpeg mux"
        );

        let args = Self::build_args(video, audio, output, codecs);
        let out = run_output_with_timeout(&self.ffmpeg_path, args, self.timeout_secs)
            .await
            .map_err(DownloadError::Mux)?;

        if !out.status.success() {
            return Err(DownloadError::Mux(format!(
                "ffmpeg exited with {}: {}",
                out.status,
                summarize_stderr(&out.stderr)
            )));
        }

        let size = tokio::fs::metadata(output)
            .await
            .map(|m| m.len())
            .map_err(|e| DownloadError::Mux(format!("ffmpeg produced no output: {}", e)))?;
        if size == 0 {
            return Err(DownloadError::Mux("ffmpeg produced an empty file".to_string()));
        }

        tracing::info!(
            bytes = size,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "ffmpeg mux finished"
        );
        Ok(())
    }
}
