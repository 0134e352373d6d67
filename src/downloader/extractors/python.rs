// Python resolver - uses `python3 -m yt_dlp`
//
// Better at getting past YouTube bot detection and works well with cookies.
// Requires Python 3 with the yt_dlp module installed.

use async_trait::async_trait;

use super::parse::parse_json;
use super::traits::{ExtractorConfig, StreamResolver, AVAILABILITY_TIMEOUT_SECS};
use crate::downloader::errors::DownloadError;
use crate::downloader::models::ResolvedMedia;
use crate::downloader::utils::{run_output_with_timeout, summarize_stderr};

/// Python-based resolver using the yt_dlp module
pub struct PythonInfoExtractor {
    python_cmd: String,
    config: ExtractorConfig,
}

impl PythonInfoExtractor {
    pub fn new(python_cmd: impl Into<String>, config: ExtractorConfig) -> Self {
        Self {
            python_cmd: python_cmd.into(),
            config,
        }
    }

    /// Check if yt_dlp module is installed
    async fn has_ytdlp_module(&self) -> bool {
        run_output_with_timeout(
            &self.python_cmd,
            vec!["-c".to_string(), "import yt_dlp".to_string()],
            AVAILABILITY_TIMEOUT_SECS,
        )
        .await
        .map_or(false, |out| out.status.success())
    }

    fn build_args(&self, url: &str) -> Vec<String> {
        let mut args = vec!["-m".to_string(), "yt_dlp".to_string()];
        args.extend(self.config.common_args());
        // Multiple player clients to get past SABR protection
        args.push("--extractor-args".to_string());
        args.push("youtube:player_client=web,web_safari".to_string());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl StreamResolver for PythonInfoExtractor {
    fn name(&self) -> &'static str {
        "python-yt-dlp"
    }

    async fn is_available(&self) -> bool {
        self.has_ytdlp_module().await
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedMedia, DownloadError> {
        let args = self.build_args(url);
        let output = run_output_with_timeout(
            &self.python_cmd,
            args,
            self.config.timeout_seconds as u64,
        )
        .await
        .map_err(DownloadError::Resolution)?;

        if !output.status.success() {
            return Err(DownloadError::Resolution(summarize_stderr(&output.stderr)));
        }

        parse_json(&output.stdout)
    }
}
