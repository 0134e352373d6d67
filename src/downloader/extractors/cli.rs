// CLI resolver - uses native `yt-dlp` binary
//
// Faster than Python mode and has no Python dependency, but more likely to
// trigger YouTube bot detection, so for YouTube several player clients are
// tried in turn.

use async_trait::async_trait;

use super::parse::parse_json;
use super::traits::{is_youtube_url, ExtractorConfig, StreamResolver, AVAILABILITY_TIMEOUT_SECS};
use crate::downloader::errors::DownloadError;
use crate::downloader::models::ResolvedMedia;
use crate::downloader::utils::{run_output_with_timeout, summarize_stderr};

/// CLI-based resolver using the yt-dlp binary
pub struct CliInfoExtractor {
    ytdlp_path: String,
    config: ExtractorConfig,
}

impl CliInfoExtractor {
    pub fn new(ytdlp_path: impl Into<String>, config: ExtractorConfig) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            config,
        }
    }

    /// Check if yt-dlp binary runs
    async fn has_ytdlp_binary(&self) -> bool {
        run_output_with_timeout(
            &self.ytdlp_path,
            vec!["--version".to_string()],
            AVAILABILITY_TIMEOUT_SECS,
        )
        .await
        .map_or(false, |out| out.status.success())
    }

    fn build_args(&self, url: &str, client: Option<&str>) -> Vec<String> {
        let mut args = self.config.common_args();

        if let Some(client) = client {
            args.push("--extractor-args".to_string());
            args.push(format!("youtube:player_client={}", client));
        }

        args.push(url.to_string());
        args
    }

    /// Player clients to try; android is less likely to be blocked, web
    /// handles cookies and age-gated content
    fn clients_for(&self, url: &str) -> Vec<Option<&'static str>> {
        if !is_youtube_url(url) {
            return vec![None];
        }
        if self.config.cookies_path.is_some() {
            vec![Some("web"), Some("android")]
        } else {
            vec![Some("android"), Some("tv"), Some("web")]
        }
    }
}

#[async_trait]
impl StreamResolver for CliInfoExtractor {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    async fn is_available(&self) -> bool {
        self.has_ytdlp_binary().await
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedMedia, DownloadError> {
        let mut last_error = DownloadError::Resolution("No clients to try".to_string());

        for client in self.clients_for(url) {
            let args = self.build_args(url, client);
            tracing::debug!(
                extractor = self.name(),
                client = client.unwrap_or("default"),
                "trying yt-dlp client"
            );

            let output = run_output_with_timeout(
                &self.ytdlp_path,
                args,
                self.config.timeout_seconds as u64,
            )
            .await;

            match output {
                Ok(out) if out.status.success() => {
                    tracing::debug!(extractor = self.name(), client = client.unwrap_or("default"), "resolved");
                    return parse_json(&out.stdout);
                }
                Ok(out) => {
                    let stderr = summarize_stderr(&out.stderr);
                    tracing::debug!(
                        extractor = self.name(),
                        client = client.unwrap_or("default"),
                        %stderr,
                        "client failed"
                    );
                    last_error = DownloadError::Resolution(stderr);
                }
                Err(e) => {
                    tracing::debug!(extractor = self.name(), error = %e, "yt-dlp did not run");
                    last_error = DownloadError::Resolution(e);
                }
            }
        }

        Err(last_error)
    }
}
