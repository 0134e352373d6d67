// Resolver orchestrator - mode selection and fallback
//
// Strategy:
// 1. For YouTube: Python mode preferred (better anti-bot bypass)
// 2. For other sites: CLI mode preferred (faster)
// 3. In auto mode, one fallback to the other extractor
//
// A missing tool shows up as a spawn error, which is not permanent, so the
// fallback covers it without checking availability per request.

use async_trait::async_trait;

use super::cli::CliInfoExtractor;
use super::diagnostics::diagnose_error;
use super::python::PythonInfoExtractor;
use super::traits::{is_youtube_url, ExtractorConfig, ExtractorMode, StreamResolver};
use crate::downloader::errors::DownloadError;
use crate::downloader::models::ResolvedMedia;

/// Orchestrator that manages Python and CLI extractors
pub struct InfoExtractorOrchestrator {
    mode: ExtractorMode,
    python: Box<dyn StreamResolver>,
    cli: Box<dyn StreamResolver>,
}

impl InfoExtractorOrchestrator {
    pub fn new(python_cmd: String, ytdlp_path: String, config: ExtractorConfig) -> Self {
        Self {
            mode: config.mode,
            python: Box::new(PythonInfoExtractor::new(python_cmd, config.clone())),
            cli: Box::new(CliInfoExtractor::new(ytdlp_path, config)),
        }
    }

    /// Build from arbitrary extractors (tests, alternative backends)
    pub fn with_extractors(
        mode: ExtractorMode,
        python: Box<dyn StreamResolver>,
        cli: Box<dyn StreamResolver>,
    ) -> Self {
        Self { mode, python, cli }
    }

    /// Extractors to try, in order, for this URL
    fn plan(&self, url: &str) -> Vec<&dyn StreamResolver> {
        match self.mode {
            ExtractorMode::Python => vec![self.python.as_ref()],
            ExtractorMode::Cli => vec![self.cli.as_ref()],
            ExtractorMode::Auto if is_youtube_url(url) => {
                vec![self.python.as_ref(), self.cli.as_ref()]
            }
            ExtractorMode::Auto => vec![self.cli.as_ref(), self.python.as_ref()],
        }
    }
}

#[async_trait]
impl StreamResolver for InfoExtractorOrchestrator {
    fn name(&self) -> &'static str {
        "orchestrator"
    }

    async fn is_available(&self) -> bool {
        self.python.is_available().await || self.cli.is_available().await
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedMedia, DownloadError> {
        let mut last_error = None;

        for extractor in self.plan(url) {
            match extractor.resolve(url).await {
                Ok(media) => {
                    tracing::info!(
                        extractor = extractor.name(),
                        title = %media.title,
                        streams = media.streams.len(),
                        "resolved media"
                    );
                    return Ok(media);
                }
                Err(e) => {
                    let reason = diagnose_error(&e.to_string());
                    // Removed or private media will not appear via another extractor
                    let permanent = reason.map_or(false, |r| r.is_permanent());
                    tracing::warn!(
                        extractor = extractor.name(),
                        reason = reason.map_or("none", |r| r.description()),
                        permanent,
                        proxy_might_help = reason.map_or(false, |r| r.proxy_might_help()),
                        error = %e,
                        "extractor failed"
                    );
                    last_error = Some(e);
                    if permanent {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DownloadError::Resolution("No extractor to try".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::fixtures::{sample_media, FakeResolver};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_auto_youtube_prefers_python() {
        let python = FakeResolver::ok(sample_media());
        let cli = FakeResolver::failing("should not run");
        let python_calls = Arc::clone(&python.calls);
        let cli_calls = Arc::clone(&cli.calls);

        let orchestrator = InfoExtractorOrchestrator::with_extractors(
            ExtractorMode::Auto,
            Box::new(python),
            Box::new(cli),
        );
        orchestrator.resolve("https://www.youtube.com/watch?v=x").await.unwrap();

        assert_eq!(python_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cli_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_auto_falls_back_once() {
        let python = FakeResolver::failing("HTTP Error 403: Forbidden");
        let cli = FakeResolver::ok(sample_media());
        let cli_calls = Arc::clone(&cli.calls);

        let orchestrator = InfoExtractorOrchestrator::with_extractors(
            ExtractorMode::Auto,
            Box::new(python),
            Box::new(cli),
        );
        let media = orchestrator.resolve("https://youtu.be/x").await.unwrap();

        assert_eq!(media.title, sample_media().title);
        assert_eq!(cli_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_permanent_failure_skips_fallback() {
        let python = FakeResolver::failing("ERROR: Video unavailable");
        let cli = FakeResolver::ok(sample_media());
        let cli_calls = Arc::clone(&cli.calls);

        let orchestrator = InfoExtractorOrchestrator::with_extractors(
            ExtractorMode::Auto,
            Box::new(python),
            Box::new(cli),
        );
        let err = orchestrator.resolve("https://youtu.be/x").await.unwrap_err();

        assert_eq!(err, DownloadError::Resolution("ERROR: Video unavailable".to_string()));
        assert_eq!(cli_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cli_mode_never_uses_python() {
        let python = FakeResolver::ok(sample_media());
        let cli = FakeResolver::failing("boom");
        let python_calls = Arc::clone(&python.calls);

        let orchestrator = InfoExtractorOrchestrator::with_extractors(
            ExtractorMode::Cli,
            Box::new(python),
            Box::new(cli),
        );
        assert!(orchestrator.resolve("https://youtu.be/x").await.is_err());
        assert_eq!(python_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nothing_available() {
        let orchestrator = InfoExtractorOrchestrator::with_extractors(
            ExtractorMode::Auto,
            Box::new(FakeResolver::unavailable()),
            Box::new(FakeResolver::unavailable()),
        );
        assert!(!orchestrator.is_available().await);
        let err = orchestrator.resolve("https://vimeo.com/1").await.unwrap_err();
        assert!(matches!(err, DownloadError::Resolution(_)));
    }

    #[tokio::test]
    async fn test_missing_tool_falls_back_without_availability_check() {
        // Availability is never consulted while resolving
        let python = FakeResolver::unavailable();
        let python_calls = Arc::clone(&python.calls);
        let cli = FakeResolver::ok(sample_media());

        let orchestrator = InfoExtractorOrchestrator::with_extractors(
            ExtractorMode::Auto,
            Box::new(python),
            Box::new(cli),
        );
        orchestrator.resolve("https://youtu.be/x").await.unwrap();
        assert_eq!(python_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_not_permanent() {
        let python = FakeResolver::failing("Failed to start python3: No such file or directory (os error 2)");
        let cli = FakeResolver::ok(sample_media());
        let cli_calls = Arc::clone(&cli.calls);

        let orchestrator = InfoExtractorOrchestrator::with_extractors(
            ExtractorMode::Auto,
            Box::new(python),
            Box::new(cli),
        );
        orchestrator.resolve("https://youtu.be/x").await.unwrap();
        assert_eq!(cli_calls.load(Ordering::SeqCst), 1);
    }
}
