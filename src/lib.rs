pub mod config;
pub mod downloader;
pub mod server;
pub mod tracing_setup;

use std::sync::Arc;

use config::ServerConfig;
use downloader::tools::{ToolManager, ToolType};
use downloader::{
    prepare_scratch_root, Downloader, FfmpegMuxer, HttpStreamFetcher, InfoExtractorOrchestrator,
    StreamResolver,
};
use server::AppState;

/// Wire the pipeline from the config and serve until Ctrl+C.
///
/// # Errors
///
/// - `Box<dyn std::error::Error>` - scratch root unusable, proxy rejected, or bind failure
pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let removed = prepare_scratch_root(&config.scratch_dir)?;
    tracing::info!(
        scratch_dir = %config.scratch_dir.display(),
        stale_removed = removed,
        "scratch root ready"
    );

    let tools = ToolManager::with_overrides(
        config.ytdlp_path.clone(),
        config.ffmpeg_path.clone(),
        config.python.clone(),
    );
    for tool in tools.get_all_tools() {
        if tool.is_available {
            tracing::info!(
                tool = %tool.name,
                version = tool.version.as_deref().unwrap_or("unknown"),
                path = tool.path.as_deref().unwrap_or(""),
                "tool found"
            );
        } else {
            tracing::warn!(tool = %tool.name, "tool not available");
        }
    }

    let resolver = InfoExtractorOrchestrator::new(
        tools.resolve_path(ToolType::Python),
        tools.resolve_path(ToolType::YtDlp),
        config.extractor_config(),
    );
    if !resolver.is_available().await {
        tracing::warn!("neither python yt_dlp nor the yt-dlp binary runs; downloads will fail");
    }
    let fetcher = HttpStreamFetcher::new(config.proxy.as_deref())?;
    // ffmpeg may run for as long as the request itself is allowed to
    let muxer = FfmpegMuxer::new(tools.resolve_path(ToolType::Ffmpeg), config.request_timeout);

    let downloader = Downloader::new(
        Arc::new(resolver),
        Arc::new(fetcher),
        Arc::new(muxer),
        config.scratch_dir.clone(),
    )
    .with_request_timeout(config.request_timeout());

    let state = AppState {
        downloader: Arc::new(downloader),
        tools: Arc::new(tools),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        mode = %config.extractor_mode,
        "yt-mux-server listening"
    );

    server::serve(listener, state).await?;
    tracing::info!("server stopped");
    Ok(())
}
