// Downloader module - resolve, select, fetch and mux one video per request

pub mod errors;
pub mod extractors;
pub mod fetcher;
pub mod format_selector;
pub mod models;
pub mod muxer;
pub mod orchestrator;
pub mod scratch;
pub mod tools;
pub mod utils;

#[cfg(test)]
pub(crate) mod fixtures;

pub use errors::DownloadError;
pub use extractors::{ExtractorConfig, ExtractorMode, InfoExtractorOrchestrator, StreamResolver};
pub use fetcher::{HttpStreamFetcher, StreamFetcher};
pub use format_selector::FormatSelector;
pub use models::{DownloadRequest, OutputArtifact, QualityTier, ResolvedMedia, StreamDescriptor, StreamKind};
pub use muxer::{CodecPair, FfmpegMuxer, Muxer};
pub use orchestrator::Downloader;
pub use scratch::{prepare_scratch_root, ScratchDir, ScratchFile};
pub use tools::ToolManager;
