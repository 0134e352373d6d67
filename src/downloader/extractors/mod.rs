// Stream resolution via yt-dlp
//
// Two modes:
// - Python mode: `python3 -m yt_dlp` (better for YouTube, avoids bot detection)
// - CLI mode: native `yt-dlp` binary (faster, no Python dependency)
//
// The orchestrator picks the mode per URL and falls back once in auto mode.

mod cli;
mod diagnostics;
mod orchestrator;
mod parse;
mod python;
mod traits;

pub use cli::CliInfoExtractor;
pub use diagnostics::{diagnose_error, BlockingReason};
pub use orchestrator::InfoExtractorOrchestrator;
pub use python::PythonInfoExtractor;
pub use traits::{is_youtube_url, ExtractorConfig, ExtractorMode, StreamResolver};
