// Server configuration - command-line flags with environment overrides

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::downloader::{ExtractorConfig, ExtractorMode};
use crate::tracing_setup::CliLogLevel;

const APP_DIR_NAME: &str = "yt-mux-server";

/// HTTP service that downloads a YouTube video at a chosen quality
#[derive(Debug, Clone, Parser)]
#[command(name = "yt-mux-server", version, about)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "YT_MUX_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "YT_MUX_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Root for per-request scratch directories
    #[arg(long, env = "YT_MUX_SCRATCH_DIR", default_value_os_t = default_scratch_dir())]
    pub scratch_dir: PathBuf,

    /// Deadline for a whole download request, in seconds
    #[arg(long, env = "YT_MUX_REQUEST_TIMEOUT", default_value_t = 600)]
    pub request_timeout: u64,

    /// Deadline for one yt-dlp call, in seconds
    #[arg(long, env = "YT_MUX_RESOLVE_TIMEOUT", default_value_t = 60)]
    pub resolve_timeout: u32,

    /// Which yt-dlp flavour resolves streams
    #[arg(long, env = "YT_MUX_EXTRACTOR_MODE", value_enum, default_value_t = ExtractorMode::Auto)]
    pub extractor_mode: ExtractorMode,

    /// yt-dlp binary (auto-detected when unset)
    #[arg(long, env = "YTDLP_PATH")]
    pub ytdlp_path: Option<String>,

    /// Python interpreter with the yt_dlp module (auto-detected when unset)
    #[arg(long = "python", env = "YTDLP_PYTHON")]
    pub python: Option<String>,

    /// ffmpeg binary (auto-detected when unset)
    #[arg(long, env = "FFMPEG_PATH")]
    pub ffmpeg_path: Option<String>,

    /// Proxy for yt-dlp and media downloads (http://, https:// or socks5://)
    #[arg(long, env = "YT_MUX_PROXY")]
    pub proxy: Option<String>,

    /// Netscape cookies file handed to yt-dlp
    #[arg(long, env = "YT_MUX_COOKIES")]
    pub cookies: Option<String>,

    /// Console log level; RUST_LOG overrides it
    #[arg(long, env = "YT_MUX_LOG", value_enum, default_value_t = CliLogLevel::Info)]
    pub log_level: CliLogLevel,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig::default()
            .with_mode(self.extractor_mode)
            .with_proxy(self.proxy.clone())
            .with_cookies_path(self.cookies.clone())
            .with_timeout(self.resolve_timeout)
    }
}

/// `<cache dir>/yt-mux-server`, or under the system temp dir when there is no cache dir
fn default_scratch_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["yt-mux-server"]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.request_timeout(), Duration::from_secs(600));
        assert_eq!(config.extractor_mode, ExtractorMode::Auto);
        assert!(config.scratch_dir.ends_with(APP_DIR_NAME));
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "yt-mux-server",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--extractor-mode",
            "cli",
            "--proxy",
            "socks5://127.0.0.1:1080",
            "--resolve-timeout",
            "30",
        ])
        .unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        let extractor = config.extractor_config();
        assert_eq!(extractor.mode, ExtractorMode::Cli);
        assert_eq!(extractor.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert_eq!(extractor.timeout_seconds, 30);
    }

    #[test]
    fn test_invalid_mode_rejected() {
        assert!(ServerConfig::try_parse_from(["yt-mux-server", "--extractor-mode", "magic"]).is_err());
    }
}
