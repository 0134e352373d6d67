// Error types for the download pipeline

use std::time::Duration;

use thiserror::Error;

/// Failure of one pipeline stage.
///
/// Every stage fails fast with one of these; the HTTP layer is the only place
/// that turns them into status codes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DownloadError {
    /// Bad client input (missing URL, unknown quality tier)
    #[error("{0}")]
    InvalidRequest(String),

    /// The resolver could not turn the URL into streams
    #[error("{0}")]
    Resolution(String),

    /// No video-only or no audio-only stream left after fallback
    #[error("No suitable video/audio stream found")]
    NoStreamAvailable,

    /// Downloading one of the selected streams failed
    #[error("{0}")]
    Fetch(String),

    /// ffmpeg could not combine the two streams
    #[error("{0}")]
    Mux(String),

    /// The request-scoped deadline expired
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl DownloadError {
    /// Short stage name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Resolution(_) => "resolution",
            Self::NoStreamAvailable => "no_stream_available",
            Self::Fetch(_) => "fetch",
            Self::Mux(_) => "mux",
            Self::Timeout(_) => "timeout",
        }
    }

    /// The media itself could not be found or used; reported as 404, logged at warn.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Resolution(_) | Self::NoStreamAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_passes_details_through() {
        let err = DownloadError::Fetch("connection reset".to_string());
        assert_eq!(err.to_string(), "connection reset");
        assert_eq!(err.kind(), "fetch");
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(DownloadError::Timeout(Duration::from_secs(30)).to_string(), "timed out after 30s");
        assert_eq!(
            DownloadError::Timeout(Duration::from_millis(500)).to_string(),
            "timed out after 500ms"
        );
    }

    #[test]
    fn test_not_found_covers_resolution_and_selection() {
        assert!(DownloadError::Resolution("x".into()).is_not_found());
        assert!(DownloadError::NoStreamAvailable.is_not_found());
        assert!(!DownloadError::InvalidRequest("x".into()).is_not_found());
        assert!(!DownloadError::Mux("x".into()).is_not_found());
    }
}
