// Common data models for the download pipeline

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DownloadError;
use super::scratch::ScratchFile;

/// Caller-facing quality label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QualityTier {
    #[serde(rename = "144p")]
    P144,
    #[serde(rename = "240p")]
    P240,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "480p")]
    P480,
    #[default]
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    /// 2K
    #[serde(rename = "1440p")]
    P1440,
    /// 4K
    #[serde(rename = "2160p")]
    P2160,
}

impl QualityTier {
    pub const ALL: [QualityTier; 8] = [
        Self::P144,
        Self::P240,
        Self::P360,
        Self::P480,
        Self::P720,
        Self::P1080,
        Self::P1440,
        Self::P2160,
    ];

    /// Label as the caller writes it (also used in the output filename)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P144 => "144p",
            Self::P240 => "240p",
            Self::P360 => "360p",
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
            Self::P1440 => "1440p",
            Self::P2160 => "2160p",
        }
    }

    /// Resolution label the resolver reports for streams of this tier
    pub fn resolution_label(&self) -> &'static str {
        // yt-dlp labels match the caller-facing spelling
        self.as_str()
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| DownloadError::InvalidRequest("Invalid quality parameter".to_string()))
    }
}

/// Validated input of one download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: QualityTier,
}

impl DownloadRequest {
    /// Validate raw query parameters. Pure: no network, no filesystem.
    pub fn validate(url: Option<&str>, quality: Option<&str>) -> Result<Self, DownloadError> {
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| DownloadError::InvalidRequest("Missing URL parameter".to_string()))?;

        let quality = match quality {
            Some(q) => q.parse()?,
            None => QualityTier::default(),
        };

        Ok(Self {
            url: url.to_string(),
            quality,
        })
    }
}

/// Which tracks a stream carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    VideoOnly,
    AudioOnly,
    /// Progressive stream with both tracks; never selected
    Combined,
}

/// One encoded track as reported by the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Resolver format ID (e.g. "137", "140")
    pub format_id: String,
    /// Resolution label (e.g. "1080p"); None for audio
    pub resolution: Option<String>,
    /// e.g. "video/mp4", "audio/webm"
    pub mime_type: String,
    /// Container extension (mp4, webm, m4a)
    pub ext: String,
    /// Audio bitrate in kbps
    pub abr: Option<f32>,
    /// Total bitrate in kbps
    pub tbr: Option<f32>,
    pub kind: StreamKind,
    /// Direct media locator
    pub url: String,
    /// Headers the locator requires (user agent, referer...)
    #[serde(default)]
    pub http_headers: HashMap<String, String>,
}

impl StreamDescriptor {
    /// Numeric part of the resolution label ("1080p" -> 1080)
    pub fn resolution_value(&self) -> Option<u32> {
        self.resolution
            .as_deref()
            .and_then(|r| r.trim_end_matches('p').parse().ok())
    }

    pub fn is_video_only(&self) -> bool {
        self.kind == StreamKind::VideoOnly
    }

    pub fn is_audio_only(&self) -> bool {
        self.kind == StreamKind::AudioOnly
    }
}

/// Result of the resolver: title plus available streams in resolver order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedMedia {
    pub id: String,
    pub title: String,
    pub streams: Vec<StreamDescriptor>,
}

/// Chosen video and audio stream; both optional until the fallback ran
#[derive(Debug, Clone, Default)]
pub struct SelectionResult<'a> {
    pub video: Option<&'a StreamDescriptor>,
    pub audio: Option<&'a StreamDescriptor>,
}

impl<'a> SelectionResult<'a> {
    /// Both streams, or `NoStreamAvailable`
    pub fn require_both(
        self,
    ) -> Result<(&'a StreamDescriptor, &'a StreamDescriptor), DownloadError> {
        match (self.video, self.audio) {
            (Some(video), Some(audio)) => Ok((video, audio)),
            _ => Err(DownloadError::NoStreamAvailable),
        }
    }
}

/// Final combined file, still open inside its scratch directory
#[derive(Debug)]
pub struct OutputArtifact {
    pub title: String,
    pub quality: QualityTier,
    pub content: ScratchFile,
}

impl OutputArtifact {
    /// Suggested download name: "{title}_{tier}.mp4"
    pub fn file_name(&self) -> String {
        format!("{}_{}.mp4", self.title, self.quality)
    }
}
