// In-process stand-ins for the resolver, fetcher and muxer

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use super::errors::DownloadError;
use super::extractors::StreamResolver;
use super::fetcher::StreamFetcher;
use super::models::{OutputArtifact, ResolvedMedia, StreamDescriptor, StreamKind};
use super::muxer::{CodecPair, Muxer};

pub fn video(format_id: &str, resolution: &str) -> StreamDescriptor {
    StreamDescriptor {
        format_id: format_id.to_string(),
        resolution: Some(resolution.to_string()),
        mime_type: "video/mp4".to_string(),
        ext: "mp4".to_string(),
        abr: None,
        tbr: Some(1000.0),
        kind: StreamKind::VideoOnly,
        url: format!("https://media.invalid/{}", format_id),
        http_headers: HashMap::new(),
    }
}

pub fn audio(format_id: &str) -> StreamDescriptor {
    StreamDescriptor {
        format_id: format_id.to_string(),
        resolution: None,
        mime_type: "audio/mp4".to_string(),
        ext: "m4a".to_string(),
        abr: Some(128.0),
        tbr: Some(128.0),
        kind: StreamKind::AudioOnly,
        url: format!("https://media.invalid/{}", format_id),
        http_headers: HashMap::new(),
    }
}

/// 480p/720p/1080p video-only plus one audio-only stream
pub fn sample_media() -> ResolvedMedia {
    ResolvedMedia {
        id: "abc123".to_string(),
        title: "Sample Clip".to_string(),
        streams: vec![
            video("135", "480p"),
            video("136", "720p"),
            audio("140"),
            video("137", "1080p"),
        ],
    }
}

pub struct FakeResolver {
    result: Result<ResolvedMedia, DownloadError>,
    available: bool,
    pub calls: Arc<AtomicUsize>,
}

impl FakeResolver {
    pub fn ok(media: ResolvedMedia) -> Self {
        Self {
            result: Ok(media),
            available: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(DownloadError::Resolution(message.to_string())),
            available: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::failing("unavailable")
        }
    }
}

#[async_trait]
impl StreamResolver for FakeResolver {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn resolve(&self, _url: &str) -> Result<ResolvedMedia, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Read the artifact's file to the end, then release its scratch directory
pub async fn read_artifact(artifact: OutputArtifact) -> Vec<u8> {
    let (mut file, _dir) = artifact.content.into_parts();
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).await.unwrap();
    bytes
}

/// Writes `"<format_id>;"` to the destination, or fails for one format ID
#[derive(Default)]
pub struct FakeFetcher {
    fail_format: Option<String>,
    pub fetched: Arc<std::sync::Mutex<Vec<String>>>,
}

impl FakeFetcher {
    pub fn failing_on(format_id: &str) -> Self {
        Self {
            fail_format: Some(format_id.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl StreamFetcher for FakeFetcher {
    async fn fetch(&self, stream: &StreamDescriptor, dest: &Path) -> Result<u64, DownloadError> {
        if self.fail_format.as_deref() == Some(stream.format_id.as_str()) {
            return Err(DownloadError::Fetch(format!(
                "format {}: server answered 403 Forbidden",
                stream.format_id
            )));
        }
        let body = format!("{};", stream.format_id);
        tokio::fs::write(dest, &body)
            .await
            .map_err(|e| DownloadError::Fetch(e.to_string()))?;
        self.fetched.lock().unwrap().push(stream.format_id.clone());
        Ok(body.len() as u64)
    }
}

/// Concatenates video and audio into the output, optionally after a delay
#[derive(Default)]
pub struct FakeMuxer {
    fail: bool,
    delay: Option<Duration>,
    pub last_codecs: Arc<std::sync::Mutex<Option<CodecPair>>>,
}

impl FakeMuxer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Muxer for FakeMuxer {
    async fn mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        codecs: &CodecPair,
    ) -> Result<(), DownloadError> {
        *self.last_codecs.lock().unwrap() = Some(codecs.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(DownloadError::Mux(
                "ffmpeg exited with exit status: 1: Invalid data found when processing input"
                    .to_string(),
            ));
        }
        let mut bytes = tokio::fs::read(video)
            .await
            .map_err(|e| DownloadError::Mux(e.to_string()))?;
        bytes.extend(
            tokio::fs::read(audio)
                .await
                .map_err(|e| DownloadError::Mux(e.to_string()))?,
        );
        tokio::fs::write(output, bytes)
            .await
            .map_err(|e| DownloadError::Mux(e.to_string()))
    }
}
