// Fetcher - downloads selected streams into scratch files
//
// YouTube throttles plain GETs on adaptive streams, so media is pulled with
// `Range` requests of `chunk_size` bytes. Servers that ignore the range and
// answer 200 are read to the end in one go, replacing any partial chunks.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::StatusCode;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use super::errors::DownloadError;
use super::models::StreamDescriptor;

/// Default range size, same as yt-dlp's YouTube chunking
pub const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

/// Downloads one stream to a local file
#[async_trait]
pub trait StreamFetcher: Send + Sync {
    /// Write the stream's bytes to `dest`; returns bytes written
    async fn fetch(&self, stream: &StreamDescriptor, dest: &Path) -> Result<u64, DownloadError>;
}

/// reqwest-based fetcher
pub struct HttpStreamFetcher {
    client: reqwest::Client,
    chunk_size: u64,
}

impl HttpStreamFetcher {
    /// Build a client, routed through `proxy` when given
    pub fn new(proxy: Option<&str>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .read_timeout(Duration::from_secs(60));

        if let Some(proxy_url) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn request(&self, stream: &StreamDescriptor, start: u64) -> reqwest::RequestBuilder {
        let end = start + self.chunk_size - 1;
        let mut request = self.client.get(&stream.url);
        for (name, value) in &stream.http_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request.header(RANGE, format!("bytes={}-{}", start, end))
    }
}

#[async_trait]
impl StreamFetcher for HttpStreamFetcher {
    async fn fetch(&self, stream: &StreamDescriptor, dest: &Path) -> Result<u64, DownloadError> {
        let fail = |what: String| DownloadError::Fetch(format!("format {}: {}", stream.format_id, what));

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| fail(format!("cannot create {}: {}", dest.display(), e)))?;

        let mut written: u64 = 0;
        let mut total: Option<u64> = None;

        loop {
            let response = self
                .request(stream, written)
                .send()
                .await
                .map_err(|e| fail(format!("request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(fail(format!("server answered {}", status)));
            }

            let ranged = status == StatusCode::PARTIAL_CONTENT;
            if ranged && total.is_none() {
                total = response
                    .headers()
                    .get(CONTENT_RANGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_content_range_total);
            } else if !ranged {
                total = response.content_length();
                if written > 0 {
                    tracing::debug!(
                        format_id = %stream.format_id,
                        discarded = written,
                        "range ignored mid-download, restarting from the full body"
                    );
                    file.set_len(0)
                        .await
                        .map_err(|e| fail(format!("truncate of {} failed: {}", dest.display(), e)))?;
                    file.seek(std::io::SeekFrom::Start(0))
                        .await
                        .map_err(|e| fail(format!("seek in {} failed: {}", dest.display(), e)))?;
                    written = 0;
                }
            }

            let mut body = response.bytes_stream();
            let mut received: u64 = 0;
            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(|e| fail(format!("transfer interrupted: {}", e)))?;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| fail(format!("write to {} failed: {}", dest.display(), e)))?;
                received += chunk.len() as u64;
            }
            written += received;

            let done = match total {
                Some(total) => written >= total,
                // No size information: a short or empty range means the end
                None => received < self.chunk_size,
            };
            if !ranged || done || received == 0 {
                break;
            }
        }

        file.flush()
            .await
            .map_err(|e| fail(format!("flush of {} failed: {}", dest.display(), e)))?;

        if let Some(total) = total {
            if written < total {
                return Err(fail(format!("truncated transfer ({} of {} bytes)", written, total)));
            }
        }
        if written == 0 {
            return Err(fail("empty response body".to_string()));
        }

        tracing::debug!(format_id = %stream.format_id, bytes = written, "stream fetched");
        Ok(written)
    }
}

/// Total size from a `Content-Range: bytes 0-99/1234` header
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}
