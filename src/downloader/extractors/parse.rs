// Parsing of `yt-dlp --dump-json` output into stream descriptors
//
// Shared by the CLI and Python extractors; both print the same JSON.

use std::collections::HashMap;

use regex::Regex;

use crate::downloader::errors::DownloadError;
use crate::downloader::models::{ResolvedMedia, StreamDescriptor, StreamKind};

lazy_static::lazy_static! {
    // "1080p", "1080p60", "720p HDR" -> leading "<digits>p"
    static ref LABEL_RE: Regex = Regex::new(r"^(\d{2,4})p").unwrap();
}

/// Parse full JSON output
pub fn parse_json(stdout: &[u8]) -> Result<ResolvedMedia, DownloadError> {
    let json_str = String::from_utf8_lossy(stdout);
    let json: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| DownloadError::Resolution(format!("Invalid JSON: {}", e)))?;

    let streams = parse_formats(&json)?;

    Ok(ResolvedMedia {
        id: json["id"].as_str().unwrap_or("unknown").to_string(),
        title: json["title"].as_str().unwrap_or("Unknown").to_string(),
        streams,
    })
}

fn parse_formats(json: &serde_json::Value) -> Result<Vec<StreamDescriptor>, DownloadError> {
    let formats_array = json["formats"]
        .as_array()
        .ok_or_else(|| DownloadError::Resolution("No formats array in JSON".to_string()))?;

    Ok(formats_array.iter().filter_map(parse_format).collect())
}

/// One `formats[]` entry, or None when a single GET cannot fetch it
fn parse_format(f: &serde_json::Value) -> Option<StreamDescriptor> {
    let url = f["url"].as_str().filter(|u| !u.is_empty())?;

    let protocol = f["protocol"].as_str().unwrap_or("https");
    if protocol.starts_with("m3u8") || protocol == "http_dash_segments" || protocol == "mhtml" {
        return None;
    }

    let has_video = f["vcodec"].as_str().map_or(false, |v| v != "none" && !v.is_empty());
    let has_audio = f["acodec"].as_str().map_or(false, |a| a != "none" && !a.is_empty());

    let kind = match (has_video, has_audio) {
        (true, false) => StreamKind::VideoOnly,
        (false, true) => StreamKind::AudioOnly,
        (true, true) => StreamKind::Combined,
        // storyboards and other image tracks
        (false, false) => return None,
    };

    let ext = f["ext"].as_str().unwrap_or("mp4").to_string();
    let resolution = if kind == StreamKind::AudioOnly {
        None
    } else {
        resolution_label(f)
    };
    let mime_type = match kind {
        StreamKind::AudioOnly => format!("audio/{}", audio_container(&ext)),
        _ => format!("video/{}", ext),
    };

    let http_headers: HashMap<String, String> = f["http_headers"]
        .as_object()
        .map(|headers| {
            headers
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Some(StreamDescriptor {
        format_id: f["format_id"].as_str().unwrap_or("").to_string(),
        resolution,
        mime_type,
        ext,
        abr: f["abr"].as_f64().map(|a| a as f32),
        tbr: f["tbr"].as_f64().map(|t| t as f32),
        kind,
        url: url.to_string(),
        http_headers,
    })
}

/// Resolution label as YouTube names it ("1080p"), falling back to the height
fn resolution_label(f: &serde_json::Value) -> Option<String> {
    if let Some(caps) = f["format_note"].as_str().and_then(|note| LABEL_RE.captures(note)) {
        return Some(format!("{}p", &caps[1]));
    }
    f["height"].as_u64().map(|h| format!("{}p", h))
}

// m4a audio lives in an mp4 container
fn audio_container(ext: &str) -> &str {
    match ext {
        "m4a" => "mp4",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_output() -> Vec<u8> {
        json!({
            "id": "dQw4w9WgXcQ",
            "title": "Sample Video",
            "formats": [
                {
                    "format_id": "sb0", "ext": "mhtml", "protocol": "mhtml",
                    "vcodec": "none", "acodec": "none", "url": "https://i.ytimg.com/sb"
                },
                {
                    "format_id": "139", "ext": "m4a", "protocol": "https",
                    "vcodec": "none", "acodec": "mp4a.40.5", "abr": 48.8,
                    "url": "https://rr.googlevideo.com/139",
                    "http_headers": {"User-Agent": "Mozilla/5.0", "Accept": "*/*"}
                },
                {
                    "format_id": "18", "ext": "mp4", "protocol": "https",
                    "vcodec": "avc1.42001E", "acodec": "mp4a.40.2",
                    "height": 360, "format_note": "360p",
                    "url": "https://rr.googlevideo.com/18"
                },
                {
                    "format_id": "137", "ext": "mp4", "protocol": "https",
                    "vcodec": "avc1.640028", "acodec": "none",
                    "height": 800, "width": 1920, "format_note": "1080p60",
                    "url": "https://rr.googlevideo.com/137"
                },
                {
                    "format_id": "248", "ext": "webm", "protocol": "https",
                    "vcodec": "vp9", "acodec": "none", "height": 1080,
                    "url": "https://rr.googlevideo.com/248"
                },
                {
                    "format_id": "hls-1080", "ext": "mp4", "protocol": "m3u8_native",
                    "vcodec": "avc1", "acodec": "none", "height": 1080,
                    "url": "https://manifest.googlevideo.com/hls"
                },
                {
                    "format_id": "nourl", "ext": "mp4", "vcodec": "avc1", "acodec": "none"
                }
            ]
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_parse_keeps_resolver_order_and_skips_unfetchable() {
        let media = parse_json(&sample_output()).unwrap();
        assert_eq!(media.id, "dQw4w9WgXcQ");
        assert_eq!(media.title, "Sample Video");

        let ids: Vec<&str> = media.streams.iter().map(|s| s.format_id.as_str()).collect();
        assert_eq!(ids, vec!["139", "18", "137", "248"]);
    }

    #[test]
    fn test_parse_kinds_and_labels() {
        let media = parse_json(&sample_output()).unwrap();
        let by_id = |id: &str| media.streams.iter().find(|s| s.format_id == id).unwrap();

        let audio = by_id("139");
        assert_eq!(audio.kind, StreamKind::AudioOnly);
        assert_eq!(audio.mime_type, "audio/mp4");
        assert_eq!(audio.resolution, None);
        assert_eq!(audio.http_headers.get("User-Agent").unwrap(), "Mozilla/5.0");

        assert_eq!(by_id("18").kind, StreamKind::Combined);

        // format_note wins over a letterboxed height, fps suffix dropped
        let wide = by_id("137");
        assert_eq!(wide.kind, StreamKind::VideoOnly);
        assert_eq!(wide.resolution.as_deref(), Some("1080p"));

        let vp9 = by_id("248");
        assert_eq!(vp9.resolution.as_deref(), Some("1080p"));
        assert_eq!(vp9.mime_type, "video/webm");
    }

    #[test]
    fn test_invalid_json_is_resolution_error() {
        let err = parse_json(b"not json").unwrap_err();
        assert!(matches!(err, DownloadError::Resolution(_)));
    }

    #[test]
    fn test_missing_formats_is_resolution_error() {
        let err = parse_json(br#"{"id":"x","title":"t"}"#).unwrap_err();
        assert_eq!(
            err,
            DownloadError::Resolution("No formats array in JSON".to_string())
        );
    }
}
