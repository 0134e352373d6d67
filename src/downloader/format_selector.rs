// FormatSelector - picks one video-only and one audio-only stream
//
// Policy:
// - Video: first video-only stream whose resolution label equals the requested
//   tier (resolver order is authoritative, nothing is re-sorted)
// - Fallback: video-only stream with the highest numeric resolution; on ties
//   the earliest one wins
// - Audio: first audio-only stream, unconditionally (no bitrate negotiation)

use super::models::{QualityTier, SelectionResult, StreamDescriptor};

pub struct FormatSelector;

impl FormatSelector {
    /// Apply exact-match-then-max-resolution for video and first-audio for audio.
    ///
    /// Returns a partially filled selection when a stream kind is missing; the
    /// caller decides that this is a failure via [`SelectionResult::require_both`].
    pub fn select(streams: &[StreamDescriptor], quality: QualityTier) -> SelectionResult<'_> {
        let video = Self::find_exact(streams, quality).or_else(|| Self::find_highest(streams));
        let audio = streams.iter().find(|s| s.is_audio_only());

        SelectionResult { video, audio }
    }

    fn find_exact(streams: &[StreamDescriptor], quality: QualityTier) -> Option<&StreamDescriptor> {
        let label = quality.resolution_label();
        streams
            .iter()
            .filter(|s| s.is_video_only())
            .find(|s| s.resolution.as_deref() == Some(label))
    }

    fn find_highest(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
        // `max_by_key` keeps the last maximum; fold keeps the first.
        streams
            .iter()
            .filter(|s| s.is_video_only())
            .fold(None, |best: Option<&StreamDescriptor>, s| match best {
                Some(b) if b.resolution_value() >= s.resolution_value() => Some(b),
                _ => Some(s),
            })
    }
}
