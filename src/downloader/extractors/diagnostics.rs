// Resolver failure diagnostics
//
// Classifies yt-dlp error text so the log says *why* a URL did not resolve.
// The HTTP response never changes with the reason: every resolver failure is
// one opaque 404.
//
// Media IDs and URLs are stripped before matching, and patterns only match
// whole words, so an ID like `xDRMabc` or `a-drm_429` classifies nothing.

use regex::Regex;

lazy_static::lazy_static! {
    // "error: [youtube] <id>:" line prefixes and bare URLs
    static ref SITE_ID_OR_URL: Regex =
        Regex::new(r"(?m)^\s*(?:error|warning):\s*\[[^\]]*\]\s*[^\s:]+:|https?://\S+").unwrap();
}

/// Reasons why the platform might refuse to hand out streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingReason {
    /// Plain 403 with no more specific hint
    Http403Forbidden,

    /// SABR streaming protection hides the adaptive formats
    SabrStreaming,

    PoTokenRequired,

    AgeRestricted,

    GeoBlocked,

    /// Stalled or refused connection, often a soft IP block
    NetworkTimeout,

    /// 429 or similar
    RateLimited,

    BotDetection,

    PrivateVideo,

    /// Deleted, removed or otherwise gone
    VideoUnavailable,

    /// DRM-protected content (Premium, Music, Movies)
    DrmProtected,

    /// Requires channel membership
    MembersOnly,

    /// The yt-dlp / python executable is missing
    ToolMissing,

    /// The input is not something yt-dlp understands
    UnsupportedUrl,

    Unknown,
}

impl BlockingReason {
    /// No retry or configuration change can help
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::DrmProtected | Self::VideoUnavailable | Self::PrivateVideo | Self::UnsupportedUrl
        )
    }

    /// A proxy (`--proxy`) might get past this
    pub fn proxy_might_help(&self) -> bool {
        matches!(
            self,
            Self::Http403Forbidden
                | Self::GeoBlocked
                | Self::NetworkTimeout
                | Self::RateLimited
                | Self::BotDetection
        )
    }

    /// Short label for the `reason` log field
    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "http 403 on the player request",
            Self::SabrStreaming => "adaptive formats withheld (sabr)",
            Self::PoTokenRequired => "po token demanded by the player",
            Self::AgeRestricted => "age gate",
            Self::GeoBlocked => "region lock",
            Self::NetworkTimeout => "network stalled or refused",
            Self::RateLimited => "http 429 / throttled",
            Self::BotDetection => "anti-bot challenge",
            Self::PrivateVideo => "private upload",
            Self::VideoUnavailable => "removed or missing upload",
            Self::DrmProtected => "drm or paid content",
            Self::MembersOnly => "channel members only",
            Self::ToolMissing => "resolver executable missing",
            Self::UnsupportedUrl => "url not recognised by yt-dlp",
            Self::Unknown => "unclassified",
        }
    }
}

/// Classify resolver stderr; `None` when there is nothing to classify
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    if error.trim().is_empty() {
        return None;
    }

    let lower = error.to_lowercase();
    let message = SITE_ID_OR_URL.replace_all(&lower, " ");
    let has = |patterns: &[&str]| patterns.iter().any(|p| contains_word(&message, p));

    // Most specific first
    let reason = if has(&["failed to start", "no such file or directory", "command not found"]) {
        BlockingReason::ToolMissing
    } else if has(&["unsupported url", "is not a valid url", "invalid url"]) {
        BlockingReason::UnsupportedUrl
    } else if has(&[
        "drm",
        "widevine",
        "playready",
        "fairplay",
        "youtube premium",
        "requires purchase",
        "rental",
        "requires payment",
    ]) {
        BlockingReason::DrmProtected
    } else if has(&["members only", "members-only", "join this channel", "available to members"]) {
        BlockingReason::MembersOnly
    } else if has(&["sabr"]) {
        BlockingReason::SabrStreaming
    } else if has(&["po token", "proof of origin"]) {
        BlockingReason::PoTokenRequired
    } else if has(&["age-restricted", "sign in to confirm your age", "age_verification"]) {
        BlockingReason::AgeRestricted
    } else if has(&["private video", "video is private", "been granted access"]) {
        BlockingReason::PrivateVideo
    } else if has(&[
        "video unavailable",
        "video has been removed",
        "no longer available",
        "video is unavailable",
    ]) {
        BlockingReason::VideoUnavailable
    } else if has(&[
        "not available in your country",
        "blocked in your country",
        "geo restricted",
        "geo-restricted",
    ]) {
        BlockingReason::GeoBlocked
    } else if has(&["429", "rate limit", "rate limited", "rate-limited", "too many requests"]) {
        BlockingReason::RateLimited
    } else if has(&["not a bot", "captcha", "unusual traffic", "automated"]) {
        BlockingReason::BotDetection
    } else if has(&["403", "forbidden"]) {
        BlockingReason::Http403Forbidden
    } else if has(&["timeout", "timed out", "connection refused", "network unreachable"]) {
        BlockingReason::NetworkTimeout
    } else {
        BlockingReason::Unknown
    };

    Some(reason)
}

/// `pattern` occurs in `text` with no letter or digit directly around it
fn contains_word(text: &str, pattern: &str) -> bool {
    text.match_indices(pattern).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + pattern.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
