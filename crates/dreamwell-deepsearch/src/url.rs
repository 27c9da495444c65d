//! YouTube video-URL validation and id extraction.

use std::sync::LazyLock;

use regex::Regex;

static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)")
            .expect("watch/short/embed pattern"),
        Regex::new(r"youtube\.com/v/([^&\n?#]+)").expect("legacy /v/ pattern"),
    ]
});

/// Extracts the video id from watch, short-link, embed, or legacy URL forms.
#[must_use]
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Whether the URL points at a single video rather than a channel, handle,
/// user page, or playlist.
#[must_use]
pub fn is_valid_video_url(url: &str) -> bool {
    if url.contains("/channel/")
        || url.contains("/c/")
        || url.contains("/user/")
        || url.contains("/@")
        || url.contains("/playlist")
    {
        return false;
    }
    extract_video_id(url).is_some()
}
