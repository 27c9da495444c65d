//! Domain types returned by [`crate::YouTubeClient`].
//!
//! The Data API serializes every counter as a JSON string; these types hold
//! the parsed values so downstream code never sees wire quirks.

use serde::{Deserialize, Serialize};

/// One channel returned by a keyword search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelHit {
    pub channel_id: String,
    pub title: String,
    pub description: String,
}

/// Channel-level statistics from `channels.list`.
#[derive(Debug, Clone)]
pub struct ChannelStats {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub country: Option<String>,
    /// `None` when the channel hides its subscriber count.
    pub subscriber_count: Option<u64>,
    pub view_count: u64,
    pub video_count: u64,
    pub uploads_playlist: Option<String>,
}

/// Per-video statistics from `videos.list`.
#[derive(Debug, Clone)]
pub struct VideoStats {
    pub video_id: String,
    pub title: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
}
