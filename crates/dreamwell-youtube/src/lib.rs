//! YouTube Data API v3 client.
//!
//! Thin typed wrapper over the four endpoints the influencer search needs:
//! channel search, channel statistics, uploads-playlist items, and per-video
//! statistics. The public API does not expose actual CPM/RPM; everything here
//! is raw audience data for the scoring heuristics downstream.

mod client;
mod error;
mod retry;
mod types;

pub use client::YouTubeClient;
pub use error::YouTubeError;
pub use types::{ChannelHit, ChannelStats, VideoStats};
