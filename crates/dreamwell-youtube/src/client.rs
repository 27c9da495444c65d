//! HTTP client for the YouTube Data API v3.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::error::YouTubeError;
use crate::retry::retry_with_backoff;
use crate::types::{ChannelHit, ChannelStats, VideoStats};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Maximum ids per `channels.list` / `videos.list` call (API limit).
const ID_BATCH_SIZE: usize = 50;

/// Typed client for the four Data API endpoints the search pipeline uses.
///
/// Quota pressure (403/429) and 5xx responses are retried with exponential
/// backoff plus jitter up to `max_retries` additional attempts; 404s and
/// malformed bodies are typed errors returned immediately.
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl YouTubeClient {
    /// Creates a client against the production API.
    ///
    /// # Errors
    ///
    /// Returns [`YouTubeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, YouTubeError> {
        Self::with_base_url(
            DEFAULT_BASE_URL,
            api_key,
            timeout_secs,
            max_retries,
            backoff_base_secs,
        )
    }

    /// Creates a client against an explicit base URL (mock servers in tests).
    ///
    /// # Errors
    ///
    /// Returns [`YouTubeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, YouTubeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            max_retries,
            backoff_base_secs,
        })
    }

    /// Searches for channels matching a keyword query.
    ///
    /// Results are deduplicated by channel id, preserving API order.
    ///
    /// # Errors
    ///
    /// Returns [`YouTubeError`] if the request fails after all retries or the
    /// response cannot be parsed.
    pub async fn search_channels(
        &self,
        query: &str,
        max_results: u32,
        region: Option<&str>,
        relevance_language: Option<&str>,
    ) -> Result<Vec<ChannelHit>, YouTubeError> {
        let mut params = vec![
            ("part", "snippet".to_owned()),
            ("q", query.to_owned()),
            ("type", "channel".to_owned()),
            ("maxResults", max_results.clamp(1, 50).to_string()),
        ];
        if let Some(region) = region {
            params.push(("regionCode", region.to_owned()));
        }
        if let Some(lang) = relevance_language {
            params.push(("relevanceLanguage", lang.to_owned()));
        }

        let response: SearchResponse = self.get_json("search", &params).await?;

        let mut seen = std::collections::HashSet::new();
        let hits = response
            .items
            .into_iter()
            .filter_map(|item| {
                let snippet = item.snippet?;
                let channel_id = snippet.channel_id?;
                seen.insert(channel_id.clone()).then_some(ChannelHit {
                    channel_id,
                    title: snippet.title.unwrap_or_default(),
                    description: snippet.description.unwrap_or_default(),
                })
            })
            .collect();

        Ok(hits)
    }

    /// Fetches snippet + statistics + uploads playlist for a set of channels.
    ///
    /// Ids are batched 50 per call. Channels the API does not return (deleted,
    /// suspended) are silently absent from the result.
    ///
    /// # Errors
    ///
    /// Returns [`YouTubeError`] if any batch fails after all retries.
    pub async fn get_channel_stats(
        &self,
        channel_ids: &[String],
    ) -> Result<Vec<ChannelStats>, YouTubeError> {
        let mut out = Vec::with_capacity(channel_ids.len());

        for batch in channel_ids.chunks(ID_BATCH_SIZE) {
            let params = vec![
                ("part", "snippet,statistics,contentDetails".to_owned()),
                ("id", batch.join(",")),
                ("maxResults", "50".to_owned()),
            ];
            let response: ChannelsResponse = self.get_json("channels", &params).await?;

            for item in response.items {
                let snippet = item.snippet.unwrap_or_default();
                let stats = item.statistics.unwrap_or_default();
                let uploads = item
                    .content_details
                    .and_then(|cd| cd.related_playlists)
                    .and_then(|rp| rp.uploads);

                // Hidden subscriber counts come back as 0 with a flag; treat
                // them as unknown rather than zero.
                let subscriber_count = if stats.hidden_subscriber_count.unwrap_or(false) {
                    None
                } else {
                    stats.subscriber_count.as_deref().map(parse_count)
                };

                out.push(ChannelStats {
                    channel_id: item.id,
                    title: snippet.title.unwrap_or_default(),
                    description: snippet.description.unwrap_or_default(),
                    country: snippet.country,
                    subscriber_count,
                    view_count: stats.view_count.as_deref().map_or(0, parse_count),
                    video_count: stats.video_count.as_deref().map_or(0, parse_count),
                    uploads_playlist: uploads,
                });
            }
        }

        Ok(out)
    }

    /// Returns up to `cap` recent video ids from an uploads playlist.
    ///
    /// # Errors
    ///
    /// Returns [`YouTubeError`] if the request fails after all retries.
    pub async fn get_recent_video_ids(
        &self,
        uploads_playlist_id: &str,
        cap: u32,
    ) -> Result<Vec<String>, YouTubeError> {
        let params = vec![
            ("part", "contentDetails".to_owned()),
            ("playlistId", uploads_playlist_id.to_owned()),
            ("maxResults", cap.clamp(1, 50).to_string()),
        ];
        let response: PlaylistItemsResponse = self.get_json("playlistItems", &params).await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.content_details.and_then(|cd| cd.video_id))
            .take(cap as usize)
            .collect())
    }

    /// Fallback for channels without a readable uploads playlist: search the
    /// channel's recent videos directly.
    ///
    /// # Errors
    ///
    /// Returns [`YouTubeError`] if the request fails after all retries.
    pub async fn search_channel_videos(
        &self,
        channel_id: &str,
        cap: u32,
    ) -> Result<Vec<String>, YouTubeError> {
        let params = vec![
            ("part", "id".to_owned()),
            ("channelId", channel_id.to_owned()),
            ("type", "video".to_owned()),
            ("order", "date".to_owned()),
            ("maxResults", cap.clamp(1, 50).to_string()),
        ];
        let response: SearchResponse = self.get_json("search", &params).await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.id.and_then(|id| id.video_id))
            .take(cap as usize)
            .collect())
    }

    /// Fetches per-video statistics, batched 50 ids per call.
    ///
    /// # Errors
    ///
    /// Returns [`YouTubeError`] if any batch fails after all retries.
    pub async fn get_video_stats(
        &self,
        video_ids: &[String],
    ) -> Result<Vec<VideoStats>, YouTubeError> {
        let mut out = Vec::with_capacity(video_ids.len());

        for batch in video_ids.chunks(ID_BATCH_SIZE) {
            let params = vec![
                ("part", "snippet,statistics".to_owned()),
                ("id", batch.join(",")),
                ("maxResults", "50".to_owned()),
            ];
            let response: VideosResponse = self.get_json("videos", &params).await?;

            for item in response.items {
                let stats = item.statistics.unwrap_or_default();
                out.push(VideoStats {
                    video_id: item.id,
                    title: item
                        .snippet
                        .and_then(|s| s.title)
                        .unwrap_or_default(),
                    views: stats.view_count.as_deref().map_or(0, parse_count),
                    likes: stats.like_count.as_deref().map_or(0, parse_count),
                    comments: stats.comment_count.as_deref().map_or(0, parse_count),
                });
            }
        }

        Ok(out)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<T, YouTubeError> {
        let url = format!("{}/{resource}", self.base_url);

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .query(params)
                    .query(&[("key", self.api_key.as_str())])
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    || status == reqwest::StatusCode::FORBIDDEN
                {
                    // 403 is how the Data API reports quotaExceeded.
                    return Err(YouTubeError::RateLimited {
                        status: status.as_u16(),
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(YouTubeError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(YouTubeError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<T>(&body).map_err(|e| YouTubeError::Deserialize {
                    context: format!("{resource} response"),
                    source: e,
                })
            }
        })
        .await
    }
}

/// Lenient numeric parse for the API's stringly-typed counters.
fn parse_count(raw: &str) -> u64 {
    raw.parse::<u64>().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: Option<SearchItemId>,
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    #[serde(rename = "channelId")]
    channel_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    snippet: Option<ChannelSnippet>,
    statistics: Option<ChannelStatistics>,
    #[serde(rename = "contentDetails")]
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelSnippet {
    title: Option<String>,
    description: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelStatistics {
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
    #[serde(rename = "subscriberCount")]
    subscriber_count: Option<String>,
    #[serde(rename = "hiddenSubscriberCount")]
    hidden_subscriber_count: Option<bool>,
    #[serde(rename = "videoCount")]
    video_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(rename = "relatedPlaylists")]
    related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    #[serde(rename = "contentDetails")]
    content_details: Option<PlaylistItemContentDetails>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemContentDetails {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: Option<VideoSnippet>,
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VideoStatistics {
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
    #[serde(rename = "likeCount")]
    like_count: Option<String>,
    #[serde(rename = "commentCount")]
    comment_count: Option<String>,
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
