//! Influencer search orchestration.
//!
//! Fan out over keywords, dedup channels, enrich each candidate with audience
//! metrics, score under the company's weights, and rank deterministically.
//! One candidate failing enrichment is dropped and logged; only a search with
//! nothing collected at all surfaces an error.

use std::collections::HashSet;
use std::sync::LazyLock;

use dreamwell_core::ScoringWeights;
use dreamwell_youtube::{ChannelHit, ChannelStats, YouTubeClient, YouTubeError};
use futures::stream::{self, StreamExt};
use regex::Regex;
use sqlx::PgPool;

use crate::cpm::{self, ChannelSignals};
use crate::error::MatchError;
use crate::judge::{neutral_judgment, ChannelFacts, FitJudge};
use crate::pricing;
use crate::scorer::{self, SubScores};
use crate::types::{
    CompanyProfile, InfluencerCandidate, ProductContext, SearchAverages, SearchOutcome,
};

/// Cache bucket for channel search responses.
const CHANNEL_SEARCH_TYPE: &str = "channels";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email regex")
});

/// Orchestrator knobs, passed explicitly so nothing rides on ambient state.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub channels_per_keyword: u32,
    pub recent_video_cap: u32,
    pub max_concurrent_candidates: usize,
    pub region: Option<String>,
    pub relevance_language: Option<String>,
    pub cache_ttl_hours: i64,
    /// 1..=12 for the seasonality multiplier; `None` is season-neutral.
    pub month: Option<u32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            channels_per_keyword: 10,
            recent_video_cap: 10,
            max_concurrent_candidates: 4,
            region: None,
            relevance_language: None,
            cache_ttl_hours: 24,
            month: None,
        }
    }
}

/// Runs a full influencer search for a set of keywords.
///
/// `cache` is the optional search-response cache; misses and store failures
/// degrade to direct API calls. Candidate enrichment runs with bounded
/// concurrency; result order is only defined after the final sort (score
/// desc, subscribers desc, title asc).
///
/// # Errors
///
/// Returns [`MatchError::SearchUnavailable`] only when nothing could be
/// collected: every keyword search failed, or the channel-statistics batch
/// failed. Per-candidate failures drop that candidate.
pub async fn run_influencer_search<J: FitJudge>(
    youtube: &YouTubeClient,
    judge: &J,
    cache: Option<&PgPool>,
    options: &SearchOptions,
    keywords: &[String],
    weights: &ScoringWeights,
    company: &CompanyProfile,
    product: Option<&ProductContext>,
) -> Result<SearchOutcome, MatchError> {
    // 1. Keyword fan-out, consulting the cache per keyword.
    let mut hits: Vec<ChannelHit> = Vec::new();
    let mut first_error: Option<YouTubeError> = None;

    for keyword in keywords {
        match channel_hits_for_keyword(youtube, cache, options, keyword).await {
            Ok(found) => {
                tracing::debug!(keyword = %keyword, count = found.len(), "collected channel hits");
                hits.extend(found);
            }
            Err(e) => {
                tracing::warn!(keyword = %keyword, error = %e, "channel search failed for keyword");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if hits.is_empty() {
        if let Some(e) = first_error {
            return Err(MatchError::SearchUnavailable(e));
        }
        return Ok(empty_outcome());
    }

    // 2. Dedup across keywords by channel id, preserving first-seen order.
    let mut seen = HashSet::new();
    hits.retain(|hit| seen.insert(hit.channel_id.clone()));

    // 3. One batched statistics call for all unique channels.
    let ids: Vec<String> = hits.iter().map(|h| h.channel_id.clone()).collect();
    let stats = youtube
        .get_channel_stats(&ids)
        .await
        .map_err(MatchError::SearchUnavailable)?;

    // 4. Bounded-concurrency enrichment; failures drop the candidate only.
    let mut candidates: Vec<InfluencerCandidate> = stream::iter(stats)
        .map(|channel| enrich_candidate(youtube, judge, options, weights, company, product, channel))
        .buffer_unordered(options.max_concurrent_candidates.max(1))
        .collect::<Vec<Option<InfluencerCandidate>>>()
        .await
        .into_iter()
        .flatten()
        .collect();

    // 5. Deterministic ranking: score desc, subscribers desc, title asc.
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| {
                b.subscriber_count
                    .unwrap_or(0)
                    .cmp(&a.subscriber_count.unwrap_or(0))
            })
            .then_with(|| a.title.cmp(&b.title))
    });

    // 6. Aggregates over the full result set, not a top-N slice.
    let averages = compute_averages(&candidates);
    let count = candidates.len();

    Ok(SearchOutcome {
        influencers: candidates,
        averages,
        count,
    })
}

async fn channel_hits_for_keyword(
    youtube: &YouTubeClient,
    cache: Option<&PgPool>,
    options: &SearchOptions,
    keyword: &str,
) -> Result<Vec<ChannelHit>, YouTubeError> {
    if let Some(pool) = cache {
        match dreamwell_db::get_fresh_search_results(pool, keyword, CHANNEL_SEARCH_TYPE).await {
            Ok(Some(cached)) => match serde_json::from_value::<Vec<ChannelHit>>(cached) {
                Ok(hits) => {
                    tracing::debug!(keyword = %keyword, count = hits.len(), "channel search cache hit");
                    return Ok(hits);
                }
                Err(e) => {
                    tracing::warn!(keyword = %keyword, error = %e, "discarding unreadable cached search row");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(keyword = %keyword, error = %e, "search cache lookup failed");
            }
        }
    }

    let hits = youtube
        .search_channels(
            keyword,
            options.channels_per_keyword,
            options.region.as_deref(),
            options.relevance_language.as_deref(),
        )
        .await?;

    if let Some(pool) = cache {
        match serde_json::to_value(&hits) {
            Ok(payload) => {
                if let Err(e) = dreamwell_db::store_search_results(
                    pool,
                    keyword,
                    CHANNEL_SEARCH_TYPE,
                    &payload,
                    options.cache_ttl_hours,
                )
                .await
                {
                    tracing::warn!(keyword = %keyword, error = %e, "failed to store search cache row");
                }
            }
            Err(e) => {
                tracing::warn!(keyword = %keyword, error = %e, "failed to serialize search cache row");
            }
        }
    }

    Ok(hits)
}

async fn enrich_candidate<J: FitJudge>(
    youtube: &YouTubeClient,
    judge: &J,
    options: &SearchOptions,
    weights: &ScoringWeights,
    company: &CompanyProfile,
    product: Option<&ProductContext>,
    channel: ChannelStats,
) -> Option<InfluencerCandidate> {
    let video_ids = match recent_video_ids(youtube, options, &channel).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(
                channel_id = %channel.channel_id,
                error = %e,
                "excluding candidate: could not list recent videos"
            );
            return None;
        }
    };

    let video_stats = if video_ids.is_empty() {
        Vec::new()
    } else {
        match youtube.get_video_stats(&video_ids).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(
                    channel_id = %channel.channel_id,
                    error = %e,
                    "excluding candidate: could not fetch video statistics"
                );
                return None;
            }
        }
    };

    let total_views: u64 = video_stats.iter().map(|v| v.views).sum();
    let total_interactions: u64 = video_stats.iter().map(|v| v.likes + v.comments).sum();
    #[allow(clippy::cast_precision_loss)]
    let avg_recent_views = if video_stats.is_empty() {
        0.0
    } else {
        round2(total_views as f64 / video_stats.len() as f64)
    };
    #[allow(clippy::cast_precision_loss)]
    let engagement_rate = if total_views == 0 {
        0.0
    } else {
        round4(total_interactions as f64 / total_views as f64)
    };

    let niche_text = format!("{} {}", channel.title, channel.description);
    let signals = ChannelSignals {
        niche: cpm::infer_niche(&niche_text),
        country: channel.country.as_deref(),
        language: options.relevance_language.as_deref(),
        avg_recent_views: (avg_recent_views > 0.0).then_some(avg_recent_views),
        engagement_rate: (engagement_rate > 0.0).then_some(engagement_rate),
        subscribers: channel.subscriber_count,
        month: options.month,
    };
    let cpm_range = cpm::estimate_cpm_range(&signals);
    let rpm_range = cpm::estimate_rpm_range(&signals);

    let pricing_range = pricing::suggested_pricing(
        cpm_range,
        rpm_range,
        avg_recent_views,
        channel.subscriber_count,
        signals.engagement_rate,
    );
    let expected_profit_range = product.and_then(|p| p.profit).map(|profit| {
        pricing::expected_profit(
            profit,
            rpm_range,
            avg_recent_views,
            channel.subscriber_count,
            signals.engagement_rate,
            Some(pricing_range),
        )
    });

    // Fit judgment degrades to neutral; one flaky LLM call must not cost us
    // the candidate.
    let judgment = match judge
        .judge(
            company,
            ChannelFacts {
                title: &channel.title,
                description: &channel.description,
                country: channel.country.as_deref(),
            },
        )
        .await
    {
        Ok(judgment) => judgment,
        Err(e) => {
            tracing::warn!(
                channel_id = %channel.channel_id,
                error = %e,
                "fit judgment failed; scoring with neutral fit"
            );
            neutral_judgment()
        }
    };

    let breakdown = SubScores {
        values: judgment.values_alignment,
        cultural: judgment.cultural_fit,
        cpm: scorer::cpm_sub_score(cpm_range),
        rpm: scorer::rpm_sub_score(rpm_range, product.is_some_and(|p| p.is_luxury)),
        views_to_subs: scorer::views_to_subs_sub_score(avg_recent_views, channel.subscriber_count),
    };
    let score = scorer::composite_score(weights, &breakdown);

    let contact_email = EMAIL_RE
        .find(&channel.description)
        .map(|m| m.as_str().to_owned());

    Some(InfluencerCandidate {
        channel_id: channel.channel_id,
        title: channel.title,
        description: channel.description,
        country: channel.country,
        subscriber_count: channel.subscriber_count,
        avg_recent_views,
        engagement_rate,
        videos_sampled: video_stats.len(),
        cpm_range_usd: cpm_range,
        rpm_range_usd: rpm_range,
        pricing_range_usd: pricing_range,
        expected_profit_range_usd: expected_profit_range,
        contact_email,
        score,
        breakdown,
        values_reasoning: judgment.values_reasoning,
        cultural_reasoning: judgment.cultural_reasoning,
    })
}

/// Lists recent video ids: uploads playlist first, channel video search as
/// fallback. Only both paths failing excludes the candidate.
async fn recent_video_ids(
    youtube: &YouTubeClient,
    options: &SearchOptions,
    channel: &ChannelStats,
) -> Result<Vec<String>, YouTubeError> {
    if let Some(playlist) = &channel.uploads_playlist {
        match youtube
            .get_recent_video_ids(playlist, options.recent_video_cap)
            .await
        {
            Ok(ids) if !ids.is_empty() => return Ok(ids),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(
                    channel_id = %channel.channel_id,
                    error = %e,
                    "uploads playlist unavailable; falling back to channel search"
                );
            }
        }
    }

    youtube
        .search_channel_videos(&channel.channel_id, options.recent_video_cap)
        .await
}

fn compute_averages(candidates: &[InfluencerCandidate]) -> SearchAverages {
    if candidates.is_empty() {
        return SearchAverages {
            avg_views: 0.0,
            avg_score: 0.0,
        };
    }
    #[allow(clippy::cast_precision_loss)]
    let denom = candidates.len() as f64;
    let avg_views = round2(candidates.iter().map(|c| c.avg_recent_views).sum::<f64>() / denom);
    let avg_score = round1(candidates.iter().map(|c| c.score).sum::<f64>() / denom);
    SearchAverages {
        avg_views,
        avg_score,
    }
}

fn empty_outcome() -> SearchOutcome {
    SearchOutcome {
        influencers: Vec::new(),
        averages: SearchAverages {
            avg_views: 0.0,
            avg_score: 0.0,
        },
        count: 0,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
