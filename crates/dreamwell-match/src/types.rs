//! Search input/output types.

use serde::Serialize;

use crate::scorer::SubScores;

/// The searching company's brand context.
#[derive(Debug, Clone, Default)]
pub struct CompanyProfile {
    pub keywords: Vec<String>,
    /// ISO-3166 alpha-2 market, when known.
    pub country: Option<String>,
}

/// Product context when the search targets a specific product.
#[derive(Debug, Clone)]
pub struct ProductContext {
    pub name: String,
    /// Profit per unit sold, USD.
    pub profit: Option<f64>,
    pub is_luxury: bool,
}

/// One scored channel in a search response. Constructed fresh per search
/// call; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct InfluencerCandidate {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub country: Option<String>,
    pub subscriber_count: Option<u64>,
    pub avg_recent_views: f64,
    pub engagement_rate: f64,
    pub videos_sampled: usize,
    pub cpm_range_usd: (f64, f64),
    pub rpm_range_usd: (f64, f64),
    pub pricing_range_usd: (f64, f64),
    pub expected_profit_range_usd: Option<(f64, f64)>,
    pub contact_email: Option<String>,
    pub score: f64,
    pub breakdown: SubScores,
    pub values_reasoning: Option<String>,
    pub cultural_reasoning: Option<String>,
}

/// Aggregates over the full (not top-N) result set.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SearchAverages {
    pub avg_views: f64,
    pub avg_score: f64,
}

/// Ranked candidates plus aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub influencers: Vec<InfluencerCandidate>,
    pub averages: SearchAverages,
    pub count: usize,
}
