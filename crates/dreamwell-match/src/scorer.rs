//! Sub-score curves and the weighted composite score.
//!
//! Every factor is normalized to [0, 100] before weighting, so for any
//! weight vector summing to 1.0 the composite is itself in [0, 100].

use dreamwell_core::ScoringWeights;
use serde::Serialize;

/// Midpoint CPM (USD) at which the cost-efficiency score crosses 50.
const CPM_HALF_SCORE_USD: f64 = 10.0;

/// Midpoint RPM (USD) treated as the top of the quality ramp.
const RPM_RAMP_TOP_USD: f64 = 10.0;

/// The five normalized factor scores for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubScores {
    pub values: f64,
    pub cultural: f64,
    pub cpm: f64,
    pub rpm: f64,
    pub views_to_subs: f64,
}

/// Cost-efficiency score: cheaper reach scores higher.
///
/// Reciprocal curve `100·k/(k + cpm_mid)` with k = [`CPM_HALF_SCORE_USD`]:
/// monotonically decreasing in CPM, 100 at zero cost, asymptotically 0.
#[must_use]
pub fn cpm_sub_score(cpm_range: (f64, f64)) -> f64 {
    let mid = ((cpm_range.0 + cpm_range.1) / 2.0).max(0.0);
    100.0 * CPM_HALF_SCORE_USD / (CPM_HALF_SCORE_USD + mid)
}

/// Audience-quality score from RPM, direction set by the product profile.
///
/// High-margin (luxury) products want premium audiences: the score ramps up
/// linearly to 100 at a $[`RPM_RAMP_TOP_USD`] midpoint. Commodity products
/// want cheap volume: the same ramp inverted.
#[must_use]
pub fn rpm_sub_score(rpm_range: (f64, f64), luxury: bool) -> f64 {
    let mid = ((rpm_range.0 + rpm_range.1) / 2.0).max(0.0);
    let ramp = (mid / RPM_RAMP_TOP_USD).clamp(0.0, 1.0);
    if luxury {
        100.0 * ramp
    } else {
        100.0 * (1.0 - ramp)
    }
}

/// Engagement-ratio score: average recent views relative to subscribers.
///
/// The ratio is clipped at 1.0 before scaling so a viral outlier cannot run
/// past 100. Channels hiding their subscriber count get the neutral 50.
#[must_use]
pub fn views_to_subs_sub_score(avg_recent_views: f64, subscribers: Option<u64>) -> f64 {
    match subscribers {
        Some(subs) if subs > 0 => {
            #[allow(clippy::cast_precision_loss)]
            let ratio = (avg_recent_views.max(0.0) / subs as f64).clamp(0.0, 1.0);
            100.0 * ratio
        }
        _ => 50.0,
    }
}

/// Blends the five sub-scores under the company's weights.
///
/// The result is rounded to one decimal. Callers supply weights as fractions
/// summing to ~1.0; with sub-scores in [0, 100] the composite stays in
/// [0, 100].
#[must_use]
pub fn composite_score(weights: &ScoringWeights, scores: &SubScores) -> f64 {
    let raw = weights.values * scores.values
        + weights.cultural * scores.cultural
        + weights.cpm * scores.cpm
        + weights.rpm * scores.rpm
        + weights.views_to_subs * scores.views_to_subs;
    round1(raw)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
