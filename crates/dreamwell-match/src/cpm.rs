//! Heuristic CPM/RPM estimation from public audience signals.
//!
//! Estimates combine niche baselines, a region multiplier, seasonality, an
//! engagement scaler, and a recency scaler. Numbers are indicative only and
//! refined over time.

/// Baseline CPM (USD) ranges by niche for the US market.
const NICHE_BASELINES_USD: &[(&str, (f64, f64))] = &[
    ("tech", (8.0, 20.0)),
    ("finance", (12.0, 35.0)),
    ("business", (10.0, 25.0)),
    ("education", (6.0, 18.0)),
    ("health", (7.0, 20.0)),
    ("fitness", (6.0, 15.0)),
    ("beauty", (5.0, 14.0)),
    ("gaming", (3.0, 9.0)),
    ("travel", (4.0, 12.0)),
    ("lifestyle", (4.0, 12.0)),
    ("sports", (4.0, 12.0)),
];

const DEFAULT_BASELINE_USD: (f64, f64) = (5.0, 12.0);

/// Country multipliers relative to US. Coarse defaults.
const COUNTRY_MULTIPLIER: &[(&str, f64)] = &[
    ("US", 1.00),
    ("CA", 0.95),
    ("GB", 0.95),
    ("UK", 0.95),
    ("AU", 0.90),
    ("DE", 0.90),
    ("FR", 0.85),
    ("NL", 0.90),
    ("SE", 0.90),
    ("NO", 0.95),
    ("DK", 0.90),
    ("FI", 0.85),
    ("CH", 1.00),
    ("JP", 0.90),
    ("SG", 0.95),
    ("IN", 0.35),
    ("BR", 0.45),
    ("MX", 0.50),
    ("PH", 0.35),
    ("ID", 0.35),
    ("ES", 0.75),
    ("IT", 0.75),
    ("PL", 0.65),
    ("TR", 0.45),
    ("AE", 0.95),
];

/// Language multipliers, applied only when the country is unknown.
const LANG_MULTIPLIER: &[(&str, f64)] = &[
    ("en", 1.0),
    ("de", 0.9),
    ("fr", 0.85),
    ("es", 0.8),
    ("pt", 0.75),
    ("hi", 0.4),
];

/// Seasonality multiplier by month (index 0 = January). Q4 uplift.
const SEASONALITY: [f64; 12] = [
    0.85, 0.9, 0.95, 1.0, 1.0, 0.95, 0.95, 1.0, 1.05, 1.15, 1.25, 1.3,
];

/// Audience signals feeding one channel's estimate.
#[derive(Debug, Clone, Default)]
pub struct ChannelSignals<'a> {
    pub niche: &'a str,
    pub country: Option<&'a str>,
    /// ISO-639-1, if known.
    pub language: Option<&'a str>,
    /// Average views per recent video.
    pub avg_recent_views: Option<f64>,
    /// (likes + comments) / views over recent videos, in [0, 1].
    pub engagement_rate: Option<f64>,
    pub subscribers: Option<u64>,
    /// 1..=12, for seasonality.
    pub month: Option<u32>,
}

/// Infers a niche tag from channel text (title + description).
///
/// First baseline key contained in the lowercased text wins; unmatched text
/// falls through to the default baseline.
#[must_use]
pub fn infer_niche(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    NICHE_BASELINES_USD
        .iter()
        .find(|(key, _)| lowered.contains(key))
        .map_or("default", |(key, _)| key)
}

fn pick_baseline_usd(niche: &str) -> (f64, f64) {
    let key = niche.trim().to_lowercase();
    NICHE_BASELINES_USD
        .iter()
        .find(|(name, _)| key.contains(name))
        .map_or(DEFAULT_BASELINE_USD, |(_, range)| *range)
}

fn region_multiplier(country: Option<&str>, language: Option<&str>) -> f64 {
    if let Some(country) = country {
        let upper = country.to_uppercase();
        if let Some((_, mult)) = COUNTRY_MULTIPLIER.iter().find(|(c, _)| *c == upper) {
            return *mult;
        }
    }
    if let Some(language) = language {
        let lower = language.to_lowercase();
        if let Some((_, mult)) = LANG_MULTIPLIER.iter().find(|(l, _)| *l == lower) {
            return *mult;
        }
    }
    // Conservative default when the region is unknown.
    0.8
}

fn seasonality_multiplier(month: Option<u32>) -> f64 {
    match month {
        Some(m) if (1..=12).contains(&m) => SEASONALITY[(m - 1) as usize],
        _ => 1.0,
    }
}

/// Maps engagement rate to a multiplier. 3% ≈ 1.0; every +1% adds ~0.12×;
/// floored at 0.7, capped at 1.5.
fn engagement_scaler(engagement_rate: Option<f64>) -> f64 {
    let Some(er) = engagement_rate else {
        return 1.0;
    };
    let er = er.clamp(0.0, 0.2);
    let mult = 1.0 + ((er - 0.03) / 0.01) * 0.12;
    mult.clamp(0.7, 1.5)
}

/// If recent views punch above the subscriber base, scale up; below, scale
/// down slightly. Square root damps variance; bound within [0.7, 1.3].
fn recency_scaler(avg_recent_views: Option<f64>, subscribers: Option<u64>) -> f64 {
    let (Some(views), Some(subs)) = (avg_recent_views, subscribers) else {
        return 1.0;
    };
    if views <= 0.0 || subs == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = views / (subs as f64).max(1.0);
    let mult = (ratio.clamp(0.05, 0.4) / 0.1).sqrt();
    mult.clamp(0.7, 1.3)
}

/// Returns the estimated CPM (min, max) in USD for the channel's audience.
#[must_use]
pub fn estimate_cpm_range(signals: &ChannelSignals<'_>) -> (f64, f64) {
    let (base_min, base_max) = pick_baseline_usd(signals.niche);
    let mult = region_multiplier(signals.country, signals.language)
        * seasonality_multiplier(signals.month)
        * engagement_scaler(signals.engagement_rate)
        * recency_scaler(signals.avg_recent_views, signals.subscribers);

    (round2(base_min * mult), round2(base_max * mult))
}

/// Returns the estimated RPM (min, max) in USD.
///
/// RPM runs below CPM due to fill rates and revenue splits; heuristic
/// 0.55–0.65 of the CPM range.
#[must_use]
pub fn estimate_rpm_range(signals: &ChannelSignals<'_>) -> (f64, f64) {
    let (cmin, cmax) = estimate_cpm_range(signals);
    (round2(cmin * 0.55), round2(cmax * 0.65))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
