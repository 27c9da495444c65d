//! Sponsorship pricing and expected-profit estimates.
//!
//! Pricing starts from midpoint CPM per thousand views and applies tiered
//! multipliers for reach, engagement, and audience quality. Expected profit
//! models a conversion funnel from views to unit sales against the product's
//! per-unit profit, net of the partnership cost.

/// Floor for any partnership quote, USD.
const MIN_PRICING_USD: f64 = 50.0;

/// Base view-to-purchase conversion rate before multipliers.
const BASE_CONVERSION_RATE: f64 = 0.001;

/// Realistic ceiling on the adjusted conversion rate.
const MAX_CONVERSION_RATE: f64 = 0.05;

fn subscriber_multiplier(subscribers: Option<u64>) -> f64 {
    match subscribers {
        Some(s) if s >= 1_000_000 => 1.5,
        Some(s) if s >= 500_000 => 1.3,
        Some(s) if s >= 100_000 => 1.1,
        Some(s) if s >= 10_000 => 1.0,
        Some(_) => 0.8,
        None => 1.0,
    }
}

fn engagement_multiplier(engagement_rate: Option<f64>) -> f64 {
    match engagement_rate {
        Some(er) if er >= 0.1 => 1.4,
        Some(er) if er >= 0.05 => 1.2,
        Some(er) if er >= 0.02 => 1.0,
        Some(er) if er > 0.0 => 0.8,
        _ => 1.0,
    }
}

fn rpm_quality_multiplier(rpm_min: f64, rpm_max: f64) -> f64 {
    let avg_rpm = (rpm_min + rpm_max) / 2.0;
    if avg_rpm >= 5.0 {
        1.3
    } else if avg_rpm >= 2.0 {
        1.1
    } else {
        0.9
    }
}

/// Suggested partnership pricing (min, max) in USD.
///
/// Returns `(0, 0)` for channels without recent view data; there is nothing
/// to price against.
#[must_use]
pub fn suggested_pricing(
    cpm_range: (f64, f64),
    rpm_range: (f64, f64),
    avg_recent_views: f64,
    subscribers: Option<u64>,
    engagement_rate: Option<f64>,
) -> (f64, f64) {
    if avg_recent_views <= 0.0 {
        return (0.0, 0.0);
    }

    let base_per_1k_views = (cpm_range.0 + cpm_range.1) / 2.0;
    let base_pricing = (avg_recent_views / 1000.0) * base_per_1k_views;

    let adjusted = base_pricing
        * subscriber_multiplier(subscribers)
        * engagement_multiplier(engagement_rate)
        * rpm_quality_multiplier(rpm_range.0, rpm_range.1);

    let pricing_min = (adjusted * 0.8).max(MIN_PRICING_USD);
    let pricing_max = (adjusted * 1.2).max(pricing_min * 1.2);

    (round2(pricing_min), round2(pricing_max))
}

/// Expected profit (min, max) in USD for promoting a product on the channel.
///
/// Conversion-rate model: engagement, RPM-implied audience quality, and reach
/// scale a 0.1% base rate (capped at 5%); expected unit sales × per-unit
/// profit, minus the partnership cost range. Floored at break-even.
#[must_use]
pub fn expected_profit(
    product_profit: f64,
    rpm_range: (f64, f64),
    avg_recent_views: f64,
    subscribers: Option<u64>,
    engagement_rate: Option<f64>,
    pricing_range: Option<(f64, f64)>,
) -> (f64, f64) {
    if product_profit <= 0.0 || avg_recent_views <= 0.0 {
        return (0.0, 0.0);
    }

    let conversion_engagement = match engagement_rate {
        Some(er) if er >= 0.1 => 3.0,
        Some(er) if er >= 0.05 => 2.0,
        Some(er) if er >= 0.02 => 1.5,
        _ => 1.0,
    };
    let avg_rpm = (rpm_range.0 + rpm_range.1) / 2.0;
    let quality = if avg_rpm >= 5.0 {
        2.0
    } else if avg_rpm >= 2.0 {
        1.5
    } else {
        1.0
    };
    let reach = subscriber_multiplier(subscribers);

    let conversion_rate =
        (BASE_CONVERSION_RATE * conversion_engagement * quality * reach).min(MAX_CONVERSION_RATE);

    let expected_units_min = (avg_recent_views * conversion_rate * 0.8).floor();
    let expected_units_max = (avg_recent_views * conversion_rate * 1.2).floor();

    let revenue_min = expected_units_min * product_profit;
    let revenue_max = expected_units_max * product_profit;

    // Worst case pays the high quote, best case the low quote.
    let (profit_min, profit_max) = match pricing_range {
        Some((price_min, price_max)) => (revenue_min - price_max, revenue_max - price_min),
        None => (revenue_min, revenue_max),
    };

    let profit_min = profit_min.max(0.0);
    let profit_max = profit_max.max(profit_min);

    (round2(profit_min), round2(profit_max))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
