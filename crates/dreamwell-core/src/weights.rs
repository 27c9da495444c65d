//! Per-company scoring-weight vector.

use serde::{Deserialize, Serialize};

/// The five factor weights applied when blending sub-scores into a composite.
///
/// Each weight is a fraction; the UI enforces that the five sum to 1.0 before
/// saving, and the stored values are trusted on read. [`ScoringWeights::default`]
/// is the evenly-weighted fallback used when a company has never saved weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub values: f64,
    pub cultural: f64,
    pub cpm: f64,
    pub rpm: f64,
    pub views_to_subs: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            values: 0.2,
            cultural: 0.2,
            cpm: 0.2,
            rpm: 0.2,
            views_to_subs: 0.2,
        }
    }
}

impl ScoringWeights {
    /// Sum of the five fractions. Interpretable composites require ~1.0.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.values + self.cultural + self.cpm + self.rpm + self.views_to_subs
    }

    /// Whether the weight vector is usable: every fraction non-negative and
    /// the total within a small tolerance of 1.0.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        let non_negative = [
            self.values,
            self.cultural,
            self.cpm,
            self.rpm,
            self.views_to_subs,
        ]
        .iter()
        .all(|w| *w >= 0.0);
        non_negative && (self.total() - 1.0).abs() < 1e-6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_are_normalized() {
        assert!(ScoringWeights::default().is_normalized());
    }

    #[test]
    fn skewed_but_summing_weights_are_normalized() {
        let w = ScoringWeights {
            values: 0.2,
            cultural: 0.1,
            cpm: 0.2,
            rpm: 0.2,
            views_to_subs: 0.3,
        };
        assert!(w.is_normalized());
    }

    #[test]
    fn short_sum_is_not_normalized() {
        let w = ScoringWeights {
            values: 0.2,
            cultural: 0.1,
            cpm: 0.2,
            rpm: 0.2,
            views_to_subs: 0.2,
        };
        assert!(!w.is_normalized());
    }

    #[test]
    fn negative_weight_is_not_normalized() {
        let w = ScoringWeights {
            values: -0.2,
            cultural: 0.3,
            cpm: 0.3,
            rpm: 0.3,
            views_to_subs: 0.3,
        };
        assert!(!w.is_normalized());
    }
}
