//! Database operations for the `scoring_weights` table.

use dreamwell_core::ScoringWeights;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
struct WeightsRow {
    values_weight: f64,
    cultural_weight: f64,
    cpm_weight: f64,
    rpm_weight: f64,
    views_subs_weight: f64,
}

impl From<WeightsRow> for ScoringWeights {
    fn from(row: WeightsRow) -> Self {
        Self {
            values: row.values_weight,
            cultural: row.cultural_weight,
            cpm: row.cpm_weight,
            rpm: row.rpm_weight,
            views_to_subs: row.views_subs_weight,
        }
    }
}

/// Returns the user's saved weight vector, or the evenly-weighted default
/// when no row exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_weights_for_user(pool: &PgPool, user_id: i64) -> Result<ScoringWeights, DbError> {
    let row = sqlx::query_as::<_, WeightsRow>(
        "SELECT values_weight, cultural_weight, cpm_weight, rpm_weight, views_subs_weight \
         FROM scoring_weights \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map_or_else(ScoringWeights::default, Into::into))
}

/// Saves the user's weight vector, replacing any previous one.
///
/// Conflicts on `user_id` update all five fractions and `updated_at` in place.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_weights(
    pool: &PgPool,
    user_id: i64,
    weights: &ScoringWeights,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO scoring_weights \
             (user_id, values_weight, cultural_weight, cpm_weight, rpm_weight, views_subs_weight) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (user_id) DO UPDATE SET \
             values_weight     = EXCLUDED.values_weight, \
             cultural_weight   = EXCLUDED.cultural_weight, \
             cpm_weight        = EXCLUDED.cpm_weight, \
             rpm_weight        = EXCLUDED.rpm_weight, \
             views_subs_weight = EXCLUDED.views_subs_weight, \
             updated_at        = NOW()",
    )
    .bind(user_id)
    .bind(weights.values)
    .bind(weights.cultural)
    .bind(weights.cpm)
    .bind(weights.rpm)
    .bind(weights.views_to_subs)
    .execute(pool)
    .await?;

    Ok(())
}
