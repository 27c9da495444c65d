//! Database operations for the `search_cache` table.
//!
//! Caches raw YouTube search responses per normalized keyword string so
//! repeat searches within the TTL window do not spend API quota.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::DbError;

/// Returns cached results for a keyword/search-type pair if a non-expired row
/// exists. Expired rows are left in place for the scheduled purge.
///
/// Keywords are normalized (trimmed, lowercased) so cache hits are
/// case-insensitive.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_fresh_search_results(
    pool: &PgPool,
    keywords: &str,
    search_type: &str,
) -> Result<Option<serde_json::Value>, DbError> {
    let normalized = normalize_keywords(keywords);

    let row = sqlx::query_scalar::<_, serde_json::Value>(
        "SELECT results FROM search_cache \
         WHERE keywords = $1 AND search_type = $2 AND expires_at > NOW()",
    )
    .bind(normalized)
    .bind(search_type)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Stores (or replaces) cached results for a keyword/search-type pair with
/// the given TTL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn store_search_results(
    pool: &PgPool,
    keywords: &str,
    search_type: &str,
    results: &serde_json::Value,
    ttl_hours: i64,
) -> Result<(), DbError> {
    let normalized = normalize_keywords(keywords);
    let expires_at = Utc::now() + Duration::hours(ttl_hours.max(0));

    sqlx::query(
        "INSERT INTO search_cache (keywords, search_type, results, expires_at) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (keywords, search_type) DO UPDATE SET \
             results    = EXCLUDED.results, \
             expires_at = EXCLUDED.expires_at, \
             created_at = NOW()",
    )
    .bind(normalized)
    .bind(search_type)
    .bind(results)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Deletes all expired cache rows. Returns the number removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn purge_expired_search_cache(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM search_cache WHERE expires_at <= NOW()")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

fn normalize_keywords(raw: &str) -> String {
    raw.trim().to_lowercase()
}
