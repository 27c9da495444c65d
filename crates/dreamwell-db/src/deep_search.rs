//! Database operations for the `deep_search_cache` table.
//!
//! A row is the single source of truth for one video's analysis job:
//! `pending → processing → completed | failed`, with `failed` resettable to
//! `pending` for retry. Transitions are conditional UPDATEs guarded by the
//! current status, so a row can never skip or repeat a state.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// Lifecycle states of a deep-search job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeepSearchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DeepSearchStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeepSearchStatus::Pending => "pending",
            DeepSearchStatus::Processing => "processing",
            DeepSearchStatus::Completed => "completed",
            DeepSearchStatus::Failed => "failed",
        }
    }

    /// Parses the stored status string; unknown values map to `Failed` so a
    /// corrupted row is visibly broken rather than silently pending.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => DeepSearchStatus::Pending,
            "processing" => DeepSearchStatus::Processing,
            "completed" => DeepSearchStatus::Completed,
            _ => DeepSearchStatus::Failed,
        }
    }
}

/// A row from the `deep_search_cache` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeepSearchRow {
    pub id: i64,
    pub video_url: String,
    pub video_id: Option<String>,
    pub channel_id: Option<String>,
    /// Local scratch path while the job is in flight; cleared after cleanup.
    pub video_file_path: Option<String>,
    pub videoai_asset_id: Option<String>,
    pub summary: Option<String>,
    pub chapters: Option<serde_json::Value>,
    pub analysis: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeepSearchRow {
    #[must_use]
    pub fn status(&self) -> DeepSearchStatus {
        DeepSearchStatus::parse(&self.status)
    }
}

const DEEP_SEARCH_COLUMNS: &str =
    "id, video_url, video_id, channel_id, video_file_path, videoai_asset_id, \
     summary, chapters, analysis, status, error_message, created_at, updated_at";

// ---------------------------------------------------------------------------
// Claim / lookup
// ---------------------------------------------------------------------------

/// Atomically claims a new analysis job for a URL.
///
/// `INSERT .. ON CONFLICT DO NOTHING` on the `video_url` unique key: exactly
/// one of any set of concurrent first requests receives the new `pending` row
/// (`Some`), everyone else gets `None` and should read the existing row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn claim_analysis(
    pool: &PgPool,
    video_url: &str,
    video_id: Option<&str>,
    channel_id: Option<&str>,
) -> Result<Option<DeepSearchRow>, DbError> {
    let row = sqlx::query_as::<_, DeepSearchRow>(&format!(
        "INSERT INTO deep_search_cache (video_url, video_id, channel_id, status) \
         VALUES ($1, $2, $3, 'pending') \
         ON CONFLICT (video_url) DO NOTHING \
         RETURNING {DEEP_SEARCH_COLUMNS}"
    ))
    .bind(video_url)
    .bind(video_id)
    .bind(channel_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the cache row for a URL, or `None` if the video was never analyzed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_analysis_by_url(
    pool: &PgPool,
    video_url: &str,
) -> Result<Option<DeepSearchRow>, DbError> {
    let row = sqlx::query_as::<_, DeepSearchRow>(&format!(
        "SELECT {DEEP_SEARCH_COLUMNS} FROM deep_search_cache WHERE video_url = $1"
    ))
    .bind(video_url)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the cache row by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_analysis_by_id(pool: &PgPool, id: i64) -> Result<DeepSearchRow, DbError> {
    let row = sqlx::query_as::<_, DeepSearchRow>(&format!(
        "SELECT {DEEP_SEARCH_COLUMNS} FROM deep_search_cache WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` analyses, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_analyses(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<DeepSearchRow>, DbError> {
    let rows = sqlx::query_as::<_, DeepSearchRow>(&format!(
        "SELECT {DEEP_SEARCH_COLUMNS} FROM deep_search_cache \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Marks a `pending` job as `processing`.
///
/// # Errors
///
/// Returns [`DbError::InvalidDeepSearchTransition`] if the row was not in
/// `pending`, or [`DbError::Sqlx`] if the update fails.
pub async fn mark_processing(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE deep_search_cache \
         SET status = 'processing', updated_at = NOW() \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidDeepSearchTransition {
            id,
            expected_status: "pending",
        });
    }

    Ok(())
}

/// Records the downloaded file path and extracted video id on an in-flight row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_download_details(
    pool: &PgPool,
    id: i64,
    video_file_path: &str,
    video_id: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE deep_search_cache \
         SET video_file_path = $1, video_id = COALESCE($2, video_id), updated_at = NOW() \
         WHERE id = $3",
    )
    .bind(video_file_path)
    .bind(video_id)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Marks a `processing` job as `completed` and persists its results.
///
/// Also clears `video_file_path` (the local file is deleted by the runner)
/// and any stale `error_message` from an earlier failed attempt.
///
/// # Errors
///
/// Returns [`DbError::InvalidDeepSearchTransition`] if the row was not in
/// `processing`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_analysis(
    pool: &PgPool,
    id: i64,
    videoai_asset_id: &str,
    summary: &str,
    chapters: &serde_json::Value,
    analysis: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE deep_search_cache \
         SET status = 'completed', videoai_asset_id = $1, summary = $2, chapters = $3, \
             analysis = $4, error_message = NULL, video_file_path = NULL, updated_at = NOW() \
         WHERE id = $5 AND status = 'processing'",
    )
    .bind(videoai_asset_id)
    .bind(summary)
    .bind(chapters)
    .bind(analysis)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidDeepSearchTransition {
            id,
            expected_status: "processing",
        });
    }

    Ok(())
}

/// Marks an in-flight (`pending` or `processing`) job as `failed`.
///
/// A job can die before it ever reached `processing` (download refused,
/// validation inside the runner), so both in-flight states are accepted.
///
/// # Errors
///
/// Returns [`DbError::InvalidDeepSearchTransition`] if the row was already
/// terminal, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_analysis(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE deep_search_cache \
         SET status = 'failed', error_message = $1, video_file_path = NULL, updated_at = NOW() \
         WHERE id = $2 AND status IN ('pending', 'processing')",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidDeepSearchTransition {
            id,
            expected_status: "pending or processing",
        });
    }

    Ok(())
}

/// Resets a `failed` job back to `pending` for retry, clearing the error.
///
/// Returns the refreshed row.
///
/// # Errors
///
/// Returns [`DbError::InvalidDeepSearchTransition`] if the row was not in
/// `failed`, or [`DbError::Sqlx`] if the update fails.
pub async fn reset_failed_analysis(pool: &PgPool, id: i64) -> Result<DeepSearchRow, DbError> {
    let row = sqlx::query_as::<_, DeepSearchRow>(&format!(
        "UPDATE deep_search_cache \
         SET status = 'pending', error_message = NULL, updated_at = NOW() \
         WHERE id = $1 AND status = 'failed' \
         RETURNING {DEEP_SEARCH_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::InvalidDeepSearchTransition {
        id,
        expected_status: "failed",
    })?;

    Ok(row)
}
