//! The deep-search job runner.
//!
//! `analyze` drives one video through the cache state machine:
//! `pending → processing → completed | failed`. The cache row is claimed
//! atomically on the URL's unique key, a completed row short-circuits all
//! external calls, and an in-flight row is returned as-is so concurrent
//! requests never start a second download. Collaborator failures land in the
//! row as `failed` + `error_message`; the caller always gets a row back.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use sqlx::PgPool;

use crate::downloader::VideoDownloader;
use crate::error::DeepSearchError;
use crate::url::{extract_video_id, is_valid_video_url};
use crate::videoai::{Chapter, VideoAiClient};
use dreamwell_db::{DeepSearchRow, DeepSearchStatus};

/// Job-runner knobs, passed explicitly per call.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    pub download_dir: PathBuf,
    pub index_name: String,
    pub poll_interval: Duration,
    pub poll_max_attempts: u32,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("./downloads"),
            index_name: "dreamwell_index".to_owned(),
            poll_interval: Duration::from_secs(5),
            poll_max_attempts: 120,
        }
    }
}

/// Inputs for one analyze call.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeRequest<'a> {
    pub video_url: &'a str,
    pub channel_id: Option<&'a str>,
    pub custom_prompt: Option<&'a str>,
}

/// Analyzes a video URL, returning the cache row that describes the outcome.
///
/// Cache semantics:
/// - `completed` row → returned immediately, no external calls;
/// - `pending`/`processing` row → returned as-is, no second job;
/// - `failed` row → returned as-is; the retry endpoint restarts it;
/// - no row → the URL is claimed and the job runs inside this call.
///
/// # Errors
///
/// Returns [`DeepSearchError::InvalidVideoUrl`] for channel/playlist URLs
/// (no row is created) and [`DeepSearchError::Db`] for persistence failures.
/// Collaborator failures do NOT surface as errors; they are recorded on the
/// returned row as status `failed`.
pub async fn analyze<D: VideoDownloader>(
    pool: &PgPool,
    downloader: &D,
    videoai: &VideoAiClient,
    options: &RunnerOptions,
    request: AnalyzeRequest<'_>,
) -> Result<DeepSearchRow, DeepSearchError> {
    if !is_valid_video_url(request.video_url) {
        return Err(DeepSearchError::InvalidVideoUrl {
            url: request.video_url.to_owned(),
        });
    }

    if let Some(existing) = dreamwell_db::get_analysis_by_url(pool, request.video_url).await? {
        match existing.status() {
            DeepSearchStatus::Completed => {
                tracing::debug!(video_url = %request.video_url, "deep-search cache hit");
            }
            DeepSearchStatus::Pending | DeepSearchStatus::Processing => {
                tracing::debug!(
                    video_url = %request.video_url,
                    status = %existing.status,
                    "deep-search already in flight; not starting a second job"
                );
            }
            DeepSearchStatus::Failed => {
                tracing::debug!(
                    video_url = %request.video_url,
                    "previous deep-search failed; waiting for an explicit retry"
                );
            }
        }
        return Ok(existing);
    }

    let video_id = extract_video_id(request.video_url);
    match dreamwell_db::claim_analysis(
        pool,
        request.video_url,
        video_id.as_deref(),
        request.channel_id,
    )
    .await?
    {
        Some(row) => run_job(pool, downloader, videoai, options, row, request.custom_prompt).await,
        None => {
            // Lost the claim race to a concurrent request; report its row.
            dreamwell_db::get_analysis_by_url(pool, request.video_url)
                .await?
                .ok_or(DeepSearchError::Db(dreamwell_db::DbError::NotFound))
        }
    }
}

/// Retries a failed analysis by id.
///
/// # Errors
///
/// Returns [`DeepSearchError::Db`] with `NotFound` for an unknown id, or an
/// invalid-transition error when the row is not in `failed`.
pub async fn retry<D: VideoDownloader>(
    pool: &PgPool,
    downloader: &D,
    videoai: &VideoAiClient,
    options: &RunnerOptions,
    analysis_id: i64,
    custom_prompt: Option<&str>,
) -> Result<DeepSearchRow, DeepSearchError> {
    let row = dreamwell_db::get_analysis_by_id(pool, analysis_id).await?;
    let row = dreamwell_db::reset_failed_analysis(pool, row.id).await?;
    tracing::info!(video_url = %row.video_url, id = row.id, "retrying failed deep-search");
    run_job(pool, downloader, videoai, options, row, custom_prompt).await
}

async fn run_job<D: VideoDownloader>(
    pool: &PgPool,
    downloader: &D,
    videoai: &VideoAiClient,
    options: &RunnerOptions,
    row: DeepSearchRow,
    custom_prompt: Option<&str>,
) -> Result<DeepSearchRow, DeepSearchError> {
    let video_url = row.video_url.clone();
    tracing::info!(video_url = %video_url, id = row.id, "starting deep-search job");

    let file_path = match downloader.download(&video_url, &options.download_dir).await {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(video_url = %video_url, error = %e, "video download failed");
            dreamwell_db::fail_analysis(pool, row.id, &e.to_string()).await?;
            return Ok(dreamwell_db::get_analysis_by_id(pool, row.id).await?);
        }
    };

    let transition = async {
        dreamwell_db::set_download_details(
            pool,
            row.id,
            &file_path.to_string_lossy(),
            extract_video_id(&video_url).as_deref(),
        )
        .await?;
        dreamwell_db::mark_processing(pool, row.id).await
    }
    .await;
    if let Err(e) = transition {
        remove_scratch_file(&file_path).await;
        return Err(e.into());
    }

    let result = index_and_analyze(videoai, options, &file_path, custom_prompt).await;

    // The scratch file goes away on every exit path, success or failure.
    remove_scratch_file(&file_path).await;

    match result {
        Ok(outcome) => {
            let chapters = serde_json::to_value(&outcome.chapters)
                .unwrap_or_else(|_| serde_json::Value::Array(Vec::new()));
            dreamwell_db::complete_analysis(
                pool,
                row.id,
                &outcome.asset_id,
                &outcome.summary,
                &chapters,
                outcome.analysis.as_deref(),
            )
            .await?;
            tracing::info!(video_url = %video_url, id = row.id, "deep-search completed");
        }
        Err(e) => {
            tracing::warn!(video_url = %video_url, id = row.id, error = %e, "deep-search failed");
            dreamwell_db::fail_analysis(pool, row.id, &e.to_string()).await?;
        }
    }

    Ok(dreamwell_db::get_analysis_by_id(pool, row.id).await?)
}

async fn remove_scratch_file(file_path: &Path) {
    if let Err(e) = tokio::fs::remove_file(file_path).await {
        tracing::warn!(
            path = %file_path.display(),
            error = %e,
            "could not remove downloaded video"
        );
    }
}

struct IndexedAnalysis {
    asset_id: String,
    summary: String,
    chapters: Vec<Chapter>,
    analysis: Option<String>,
}

async fn index_and_analyze(
    videoai: &VideoAiClient,
    options: &RunnerOptions,
    file_path: &Path,
    custom_prompt: Option<&str>,
) -> Result<IndexedAnalysis, DeepSearchError> {
    let index_id = videoai.ensure_index(&options.index_name).await?;
    let task_id = videoai.create_index_task(&index_id, file_path).await?;
    let asset_id = videoai
        .wait_for_task(&task_id, options.poll_interval, options.poll_max_attempts)
        .await?;

    let summary = videoai.summarize(&asset_id).await?;
    let chapters = videoai.chapters(&asset_id).await?;
    let analysis = match custom_prompt {
        Some(prompt) => Some(videoai.analyze(&asset_id, prompt).await?),
        None => None,
    };

    Ok(IndexedAnalysis {
        asset_id,
        summary,
        chapters,
        analysis,
    })
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
