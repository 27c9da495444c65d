//! Deep-search endpoints: analyze, status, history, retry.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use dreamwell_db::DeepSearchRow;
use dreamwell_deepsearch::{prompt, AnalyzeRequest, DeepSearchError, RunnerOptions};

use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, service_unavailable, ApiError, ApiResponse, AppState, ResponseMeta};

const HISTORY_LIMIT: i64 = 50;

/// Cache row as exposed to the UI; the local scratch path stays internal.
#[derive(Debug, Serialize)]
pub(super) struct AnalysisDto {
    id: i64,
    video_url: String,
    video_id: Option<String>,
    channel_id: Option<String>,
    videoai_asset_id: Option<String>,
    summary: Option<String>,
    chapters: Option<serde_json::Value>,
    analysis: Option<String>,
    status: String,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DeepSearchRow> for AnalysisDto {
    fn from(row: DeepSearchRow) -> Self {
        Self {
            id: row.id,
            video_url: row.video_url,
            video_id: row.video_id,
            channel_id: row.channel_id,
            videoai_asset_id: row.videoai_asset_id,
            summary: row.summary,
            chapters: row.chapters,
            analysis: row.analysis,
            status: row.status,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeBody {
    video_url: String,
    channel_id: Option<String>,
    product_id: Option<i64>,
    influencer_name: Option<String>,
    custom_prompt: Option<String>,
}

fn runner_options(state: &AppState) -> RunnerOptions {
    RunnerOptions {
        download_dir: state.config.download_dir.clone(),
        index_name: "dreamwell_index".to_owned(),
        poll_interval: std::time::Duration::from_secs(state.config.videoai_poll_interval_secs),
        poll_max_attempts: state.config.videoai_poll_max_attempts,
    }
}

fn map_deep_search_error(request_id: String, error: DeepSearchError) -> ApiError {
    match error {
        DeepSearchError::InvalidVideoUrl { .. } => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        DeepSearchError::Db(dreamwell_db::DbError::NotFound) => {
            ApiError::new(request_id, "not_found", "analysis not found")
        }
        DeepSearchError::Db(dreamwell_db::DbError::InvalidDeepSearchTransition { .. }) => {
            ApiError::new(
                request_id,
                "bad_request",
                "analysis is not in a retryable state",
            )
        }
        DeepSearchError::Db(e) => map_db_error(request_id, &e),
        other => {
            // The runner records collaborator failures on the row; anything
            // that still escapes is unexpected.
            tracing::error!(error = %other, "deep search failed unexpectedly");
            ApiError::new(request_id, "internal_error", "deep search failed")
        }
    }
}

pub(super) async fn analyze_video(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<AnalyzeBody>,
) -> Result<Json<ApiResponse<AnalysisDto>>, ApiError> {
    let video_url = body.video_url.trim();
    if video_url.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "video_url is required",
        ));
    }
    let Some(videoai) = state.videoai.as_deref() else {
        return Err(service_unavailable(req_id.0, "deep search"));
    };

    let product = match body.product_id {
        Some(product_id) => Some(
            dreamwell_db::get_product_for_user(&state.pool, user_id, product_id)
                .await
                .map_err(|e| map_db_error(req_id.0.clone(), &e))?,
        ),
        None => None,
    };

    // Without an explicit prompt, analyze with the standard influencer
    // brief when a product gives us something to aim at.
    let composed_prompt = match (&body.custom_prompt, &product) {
        (Some(custom), _) => Some(custom.clone()),
        (None, Some(product)) => Some(prompt::influencer_analysis(
            body.influencer_name.as_deref().unwrap_or("this creator"),
            Some(&product.name),
        )),
        (None, None) => None,
    };

    let row = dreamwell_deepsearch::analyze(
        &state.pool,
        state.downloader.as_ref(),
        videoai,
        &runner_options(&state),
        AnalyzeRequest {
            video_url,
            channel_id: body.channel_id.as_deref(),
            custom_prompt: composed_prompt.as_deref(),
        },
    )
    .await
    .map_err(|e| map_deep_search_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(video_url): Path<String>,
) -> Result<Json<ApiResponse<AnalysisDto>>, ApiError> {
    let decoded = percent_decode_str(&video_url)
        .decode_utf8()
        .map_err(|_| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                "video_url is not valid percent-encoded UTF-8",
            )
        })?
        .into_owned();

    let row = dreamwell_db::get_analysis_by_url(&state.pool, &decoded)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    match row {
        Some(row) => Ok(Json(ApiResponse {
            data: row.into(),
            meta: ResponseMeta::new(req_id.0),
        })),
        None => Err(ApiError::new(
            req_id.0,
            "not_found",
            "no analysis found for this video",
        )),
    }
}

pub(super) async fn history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<AnalysisDto>>>, ApiError> {
    let rows = dreamwell_db::list_recent_analyses(&state.pool, HISTORY_LIMIT)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(Into::into).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn retry_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(analysis_id): Path<i64>,
) -> Result<Json<ApiResponse<AnalysisDto>>, ApiError> {
    let Some(videoai) = state.videoai.as_deref() else {
        return Err(service_unavailable(req_id.0, "deep search"));
    };

    let row = dreamwell_deepsearch::retry(
        &state.pool,
        state.downloader.as_ref(),
        videoai,
        &runner_options(&state),
        analysis_id,
        None,
    )
    .await
    .map_err(|e| map_deep_search_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
