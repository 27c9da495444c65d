//! Per-company scoring-weight configuration.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use dreamwell_core::ScoringWeights;

use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

pub(super) async fn get_weights(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<ApiResponse<ScoringWeights>>, ApiError> {
    let weights = dreamwell_db::get_weights_for_user(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: weights,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct WeightsBody {
    values: f64,
    cultural: f64,
    cpm: f64,
    rpm: f64,
    views_to_subs: f64,
}

pub(super) async fn save_weights(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<WeightsBody>,
) -> Result<Json<ApiResponse<ScoringWeights>>, ApiError> {
    let weights = ScoringWeights {
        values: body.values,
        cultural: body.cultural,
        cpm: body.cpm,
        rpm: body.rpm,
        views_to_subs: body.views_to_subs,
    };

    // The UI enforces the sum-to-1.0 contract; stored values are trusted on
    // read, so an off vector is worth a log line but not a rejection.
    if !weights.is_normalized() {
        tracing::warn!(
            user_id,
            total = weights.total(),
            "saving scoring weights that do not sum to 1.0"
        );
    }

    dreamwell_db::upsert_weights(&state.pool, user_id, &weights)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: weights,
        meta: ResponseMeta::new(req_id.0),
    }))
}
