//! Influencer search endpoint.

use axum::{extract::State, Extension, Json};
use chrono::{Datelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

use dreamwell_match::{run_influencer_search, CompanyProfile, ProductContext, SearchOptions};

use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, service_unavailable, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SearchBody {
    keywords: Vec<String>,
    user_id: Option<i64>,
    product_id: Option<i64>,
}

pub(super) async fn search_influencers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<SearchBody>,
) -> Result<Json<ApiResponse<dreamwell_match::SearchOutcome>>, ApiError> {
    if body.user_id.is_some_and(|requested| requested != user_id) {
        return Err(ApiError::new(
            req_id.0,
            "forbidden",
            "cannot search on behalf of another company",
        ));
    }

    let keywords: Vec<String> = body
        .keywords
        .iter()
        .map(|k| k.trim().to_owned())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "at least one keyword is required",
        ));
    }

    let Some(youtube) = state.youtube.as_deref() else {
        return Err(service_unavailable(req_id.0, "influencer search"));
    };

    let user = dreamwell_db::get_user_by_id(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let weights = dreamwell_db::get_weights_for_user(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let product = match body.product_id {
        Some(product_id) => {
            let row = dreamwell_db::get_product_for_user(&state.pool, user_id, product_id)
                .await
                .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
            Some(ProductContext {
                name: row.name,
                profit: row.profit.as_ref().and_then(ToPrimitive::to_f64),
                is_luxury: row.is_luxury,
            })
        }
        None => None,
    };

    let company = CompanyProfile {
        keywords: user
            .keywords
            .as_deref()
            .map(dreamwell_core::split_keywords)
            .unwrap_or_default(),
        country: user.country_code.clone(),
    };

    let options = SearchOptions {
        channels_per_keyword: state.config.search_channels_per_keyword,
        recent_video_cap: state.config.search_recent_video_cap,
        max_concurrent_candidates: state.config.search_max_concurrent_candidates,
        region: user.country_code,
        relevance_language: Some("en".to_owned()),
        cache_ttl_hours: state.config.search_cache_ttl_hours,
        month: Some(Utc::now().month()),
    };

    let outcome = run_influencer_search(
        youtube,
        state.judge.as_ref(),
        Some(&state.pool),
        &options,
        &keywords,
        &weights,
        &company,
        product.as_ref(),
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "influencer search unavailable");
        ApiError::new(
            req_id.0.clone(),
            "service_unavailable",
            "influencer search is temporarily unavailable",
        )
    })?;

    tracing::info!(
        user_id,
        keywords = keywords.len(),
        results = outcome.count,
        "influencer search completed"
    );

    Ok(Json(ApiResponse {
        data: outcome,
        meta: ResponseMeta::new(req_id.0),
    }))
}
