//! Product CRUD and URL ingestion.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dreamwell_db::ProductRow;

use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, service_unavailable, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ProductDto {
    id: i64,
    user_id: i64,
    source_url: String,
    name: String,
    category: Option<String>,
    profit: Option<Decimal>,
    keywords: Option<String>,
    is_luxury: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductDto {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            source_url: row.source_url,
            name: row.name,
            category: row.category,
            profit: row.profit,
            keywords: row.keywords,
            is_luxury: row.is_luxury,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ListQuery {
    user_id: Option<i64>,
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<ProductDto>>>, ApiError> {
    if query.user_id.is_some_and(|requested| requested != user_id) {
        return Err(ApiError::new(
            req_id.0,
            "forbidden",
            "cannot list another company's products",
        ));
    }

    let rows = dreamwell_db::list_products_for_user(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(Into::into).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct IngestBody {
    url: String,
}

pub(super) async fn ingest_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<IngestBody>,
) -> Result<(StatusCode, Json<ApiResponse<ProductDto>>), ApiError> {
    let url = body.url.trim();
    if url.is_empty() {
        return Err(ApiError::new(req_id.0, "validation_error", "url is required"));
    }
    let Some(llm) = state.llm.as_deref() else {
        return Err(service_unavailable(req_id.0, "product extraction"));
    };

    // Best-effort page fetch; the extractor can still work URL-only.
    let html = match state.http.get(url).send().await {
        Ok(response) => response.text().await.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(url, error = %e, "product page fetch failed; extracting from URL only");
            String::new()
        }
    };

    let extraction = llm.extract_product(url, &html).await.map_err(|e| {
        tracing::warn!(url, error = %e, "product extraction failed");
        ApiError::new(
            req_id.0.clone(),
            "upstream_error",
            "could not extract product details from the page",
        )
    })?;

    let name = extraction
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| url.to_owned());
    let keywords = (!extraction.keywords.is_empty()).then(|| extraction.keywords.join(", "));
    let profit = extraction.estimated_profit.and_then(Decimal::from_f64_retain);

    let row = dreamwell_db::insert_product(
        &state.pool,
        user_id,
        url,
        &name,
        extraction.category.as_deref(),
        profit,
        keywords.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(user_id, product_id = row.id, "product ingested");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: row.into(),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// Partial edit body; double-`Option` distinguishes "absent" from "null".
#[derive(Debug, Deserialize)]
pub(super) struct ProductUpdateBody {
    name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    category: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    profit: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    keywords: Option<Option<String>>,
    is_luxury: Option<bool>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(product_id): Path<i64>,
    Json(body): Json<ProductUpdateBody>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    if body.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "name cannot be empty",
        ));
    }

    let profit = match body.profit {
        Some(Some(value)) => {
            let Some(decimal) = Decimal::from_f64_retain(value) else {
                return Err(ApiError::new(
                    req_id.0,
                    "validation_error",
                    "profit is not a representable amount",
                ));
            };
            Some(Some(decimal))
        }
        Some(None) => Some(None),
        None => None,
    };

    let update = dreamwell_db::ProductUpdate {
        name: body.name.as_deref().map(str::trim),
        category: body.category.as_ref().map(Option::as_deref),
        profit,
        keywords: body.keywords.as_ref().map(Option::as_deref),
        is_luxury: body.is_luxury,
    };

    let row = dreamwell_db::update_product(&state.pool, user_id, product_id, &update)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
