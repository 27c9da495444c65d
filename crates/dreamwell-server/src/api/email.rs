//! Outbound email triggers.

use std::sync::LazyLock;

use axum::{extract::State, Extension, Json};
use regex::Regex;
use serde::{Deserialize, Serialize};

use dreamwell_email::{render_notification, render_sponsor_outreach, SponsorOutreach};

use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, service_unavailable, ApiError, ApiResponse, AppState, ResponseMeta};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

#[derive(Debug, Serialize)]
pub(super) struct SendResult {
    sent: bool,
    message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SponsorEmailBody {
    to: String,
    influencer_name: String,
    product_id: Option<i64>,
    custom_message: Option<String>,
    suggested_pricing: Option<String>,
}

pub(super) async fn send_sponsor_email(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<SponsorEmailBody>,
) -> Result<Json<ApiResponse<SendResult>>, ApiError> {
    if !EMAIL_RE.is_match(body.to.trim()) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "recipient email address is invalid",
        ));
    }
    let Some(email) = state.email.as_deref() else {
        return Err(service_unavailable(req_id.0, "email sending"));
    };

    let user = dreamwell_db::get_user_by_id(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let company_name = user.company_name.unwrap_or_else(|| user.email.clone());

    let product_name = match body.product_id {
        Some(product_id) => {
            dreamwell_db::get_product_for_user(&state.pool, user_id, product_id)
                .await
                .map_err(|e| map_db_error(req_id.0.clone(), &e))?
                .name
        }
        None => "our product".to_owned(),
    };

    let (subject, html) = render_sponsor_outreach(&SponsorOutreach {
        influencer_name: &body.influencer_name,
        company_name: &company_name,
        product_name: &product_name,
        custom_message: body.custom_message.as_deref(),
        suggested_pricing: body.suggested_pricing.as_deref(),
    });

    let message_id = email
        .send(body.to.trim(), &subject, &html)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "sponsor email send failed");
            ApiError::new(req_id.0.clone(), "upstream_error", "email delivery failed")
        })?;

    Ok(Json(ApiResponse {
        data: SendResult {
            sent: true,
            message_id,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct NotificationBody {
    to: String,
    subject: String,
    message: String,
}

pub(super) async fn send_notification(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<NotificationBody>,
) -> Result<Json<ApiResponse<SendResult>>, ApiError> {
    if !EMAIL_RE.is_match(body.to.trim()) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "recipient email address is invalid",
        ));
    }
    if body.subject.trim().is_empty() || body.message.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "subject and message are required",
        ));
    }
    let Some(email) = state.email.as_deref() else {
        return Err(service_unavailable(req_id.0, "email sending"));
    };

    let (subject, html) = render_notification(body.subject.trim(), body.message.trim());
    let message_id = email
        .send(body.to.trim(), &subject, &html)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "notification send failed");
            ApiError::new(req_id.0.clone(), "upstream_error", "email delivery failed")
        })?;

    Ok(Json(ApiResponse {
        data: SendResult {
            sent: true,
            message_id,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
