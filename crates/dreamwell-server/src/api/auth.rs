//! Account lifecycle: registration, login, and profile.

use std::sync::LazyLock;

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use dreamwell_db::UserRow;

use crate::middleware::{AuthUser, RequestId};
use crate::{password, token};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex")
});
static WEBSITE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.+\..+").expect("website regex"));

#[derive(Debug, Serialize)]
pub(super) struct UserDto {
    id: i64,
    email: String,
    company_name: Option<String>,
    website: String,
    keywords: Option<String>,
    country_code: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserDto {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            company_name: row.company_name,
            website: row.website,
            keywords: row.keywords,
            country_code: row.country_code,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SessionData {
    user: UserDto,
    access_token: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RegisterBody {
    email: String,
    password: String,
    #[serde(default)]
    company_name: Option<String>,
    website: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginBody {
    email: String,
    password: String,
}

/// Partial update body. Distinguishes "field absent" (leave unchanged) from
/// "field null" (clear the column) via the double-`Option` pattern.
#[derive(Debug, Deserialize)]
pub(super) struct ProfileUpdateBody {
    #[serde(default, deserialize_with = "double_option")]
    company_name: Option<Option<String>>,
    website: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    keywords: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    country_code: Option<Option<String>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

fn validation_error(request_id: String, message: &str) -> ApiError {
    ApiError::new(request_id, "validation_error", message)
}

fn validate_password(password: &str) -> Option<&'static str> {
    if password.len() < 8 {
        return Some("password must be at least 8 characters long");
    }
    if !password.chars().any(char::is_uppercase) {
        return Some("password must contain at least one uppercase letter");
    }
    if !password.chars().any(char::is_lowercase) {
        return Some("password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some("password must contain at least one number");
    }
    None
}

pub(super) async fn register(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<ApiResponse<SessionData>>), ApiError> {
    let email = body.email.trim().to_lowercase();
    let website = body.website.trim().to_owned();
    let company_name = body
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if email.is_empty() {
        return Err(validation_error(req_id.0, "email is required"));
    }
    if !EMAIL_RE.is_match(&email) {
        return Err(validation_error(req_id.0, "invalid email format"));
    }
    if website.is_empty() {
        return Err(validation_error(req_id.0, "website URL is required"));
    }
    if !WEBSITE_RE.is_match(&website) {
        return Err(validation_error(
            req_id.0,
            "please enter a valid website URL (e.g. https://yourcompany.com)",
        ));
    }
    if let Some(message) = validate_password(&body.password) {
        return Err(validation_error(req_id.0, message));
    }

    let password_hash = password::hash(&body.password);
    let user = dreamwell_db::insert_user(
        &state.pool,
        &dreamwell_db::NewUser {
            email: &email,
            password_hash: &password_hash,
            company_name,
            website: &website,
        },
    )
    .await
    .map_err(|e| {
        if e.is_unique_violation() {
            ApiError::new(req_id.0.clone(), "conflict", "email already registered")
        } else {
            map_db_error(req_id.0.clone(), &e)
        }
    })?;

    let access_token = token::mint(&state.config.jwt_secret, user.id, state.config.token_ttl_days);
    tracing::info!(user_id = user.id, "company registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: SessionData {
                user: user.into(),
                access_token,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginBody>,
) -> Result<Json<ApiResponse<SessionData>>, ApiError> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || body.password.is_empty() {
        return Err(validation_error(req_id.0, "email and password are required"));
    }

    let user = dreamwell_db::get_user_by_email(&state.pool, &email)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let Some(user) = user.filter(|u| password::verify(&body.password, &u.password_hash)) else {
        return Err(ApiError::new(
            req_id.0,
            "unauthorized",
            "invalid email or password",
        ));
    };
    if !user.is_active {
        return Err(ApiError::new(req_id.0, "unauthorized", "account is deactivated"));
    }

    let access_token = token::mint(&state.config.jwt_secret, user.id, state.config.token_ttl_days);

    Ok(Json(ApiResponse {
        data: SessionData {
            user: user.into(),
            access_token,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = dreamwell_db::get_user_by_id(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: user.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn update_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<ProfileUpdateBody>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if let Some(website) = body.website.as_deref() {
        if !WEBSITE_RE.is_match(website.trim()) {
            return Err(validation_error(
                req_id.0,
                "please enter a valid website URL (e.g. https://yourcompany.com)",
            ));
        }
    }

    let update = dreamwell_db::ProfileUpdate {
        company_name: body
            .company_name
            .as_ref()
            .map(|v| v.as_deref().map(str::trim).filter(|s| !s.is_empty())),
        website: body.website.as_deref().map(str::trim),
        keywords: body.keywords.as_ref().map(Option::as_deref),
        country_code: body.country_code.as_ref().map(Option::as_deref),
    };

    let user = dreamwell_db::update_user_profile(&state.pool, user_id, &update)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: user.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
