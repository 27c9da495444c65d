//! Database operations for the `users` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub company_name: Option<String>,
    pub website: String,
    /// Comma-separated brand keywords; parsed via `dreamwell_core::split_keywords`.
    pub keywords: Option<String>,
    pub country_code: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to register a company account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub company_name: Option<&'a str>,
    pub website: &'a str,
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate<'a> {
    pub company_name: Option<Option<&'a str>>,
    pub website: Option<&'a str>,
    pub keywords: Option<Option<&'a str>>,
    pub country_code: Option<Option<&'a str>>,
}

const USER_COLUMNS: &str = "id, email, password_hash, company_name, website, keywords, \
                            country_code, is_active, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a new user and returns the created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails; a duplicate email surfaces
/// as a unique violation (see [`DbError::is_unique_violation`]).
pub async fn insert_user(pool: &PgPool, user: &NewUser<'_>) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (email, password_hash, company_name, website) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.company_name)
    .bind(user.website)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a user by email, or `None` if not registered.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns a user by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_user_by_id(pool: &PgPool, id: i64) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Applies a partial profile update and returns the refreshed row.
///
/// Uses COALESCE-free explicit branching: only fields present in the update
/// are written, so a caller can clear a nullable column by passing
/// `Some(None)`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the user does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_user_profile(
    pool: &PgPool,
    id: i64,
    update: &ProfileUpdate<'_>,
) -> Result<UserRow, DbError> {
    let current = get_user_by_id(pool, id).await?;

    let company_name = match update.company_name {
        Some(v) => v.map(ToOwned::to_owned),
        None => current.company_name.clone(),
    };
    let website = match update.website {
        Some(v) => v.to_owned(),
        None => current.website.clone(),
    };
    let keywords = match update.keywords {
        Some(v) => v.map(ToOwned::to_owned),
        None => current.keywords.clone(),
    };
    let country_code = match update.country_code {
        Some(v) => v.map(ToOwned::to_owned),
        None => current.country_code.clone(),
    };

    let row = sqlx::query_as::<_, UserRow>(&format!(
        "UPDATE users \
         SET company_name = $1, website = $2, keywords = $3, country_code = $4, \
             updated_at = NOW() \
         WHERE id = $5 \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(company_name)
    .bind(website)
    .bind(keywords)
    .bind(country_code)
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
