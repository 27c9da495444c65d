//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub user_id: i64,
    pub source_url: String,
    pub name: String,
    pub category: Option<String>,
    /// Estimated profit per unit sold, USD. Drives expected-profit estimates.
    pub profit: Option<Decimal>,
    pub keywords: Option<String>,
    pub is_luxury: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable product fields; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate<'a> {
    pub name: Option<&'a str>,
    pub category: Option<Option<&'a str>>,
    pub profit: Option<Option<Decimal>>,
    pub keywords: Option<Option<&'a str>>,
    pub is_luxury: Option<bool>,
}

const PRODUCT_COLUMNS: &str =
    "id, user_id, source_url, name, category, profit, keywords, is_luxury, \
     created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a product for a user and returns the created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_product(
    pool: &PgPool,
    user_id: i64,
    source_url: &str,
    name: &str,
    category: Option<&str>,
    profit: Option<Decimal>,
    keywords: Option<&str>,
) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products (user_id, source_url, name, category, profit, keywords) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(user_id)
    .bind(source_url)
    .bind(name)
    .bind(category)
    .bind(profit)
    .bind(keywords)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns all products owned by a user, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns one product, scoped to its owning user.
///
/// Ownership is part of the lookup so a caller can never read another
/// company's product by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such row exists for this user, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_product_for_user(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND user_id = $2"
    ))
    .bind(product_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Applies a partial edit to a product and returns the refreshed row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product does not exist for this user,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn update_product(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
    update: &ProductUpdate<'_>,
) -> Result<ProductRow, DbError> {
    let current = get_product_for_user(pool, user_id, product_id).await?;

    let name = update.name.map_or(current.name.clone(), ToOwned::to_owned);
    let category = match update.category {
        Some(v) => v.map(ToOwned::to_owned),
        None => current.category.clone(),
    };
    let profit = match update.profit {
        Some(v) => v,
        None => current.profit,
    };
    let keywords = match update.keywords {
        Some(v) => v.map(ToOwned::to_owned),
        None => current.keywords.clone(),
    };
    let is_luxury = update.is_luxury.unwrap_or(current.is_luxury);

    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "UPDATE products \
         SET name = $1, category = $2, profit = $3, keywords = $4, is_luxury = $5, \
             updated_at = NOW() \
         WHERE id = $6 AND user_id = $7 \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(name)
    .bind(category)
    .bind(profit)
    .bind(keywords)
    .bind(is_luxury)
    .bind(product_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
