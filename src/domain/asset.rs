use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::domain::contains_pattern;
use crate::error::DatabaseError;

/// Something of value a user owns, denominated in a financial asset
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    pub value: f64,
    pub description: String,
    #[serde(rename = "fin_asset_id")]
    pub financial_asset_id: i64,
    pub category_id: Option<i64>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAsset {
    pub name: String,
    pub value: f64,
    pub description: String,
    pub financial_asset_id: i64,
    pub category_id: Option<i64>,
}

/// Fields left as `None` keep their stored value
#[derive(Debug, Clone, Default)]
pub struct AssetChanges {
    pub name: Option<String>,
    pub value: Option<f64>,
    pub description: Option<String>,
    pub financial_asset_id: Option<i64>,
    pub category_id: Option<i64>,
}

impl AssetChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.value.is_none()
            && self.description.is_none()
            && self.financial_asset_id.is_none()
            && self.category_id.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub financial_asset_id: Option<i64>,
    pub category_id: Option<i64>,
    pub name: Option<String>,
}

const ASSET_COLUMNS: &str =
    "id, name, value, description, financial_asset_id, category_id, user_id, created_at, updated_at";

pub async fn create(pool: &PgPool, user_id: i64, asset: &NewAsset) -> Result<Asset, DatabaseError> {
    let query = format!(
        r#"
        INSERT INTO assets (name, value, description, financial_asset_id, category_id, user_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {}
        "#,
        ASSET_COLUMNS
    );
    let created = sqlx::query_as::<_, Asset>(&query)
        .bind(&asset.name)
        .bind(asset.value)
        .bind(&asset.description)
        .bind(asset.financial_asset_id)
        .bind(asset.category_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(created)
}

/// Assets owned by `user_id` matching `filter`
pub async fn list(pool: &PgPool, user_id: i64, filter: &AssetFilter) -> Result<Vec<Asset>, DatabaseError> {
    let query = format!(
        r#"
        SELECT {}
        FROM assets
        WHERE user_id = $1
          AND ($2::BIGINT IS NULL OR financial_asset_id = $2)
          AND ($3::BIGINT IS NULL OR category_id = $3)
          AND ($4::TEXT IS NULL OR name ILIKE $4 ESCAPE '\')
        ORDER BY id
        "#,
        ASSET_COLUMNS
    );
    let assets = sqlx::query_as::<_, Asset>(&query)
        .bind(user_id)
        .bind(filter.financial_asset_id)
        .bind(filter.category_id)
        .bind(filter.name.as_deref().map(contains_pattern))
        .fetch_all(pool)
        .await?;

    Ok(assets)
}

pub async fn find(pool: &PgPool, user_id: i64, asset_id: i64) -> Result<Option<Asset>, DatabaseError> {
    let query = format!("SELECT {} FROM assets WHERE id = $1 AND user_id = $2", ASSET_COLUMNS);
    let asset = sqlx::query_as::<_, Asset>(&query)
        .bind(asset_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(asset)
}

/// Apply `changes` to an asset owned by `user_id`; `None` if there is no such asset
pub async fn update(
    pool: &PgPool,
    user_id: i64,
    asset_id: i64,
    changes: &AssetChanges,
) -> Result<Option<Asset>, DatabaseError> {
    let query = format!(
        r#"
        UPDATE assets
        SET name = COALESCE($3, name),
            value = COALESCE($4, value),
            description = COALESCE($5, description),
            financial_asset_id = COALESCE($6, financial_asset_id),
            category_id = COALESCE($7, category_id),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING {}
        "#,
        ASSET_COLUMNS
    );
    let asset = sqlx::query_as::<_, Asset>(&query)
        .bind(asset_id)
        .bind(user_id)
        .bind(changes.name.as_deref())
        .bind(changes.value)
        .bind(changes.description.as_deref())
        .bind(changes.financial_asset_id)
        .bind(changes.category_id)
        .fetch_optional(pool)
        .await?;

    Ok(asset)
}

/// Returns false when no asset with that id belongs to `user_id`
pub async fn delete(pool: &PgPool, user_id: i64, asset_id: i64) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM assets WHERE id = $1 AND user_id = $2")
        .bind(asset_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
