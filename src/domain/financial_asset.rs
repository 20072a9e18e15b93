use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::domain::contains_pattern;
use crate::error::{DatabaseError, ValidationError};

/// Kind of instrument a value is denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinancialAssetType {
    Currency,
    Stock,
    Crypto,
}

impl FinancialAssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinancialAssetType::Currency => "currency",
            FinancialAssetType::Stock => "stock",
            FinancialAssetType::Crypto => "crypto",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim() {
            "currency" => Ok(FinancialAssetType::Currency),
            "stock" => Ok(FinancialAssetType::Stock),
            "crypto" => Ok(FinancialAssetType::Crypto),
            _ => Err(ValidationError::InvalidFormat("type".to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FinancialAsset {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFinancialAsset {
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub asset_type: FinancialAssetType,
}

/// Exact match on type, substring match on symbol and name
#[derive(Debug, Clone, Default)]
pub struct FinancialAssetFilter {
    pub asset_type: Option<FinancialAssetType>,
    pub symbol: Option<String>,
    pub name: Option<String>,
}

pub async fn create(pool: &PgPool, asset: &NewFinancialAsset) -> Result<FinancialAsset, DatabaseError> {
    let created = sqlx::query_as::<_, FinancialAsset>(
        r#"
        INSERT INTO financial_assets (symbol, name, description, asset_type)
        VALUES ($1, $2, $3, $4)
        RETURNING id, symbol, name, description, asset_type, created_at
        "#,
    )
    .bind(&asset.symbol)
    .bind(&asset.name)
    .bind(&asset.description)
    .bind(asset.asset_type.as_str())
    .fetch_one(pool)
    .await?;

    Ok(created)
}

pub async fn list(pool: &PgPool, filter: &FinancialAssetFilter) -> Result<Vec<FinancialAsset>, DatabaseError> {
    let assets = sqlx::query_as::<_, FinancialAsset>(
        r#"
        SELECT id, symbol, name, description, asset_type, created_at
        FROM financial_assets
        WHERE ($1::TEXT IS NULL OR asset_type = $1)
          AND ($2::TEXT IS NULL OR symbol ILIKE $2 ESCAPE '\')
          AND ($3::TEXT IS NULL OR name ILIKE $3 ESCAPE '\')
        ORDER BY symbol
        "#,
    )
    .bind(filter.asset_type.map(|t| t.as_str()))
    .bind(filter.symbol.as_deref().map(contains_pattern))
    .bind(filter.name.as_deref().map(contains_pattern))
    .fetch_all(pool)
    .await?;

    Ok(assets)
}
