use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::domain::contains_pattern;
use crate::error::{DatabaseError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Asset,
    Liability,
    Income,
    Expense,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Asset => "asset",
            CategoryType::Liability => "liability",
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim() {
            "asset" => Ok(CategoryType::Asset),
            "liability" => Ok(CategoryType::Liability),
            "income" => Ok(CategoryType::Income),
            "expense" => Ok(CategoryType::Expense),
            _ => Err(ValidationError::InvalidFormat("type".to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub category_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub category_type: CategoryType,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub category_type: Option<CategoryType>,
    pub name: Option<String>,
}

const DEFAULT_ASSET_CATEGORIES: &[(&str, &str)] = &[
    ("bank_accounts", "Liquid assets held in various bank accounts like checking and savings accounts."),
    ("cash", "Physical cash that you have on hand or easily accessible for daily expenses."),
    ("investments", "Assets with potential returns over time, including stocks, bonds, and mutual funds."),
    ("real_state", "Properties you own, including your primary residence and rental properties."),
    ("vehicles", "Various types of vehicles you own, such as cars, motorcycles, or boats."),
    ("personal_property", "Valuable possessions like jewelry, artwork, and collectibles."),
    ("intangible_assets", "Assets with no physical form, such as patents, copyrights, and trademarks."),
    ("business_assets", "Assets related to a business you own, including equipment and inventory."),
    ("retirement", "Accounts specifically for retirement savings, like 401(k) and IRAs."),
    ("digital_assets", "Digital assets stored electronically, such as cryptocurrencies and domain names."),
    ("others", "A catch-all category for miscellaneous or uncommon assets."),
];

/// Asset taxonomy inserted into an empty database
pub fn default_asset_categories() -> Vec<NewCategory> {
    DEFAULT_ASSET_CATEGORIES
        .iter()
        .map(|(name, description)| NewCategory {
            name: name.to_string(),
            description: description.to_string(),
            category_type: CategoryType::Asset,
        })
        .collect()
}

pub async fn create(pool: &PgPool, category: &NewCategory) -> Result<Category, DatabaseError> {
    let created = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (name, description, category_type)
        VALUES ($1, $2, $3)
        RETURNING id, name, description, category_type, created_at
        "#,
    )
    .bind(&category.name)
    .bind(&category.description)
    .bind(category.category_type.as_str())
    .fetch_one(pool)
    .await?;

    Ok(created)
}

pub async fn list(pool: &PgPool, filter: &CategoryFilter) -> Result<Vec<Category>, DatabaseError> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, description, category_type, created_at
        FROM categories
        WHERE ($1::TEXT IS NULL OR category_type = $1)
          AND ($2::TEXT IS NULL OR name ILIKE $2 ESCAPE '\')
        ORDER BY id
        "#,
    )
    .bind(filter.category_type.map(|t| t.as_str()))
    .bind(filter.name.as_deref().map(contains_pattern))
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

/// Insert the default asset categories unless some already exist
///
/// Returns the number of categories inserted.
pub async fn seed_defaults(pool: &PgPool) -> Result<usize, DatabaseError> {
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM categories WHERE category_type = $1",
    )
    .bind(CategoryType::Asset.as_str())
    .fetch_one(pool)
    .await?;

    if existing > 0 {
        tracing::debug!(existing, "Asset categories already seeded");
        return Ok(0);
    }

    let defaults = default_asset_categories();
    let mut tx = pool.begin().await?;
    for category in &defaults {
        sqlx::query("INSERT INTO categories (name, description, category_type) VALUES ($1, $2, $3)")
            .bind(&category.name)
            .bind(&category.description)
            .bind(category.category_type.as_str())
            .execute(&mut tx)
            .await?;
    }
    tx.commit().await?;

    tracing::info!(count = defaults.len(), "Seeded default asset categories");
    Ok(defaults.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_categories_are_assets() {
        let defaults = default_asset_categories();

        assert_eq!(defaults.len(), 11);
        assert!(defaults.iter().all(|c| c.category_type == CategoryType::Asset));
        assert!(defaults.iter().any(|c| c.name == "digital_assets"));
    }

    #[test]
    fn test_default_category_names_unique() {
        let defaults = default_asset_categories();
        let mut names: Vec<_> = defaults.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        names.dedup();

        assert_eq!(names.len(), defaults.len());
    }

    #[test]
    fn test_parse_category_type() {
        assert_eq!(CategoryType::parse("liability").unwrap(), CategoryType::Liability);
        assert!(CategoryType::parse("Liability").is_err());
        assert!(CategoryType::parse("equity").is_err());
    }
}
