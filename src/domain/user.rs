use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::auth::{Credential, UserStore};
use crate::error::DatabaseError;

/// Stored identity, including its password hash
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub financial_asset_id: i64,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn credential(&self) -> Credential {
        Credential::from_hash(self.password_hash.clone())
    }
}

/// Identity to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub financial_asset_id: i64,
    pub credential: Credential,
}

const USER_COLUMNS: &str =
    "id, name, email, financial_asset_id, password_hash, created_at, updated_at";

/// `UserStore` backed by the `users` table
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Error querying the user by email");
                DatabaseError::from(e)
            })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = id, "Error querying the user by id");
                DatabaseError::from(e)
            })
    }

    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError> {
        let query = format!(
            r#"
            INSERT INTO users (name, email, financial_asset_id, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.financial_asset_id)
            .bind(user.credential.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let err = DatabaseError::from(e);
                if !matches!(err, DatabaseError::UniqueConstraintViolation(_)) {
                    tracing::error!(error = %err, "Error creating the user");
                }
                err
            })
    }
}
