/// User Store collaborator
///
/// The session core reads and writes identities only through this trait.
/// Lookups return `Ok(None)` when no record exists; `Err` always means the
/// store itself failed.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use crate::domain::user::{NewUser, User};
use crate::error::DatabaseError;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    /// Persist a new identity, failing with `UniqueConstraintViolation` if
    /// the email is taken
    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError>;
}

/// Process-local store for tests and local runs without Postgres
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<User>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.lock().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.lock().iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut users = self.lock();
        if users.iter().any(|u| u.email == user.email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let created = User {
            id: users.len() as i64 + 1,
            name: user.name,
            email: user.email,
            financial_asset_id: user.financial_asset_id,
            password_hash: user.credential.into_inner(),
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }
}
