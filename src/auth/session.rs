/// Session Service
///
/// Orchestrates signup, login, token refresh and "who am I" on top of the
/// hasher, issuer, verifier and the user store. Holds no per-session state:
/// each call is decided from the credentials or token it is given.

use std::fmt;
use std::sync::Arc;

use crate::auth::clock::Clock;
use crate::auth::jwt::{TokenError, TokenIssuer, TokenVerifier};
use crate::auth::password::{Credential, HashError, PasswordHasher};
use crate::auth::store::UserStore;
use crate::configuration::AuthSettings;
use crate::domain::user::{NewUser, User};
use crate::error::DatabaseError;

#[derive(Debug)]
pub enum SessionError {
    UserAlreadyExists,
    /// Unknown email or wrong password; the two are never told apart
    InvalidCredentials,
    InvalidToken(TokenError),
    IdentityMismatch,
    NotFound,
    Persistence(DatabaseError),
    Hash(HashError),
    TokenGeneration(TokenError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UserAlreadyExists => write!(f, "User already exists"),
            SessionError::InvalidCredentials => write!(f, "Invalid credentials"),
            SessionError::InvalidToken(e) => write!(f, "Invalid token: {}", e),
            SessionError::IdentityMismatch => {
                write!(f, "Token subject does not match the authenticated user")
            }
            SessionError::NotFound => write!(f, "User not found"),
            SessionError::Persistence(e) => write!(f, "{}", e),
            SessionError::Hash(e) => write!(f, "{}", e),
            SessionError::TokenGeneration(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<DatabaseError> for SessionError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueConstraintViolation(_) => SessionError::UserAlreadyExists,
            other => SessionError::Persistence(other),
        }
    }
}

impl From<HashError> for SessionError {
    fn from(err: HashError) -> Self {
        SessionError::Hash(err)
    }
}

/// Input for a new account
#[derive(Debug, Clone)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub financial_asset_id: i64,
}

/// Tokens handed out on login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct SessionService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    verifier: Arc<TokenVerifier>,
    // Verified against when the email is unknown so both login failures
    // cost one bcrypt verification
    decoy: Credential,
}

impl SessionService {
    /// Build the service and its token and hashing components from settings
    ///
    /// # Errors
    /// Returns error if the configured hash cost is rejected by bcrypt
    pub fn new(
        store: Arc<dyn UserStore>,
        config: &AuthSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, HashError> {
        let hasher = PasswordHasher::new(config.hash_cost);
        let decoy = hasher.hash("decoy-password-never-issued")?;

        Ok(Self {
            store,
            hasher,
            issuer: TokenIssuer::new(config, clock.clone()),
            verifier: Arc::new(TokenVerifier::new(config, clock)),
            decoy,
        })
    }

    pub fn verifier(&self) -> Arc<TokenVerifier> {
        self.verifier.clone()
    }

    pub fn refresh_token_expiry(&self) -> i64 {
        self.issuer.refresh_token_expiry()
    }

    /// Register a new user
    ///
    /// # Errors
    /// - `UserAlreadyExists` if the email is taken
    /// - `Hash` if the password cannot be hashed
    /// - `Persistence` if the store fails
    pub async fn signup(&self, signup: Signup) -> Result<User, SessionError> {
        if self.store.find_by_email(&signup.email).await?.is_some() {
            tracing::warn!("Signup attempted with an already registered email");
            return Err(SessionError::UserAlreadyExists);
        }

        let credential = self.hasher.hash(&signup.password)?;

        // A concurrent signup can still win the race; the store's unique
        // constraint turns that into UserAlreadyExists as well.
        let user = self
            .store
            .insert(NewUser {
                name: signup.name,
                email: signup.email,
                financial_asset_id: signup.financial_asset_id,
                credential,
            })
            .await?;

        tracing::info!(user_id = user.id, "User signed up");
        Ok(user)
    }

    /// Authenticate by email and password and issue both tokens
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, SessionError> {
        let user = match self.store.find_by_email(email).await? {
            Some(user) => user,
            None => {
                let _ = self.hasher.verify(password, &self.decoy);
                tracing::debug!("Login failed: unknown email");
                return Err(SessionError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(password, &user.credential())? {
            tracing::debug!(user_id = user.id, "Login failed: password mismatch");
            return Err(SessionError::InvalidCredentials);
        }

        let access_token = self
            .issuer
            .issue_access(user.id, &user.email)
            .map_err(SessionError::TokenGeneration)?;
        let refresh_token = self
            .issuer
            .issue_refresh(user.id)
            .map_err(SessionError::TokenGeneration)?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Mint a new access token from a refresh token bound to `expected_user_id`
    pub async fn refresh(&self, expected_user_id: i64, refresh_token: &str) -> Result<String, SessionError> {
        let claims = self
            .verifier
            .verify_refresh(refresh_token)
            .map_err(SessionError::InvalidToken)?;

        if claims.sub != expected_user_id {
            tracing::warn!(
                user_id = expected_user_id,
                token_subject = claims.sub,
                "Refresh token presented for a different user"
            );
            return Err(SessionError::IdentityMismatch);
        }

        // Reload so changes to the account since login are honoured
        let user = self.store.find_by_id(claims.sub).await?.ok_or_else(|| {
            tracing::warn!(user_id = claims.sub, "Refresh token subject no longer exists");
            SessionError::InvalidToken(TokenError::Invalid("unknown subject".to_string()))
        })?;

        let access_token = self
            .issuer
            .issue_access(user.id, &user.email)
            .map_err(SessionError::TokenGeneration)?;

        tracing::info!(user_id = user.id, "Access token refreshed");
        Ok(access_token)
    }

    /// Look up the authenticated user
    pub async fn get_self(&self, user_id: i64) -> Result<User, SessionError> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(SessionError::NotFound)
    }
}
