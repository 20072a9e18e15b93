/// JWT Claims structures
///
/// Access tokens carry the subject id and email; refresh tokens carry only
/// the subject id. Both follow the registered claim names of RFC 7519.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims for short-lived access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (numeric user id)
    pub sub: i64,
    /// User email
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

/// Claims for long-lived refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    pub sub: i64,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

/// Read access to the registered claims shared by both token kinds
pub trait ExpiringClaims {
    fn subject(&self) -> i64;
    fn expires_at(&self) -> i64;

    /// A token is expired once `now` is past its `exp`
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.expires_at()
    }
}

impl AccessClaims {
    pub fn new(user_id: i64, email: String, now: DateTime<Utc>, expiry_seconds: i64, issuer: String) -> Self {
        let iat = now.timestamp();
        Self {
            sub: user_id,
            email,
            exp: iat + expiry_seconds,
            iat,
            iss: issuer,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.sub
    }
}

impl RefreshClaims {
    pub fn new(user_id: i64, now: DateTime<Utc>, expiry_seconds: i64, issuer: String) -> Self {
        let iat = now.timestamp();
        Self {
            sub: user_id,
            exp: iat + expiry_seconds,
            iat,
            iss: issuer,
        }
    }
}

impl ExpiringClaims for AccessClaims {
    fn subject(&self) -> i64 {
        self.sub
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}

impl ExpiringClaims for RefreshClaims {
    fn subject(&self) -> i64 {
        self.sub
    }

    fn expires_at(&self) -> i64 {
        self.exp
    }
}
