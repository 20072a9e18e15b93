/// JWT Token Generation and Validation
///
/// Access and refresh tokens are HS256-signed JWTs. Each kind is signed with
/// its own secret, so a token of one kind never verifies as the other.
/// Expiry is checked against an injected clock with no leeway.

use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

use crate::auth::claims::{AccessClaims, ExpiringClaims, RefreshClaims};
use crate::auth::clock::Clock;
use crate::configuration::AuthSettings;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token is not a structurally valid JWT
    Malformed(String),
    /// Well formed but the signature, algorithm, issuer or a required claim is wrong
    Invalid(String),
    /// Signature is valid but `exp` has passed
    Expired,
    /// Signing failed while issuing a token
    Generation(String),
}

impl TokenError {
    /// True for every outcome of the verification path
    pub fn is_validation(&self) -> bool {
        matches!(self, TokenError::Invalid(_) | TokenError::Expired)
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Malformed(msg) => write!(f, "malformed token: {}", msg),
            TokenError::Invalid(msg) => write!(f, "invalid token: {}", msg),
            TokenError::Expired => write!(f, "token has expired"),
            TokenError::Generation(msg) => write!(f, "token generation failed: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<JwtError> for TokenError {
    fn from(err: JwtError) -> Self {
        match err.kind() {
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
                TokenError::Malformed(err.to_string())
            }
            // Syntax errors mean the segment is not JSON at all; data errors
            // mean a claim or header field is missing or of the wrong type.
            ErrorKind::Json(json) if json.classify() != serde_json::error::Category::Data => {
                TokenError::Malformed(err.to_string())
            }
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(err.to_string()),
        }
    }
}

/// Builds and signs access and refresh tokens
pub struct TokenIssuer {
    access_key: EncodingKey,
    refresh_key: EncodingKey,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
    issuer: String,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(config: &AuthSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            access_key: EncodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_key: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
            issuer: config.issuer.clone(),
            clock,
        }
    }

    /// Generate a new access token for a user
    ///
    /// # Errors
    /// Returns `TokenError::Generation` if signing fails
    pub fn issue_access(&self, user_id: i64, email: &str) -> Result<String, TokenError> {
        let claims = AccessClaims::new(
            user_id,
            email.to_string(),
            self.clock.now(),
            self.access_token_expiry,
            self.issuer.clone(),
        );

        encode(&Header::new(ALGORITHM), &claims, &self.access_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Generate a new refresh token for a user
    pub fn issue_refresh(&self, user_id: i64) -> Result<String, TokenError> {
        let claims = RefreshClaims::new(
            user_id,
            self.clock.now(),
            self.refresh_token_expiry,
            self.issuer.clone(),
        );

        encode(&Header::new(ALGORITHM), &claims, &self.refresh_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn refresh_token_expiry(&self) -> i64 {
        self.refresh_token_expiry
    }
}

/// Parses and validates signed tokens
pub struct TokenVerifier {
    access_key: DecodingKey,
    refresh_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    pub fn new(config: &AuthSettings, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against the injected clock instead
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.set_issuer(&[&config.issuer]);

        Self {
            access_key: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_key: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            validation,
            clock,
        }
    }

    /// Validate and extract claims from an access token
    ///
    /// # Errors
    /// Returns error if token is malformed, tampered with, signed with a
    /// different algorithm or secret, or expired
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.decode_claims(token, &self.access_key)?;
        self.check_expiry(claims)
    }

    /// Validate an access token's signature and claims but not its expiry
    ///
    /// Used when an expired access token still has to identify its holder,
    /// as on the refresh endpoint.
    pub fn verify_access_allow_expired(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.decode_claims(token, &self.access_key)
    }

    /// Validate and extract claims from a refresh token
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = self.decode_claims(token, &self.refresh_key)?;
        self.check_expiry(claims)
    }

    fn decode_claims<T: DeserializeOwned>(&self, token: &str, key: &DecodingKey) -> Result<T, TokenError> {
        decode::<T>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation error: {}", e);
                TokenError::from(e)
            })
    }

    fn check_expiry<T: ExpiringClaims>(&self, claims: T) -> Result<T, TokenError> {
        if claims.is_expired_at(self.clock.now()) {
            tracing::debug!(user_id = claims.subject(), "Token expired");
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::FixedClock;
    use chrono::{Duration, Utc};

    fn get_test_config() -> AuthSettings {
        AuthSettings {
            access_secret: "test-access-secret-at-least-32-characters".to_string(),
            refresh_secret: "test-refresh-secret-at-least-32-characters".to_string(),
            access_token_expiry: 1800,
            refresh_token_expiry: 604800,
            issuer: "test".to_string(),
            refresh_cookie_name: "refresh_token".to_string(),
            hash_cost: 4,
        }
    }

    fn setup() -> (TokenIssuer, TokenVerifier, Arc<FixedClock>) {
        let config = get_test_config();
        let clock = Arc::new(FixedClock::new(Utc::now()));
        (
            TokenIssuer::new(&config, clock.clone()),
            TokenVerifier::new(&config, clock.clone()),
            clock,
        )
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let (issuer, verifier, _) = setup();

        let token = issuer.issue_access(42, "test@example.com").expect("Failed to generate token");
        let claims = verifier.verify_access(&token).expect("Failed to validate token");

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.iss, "test");
    }

    #[test]
    fn test_access_token_expires_after_thirty_minutes() {
        let (issuer, verifier, clock) = setup();
        let token = issuer.issue_access(1, "test@example.com").unwrap();

        clock.advance(Duration::minutes(29));
        assert!(verifier.verify_access(&token).is_ok());

        clock.advance(Duration::minutes(2));
        assert_eq!(verifier.verify_access(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expired_access_token_still_identifies_holder() {
        let (issuer, verifier, clock) = setup();
        let token = issuer.issue_access(5, "test@example.com").unwrap();

        clock.advance(Duration::hours(2));

        let claims = verifier.verify_access_allow_expired(&token).expect("Signature should still verify");
        assert_eq!(claims.sub, 5);
    }

    #[test]
    fn test_refresh_token_lives_seven_days() {
        let (issuer, verifier, clock) = setup();
        let token = issuer.issue_refresh(3).unwrap();

        clock.advance(Duration::days(7) - Duration::seconds(1));
        assert_eq!(verifier.verify_refresh(&token).unwrap().sub, 3);

        clock.advance(Duration::seconds(2));
        assert_eq!(verifier.verify_refresh(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tokens_cannot_be_cross_used() {
        let (issuer, verifier, _) = setup();
        let access = issuer.issue_access(1, "test@example.com").unwrap();
        let refresh = issuer.issue_refresh(1).unwrap();

        let err = verifier.verify_refresh(&access).unwrap_err();
        assert!(err.is_validation(), "unexpected error: {:?}", err);

        let err = verifier.verify_access(&refresh).unwrap_err();
        assert!(err.is_validation(), "unexpected error: {:?}", err);
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let (_, verifier, _) = setup();
        let result = verifier.verify_access("not-a-token");

        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_tampered_token() {
        let (issuer, verifier, _) = setup();
        let token = issuer.issue_access(1, "test@example.com").unwrap();

        // Tamper with token
        let tampered = format!("{}X", token);
        let result = verifier.verify_access(&tampered);

        assert!(result.is_err());
    }

    #[test]
    fn test_algorithm_substitution_rejected() {
        let config = get_test_config();
        let (_, verifier, _) = setup();
        let claims = AccessClaims::new(1, "test@example.com".to_string(), Utc::now(), 1800, "test".to_string());

        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(config.access_secret.as_bytes()),
        )
        .unwrap();

        let err = verifier.verify_access(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn test_unsigned_none_token_rejected() {
        let (_, verifier, _) = setup();
        // {"alg":"none","typ":"JWT"} . {"sub":1,"email":"a@x.com","exp":9999999999,"iat":0,"iss":"test"} . (empty)
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.\
                     eyJzdWIiOjEsImVtYWlsIjoiYUB4LmNvbSIsImV4cCI6OTk5OTk5OTk5OSwiaWF0IjowLCJpc3MiOiJ0ZXN0In0.";

        assert!(verifier.verify_access(token).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let mut config = get_test_config();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(Utc::now()));
        let token = TokenIssuer::new(&config, clock.clone()).issue_access(1, "test@example.com").unwrap();

        // Change issuer in validation config
        config.issuer = "wrong-issuer".to_string();
        let result = TokenVerifier::new(&config, clock).verify_access(&token);

        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_missing_claim_is_validation_error() {
        let config = get_test_config();
        let (_, verifier, _) = setup();
        let refresh_shaped = RefreshClaims::new(1, Utc::now(), 1800, "test".to_string());

        // Signed with the access secret but without the email claim
        let token = encode(
            &Header::new(ALGORITHM),
            &refresh_shaped,
            &EncodingKey::from_secret(config.access_secret.as_bytes()),
        )
        .unwrap();

        let err = verifier.verify_access(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)), "unexpected error: {:?}", err);
    }
}
