/// Password Hashing and Verification
///
/// Handles one-way password hashing with bcrypt. The salt is embedded in
/// the produced hash, so nothing besides the hash string is stored.

use bcrypt::{hash, verify};
use std::fmt;

/// Work factor used in production (2^14 rounds)
pub const DEFAULT_HASH_COST: u32 = 14;

/// bcrypt only looks at the first 72 bytes of its input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hashed representation of a password, safe to persist
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn from_hash(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

#[derive(Debug)]
pub enum HashError {
    /// Input exceeds what bcrypt can hash without truncation
    PasswordTooLong(usize),
    /// Invalid cost or corrupt stored hash
    Primitive(String),
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashError::PasswordTooLong(max) => {
                write!(f, "password exceeds {} bytes", max)
            }
            HashError::Primitive(msg) => write!(f, "password hashing failed: {}", msg),
        }
    }
}

impl std::error::Error for HashError {}

impl From<bcrypt::BcryptError> for HashError {
    fn from(err: bcrypt::BcryptError) -> Self {
        HashError::Primitive(err.to_string())
    }
}

/// bcrypt hasher with a configurable work factor
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt
    ///
    /// # Errors
    /// Returns error if the password is longer than bcrypt accepts or the
    /// configured cost is out of range
    pub fn hash(&self, password: &str) -> Result<Credential, HashError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(HashError::PasswordTooLong(MAX_PASSWORD_BYTES));
        }

        let hashed = hash(password, self.cost)?;
        Ok(Credential(hashed))
    }

    /// Check a password against a stored credential
    ///
    /// A mismatch is `Ok(false)`. Errors are reserved for a credential that
    /// cannot be parsed.
    pub fn verify(&self, password: &str, credential: &Credential) -> Result<bool, HashError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }

        Ok(verify(password, credential.as_str())?)
    }
}
