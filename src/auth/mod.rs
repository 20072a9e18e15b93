/// Authentication module
///
/// Handles password hashing, JWT access/refresh token issuance and
/// validation, and the session operations built on them.

mod claims;
mod clock;
mod jwt;
mod password;
mod session;
mod store;

pub use claims::{AccessClaims, ExpiringClaims, RefreshClaims};
pub use clock::{Clock, FixedClock, SystemClock};
pub use jwt::{TokenError, TokenIssuer, TokenVerifier};
pub use password::{Credential, HashError, PasswordHasher, DEFAULT_HASH_COST, MAX_PASSWORD_BYTES};
pub use session::{SessionError, SessionService, Signup, TokenPair};
pub use store::{InMemoryUserStore, UserStore};
