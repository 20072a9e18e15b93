/// Middleware module
///
/// Custom middleware for authentication and CORS.

mod cors;
mod jwt_middleware;

pub use cors::CorsMiddleware;
pub use jwt_middleware::{bearer_token, JwtMiddleware};
