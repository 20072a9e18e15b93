/// User Routes
///
/// Signup, login, token refresh, current user and logout. The access token
/// travels in JSON bodies and `Authorization` headers; the refresh token only
/// ever travels in an HttpOnly cookie.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{AccessClaims, SessionService, Signup};
use crate::configuration::AuthSettings;
use crate::domain::user::User;
use crate::error::{AppError, AuthError, ErrorContext, ValidationError};
use crate::middleware::bearer_token;
use crate::validators::{is_valid_email, is_valid_id, is_valid_name, is_valid_password};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub fin_asset_id: i64,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// User as exposed over HTTP; never carries the password hash
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub fin_asset_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            fin_asset_id: user.financial_asset_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

fn token_body(token: String) -> serde_json::Value {
    json!({ "data": { "token": token } })
}

fn refresh_cookie(name: &str, value: String, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build(name.to_string(), value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_seconds))
        .finish()
}

/// POST /users/signup
///
/// # Errors
/// - 400: invalid email, name, password or fin_asset_id
/// - 409: email already registered
/// - 500: hashing or storage failure
pub async fn signup(
    body: web::Json<SignupRequest>,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_signup");
    let body = body.into_inner();

    let email = is_valid_email(&body.email)?;
    let name = is_valid_name("name", &body.name)?;
    is_valid_password(&body.password)?;
    let financial_asset_id = is_valid_id("fin_asset_id", body.fin_asset_id)?;

    let user = session
        .signup(Signup {
            name,
            email,
            password: body.password,
            financial_asset_id,
        })
        .await
        .map_err(|e| context.log_error(e.into()))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.id,
        "User created"
    );

    Ok(HttpResponse::Created().json(json!({ "message": "User created successfully" })))
}

/// POST /users/login
///
/// Returns the access token in the body and sets the refresh token cookie.
/// Unknown email and wrong password produce the same 401.
pub async fn login(
    body: web::Json<LoginRequest>,
    session: web::Data<SessionService>,
    auth: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let email = is_valid_email(&body.email)?;
    is_valid_password(&body.password)?;

    let tokens = session
        .login(&email, &body.password)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    let cookie = refresh_cookie(
        &auth.refresh_cookie_name,
        tokens.refresh_token,
        session.refresh_token_expiry(),
    );

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(token_body(tokens.access_token)))
}

/// POST /users/refresh
///
/// The caller identifies itself with its (possibly expired) access token;
/// the refresh token cookie must belong to the same user.
///
/// # Errors
/// - 400: refresh token cookie missing
/// - 401: access token missing or forged, refresh token invalid or expired,
///   or the two tokens name different users
pub async fn refresh(
    req: HttpRequest,
    session: web::Data<SessionService>,
    auth: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let access_token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;
    let claims = session
        .verifier()
        .verify_access_allow_expired(access_token)
        .map_err(|e| {
            tracing::debug!(error = %e, "Refresh rejected: bad access token");
            AppError::Auth(AuthError::TokenInvalid)
        })?;
    let context = context.with_user_id(claims.user_id());

    let cookie = req
        .cookie(&auth.refresh_cookie_name)
        .ok_or_else(|| ValidationError::EmptyField(auth.refresh_cookie_name.clone()))?;

    let token = session
        .refresh(claims.user_id(), cookie.value())
        .await
        .map_err(|e| context.log_error(e.into()))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = claims.user_id(),
        "Access token refreshed"
    );

    Ok(HttpResponse::Ok().json(token_body(token)))
}

/// GET /users/me
///
/// **Requires a valid access token**; claims are injected by `JwtMiddleware`.
pub async fn me(
    claims: web::ReqData<AccessClaims>,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("get_self").with_user_id(claims.user_id());

    let user = session
        .get_self(claims.user_id())
        .await
        .map_err(|e| context.log_error(e.into()))?;

    Ok(HttpResponse::Ok().json(json!({ "data": { "user": UserResponse::from(user) } })))
}

/// POST /users/logout
///
/// Tokens are stateless, so logging out only drops the refresh cookie.
pub async fn logout(auth: web::Data<AuthSettings>) -> HttpResponse {
    let mut cookie = refresh_cookie(&auth.refresh_cookie_name, String::new(), 0);
    cookie.make_removal();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(json!({ "message": "Logged out" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_hides_credential() {
        let user = User {
            id: 7,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            financial_asset_id: 1,
            password_hash: "$2b$04$secret".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["fin_asset_id"], 1);
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_refresh_cookie_attributes() {
        let cookie = refresh_cookie("refresh_token", "abc".to_string(), 604800);

        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(604800)));
    }
}
