//! Integration tests for signup, login, refresh and logout
//!
//! The server runs against the in-memory user store, so no database is needed.

use finanger::auth::{InMemoryUserStore, SessionService, SystemClock};
use finanger::configuration::{ApplicationSettings, AuthSettings, DatabaseSettings, Settings};
use finanger::startup::run;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn signup(&self, client: &reqwest::Client, email: &str, password: &str) -> reqwest::Response {
        client
            .post(&self.url("/users/signup"))
            .json(&json!({
                "name": "Ana Souza",
                "email": email,
                "password": password,
                "fin_asset_id": 1
            }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn login(&self, client: &reqwest::Client, email: &str, password: &str) -> reqwest::Response {
        client
            .post(&self.url("/users/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Sign up and log in, returning the access token
    async fn signed_in(&self, client: &reqwest::Client, email: &str) -> String {
        assert_eq!(201, self.signup(client, email, "Secret1").await.status().as_u16());
        let response = self.login(client, email, "Secret1").await;
        assert_eq!(200, response.status().as_u16());

        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"].as_str().expect("missing token").to_string()
    }
}

fn test_settings() -> Settings {
    Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            project_name: "finanger-back".to_string(),
            application_id: "finanger-test".to_string(),
            allowed_origins: "http://localhost:3000".to_string(),
        },
        database: DatabaseSettings {
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "finanger_test".to_string(),
            max_connections: 1,
        },
        auth: AuthSettings {
            access_secret: "integration-access-secret".to_string(),
            refresh_secret: "integration-refresh-secret".to_string(),
            access_token_expiry: 1800,
            refresh_token_expiry: 604800,
            issuer: "finanger-test".to_string(),
            refresh_cookie_name: "refresh_token".to_string(),
            hash_cost: 4,
        },
    }
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let settings = test_settings();

    let pool = PgPoolOptions::new()
        .connect_lazy(&settings.database.connection_string())
        .expect("Failed to create lazy pool");
    let session = SessionService::new(
        Arc::new(InMemoryUserStore::new()),
        &settings.auth,
        Arc::new(SystemClock),
    )
    .expect("Failed to build session service");
    let address = format!("http://127.0.0.1:{}{}", port, settings.application.base_path());

    let server = run(listener, pool, session, settings).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp { address }
}

fn cookie_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

// --- Signup Tests ---

#[tokio::test]
async fn signup_returns_201_for_valid_data() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = app.signup(&client, "a@x.com", "Secret1").await;

    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "User created successfully");
}

#[tokio::test]
async fn signup_returns_409_for_duplicate_email() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    assert_eq!(201, app.signup(&client, "a@x.com", "Secret1").await.status().as_u16());
    let response = app.signup(&client, "a@x.com", "Other123").await;

    assert_eq!(409, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "DUPLICATE_ENTRY");
}

#[tokio::test]
async fn signup_returns_400_for_invalid_data() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let long_password = "a".repeat(73);
    let invalid = vec![
        (json!({"name": "Ana", "email": "notanemail", "password": "Secret1", "fin_asset_id": 1}), "invalid email"),
        (json!({"name": "", "email": "a@x.com", "password": "Secret1", "fin_asset_id": 1}), "empty name"),
        (json!({"name": "Ana", "email": "a@x.com", "password": "", "fin_asset_id": 1}), "empty password"),
        (json!({"name": "Ana", "email": "a@x.com", "password": long_password, "fin_asset_id": 1}), "password over 72 bytes"),
        (json!({"name": "Ana", "email": "a@x.com", "password": "Secret1", "fin_asset_id": 0}), "non-positive fin_asset_id"),
        (json!({"name": "Ana", "email": "a@x.com", "password": "Secret1"}), "missing fin_asset_id"),
    ];

    for (body, reason) in invalid {
        let response = client
            .post(&app.url("/users/signup"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(400, response.status().as_u16(), "Should reject: {}", reason);
    }
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_token_and_refresh_cookie() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    app.signup(&client, "a@x.com", "Secret1").await;

    let response = app.login(&client, "a@x.com", "Secret1").await;

    assert_eq!(200, response.status().as_u16());
    let cookie = response
        .cookies()
        .find(|c| c.name() == "refresh_token")
        .expect("refresh cookie not set");
    assert!(cookie.http_only());
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.max_age(), Some(std::time::Duration::from_secs(604800)));
    let refresh_token = cookie.value().to_string();
    assert!(!refresh_token.is_empty());

    let body: Value = response.json().await.expect("Failed to parse response");
    let token = body["data"]["token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert_ne!(token, refresh_token);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    app.signup(&client, "a@x.com", "Secret1").await;

    let wrong_password = app.login(&client, "a@x.com", "wrong").await;
    let unknown_email = app.login(&client, "nobody@x.com", "Secret1").await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_email.status().as_u16());

    let wrong_password: Value = wrong_password.json().await.unwrap();
    let unknown_email: Value = unknown_email.json().await.unwrap();
    assert_eq!(wrong_password["code"], unknown_email["code"]);
    assert_eq!(wrong_password["message"], unknown_email["message"]);
}

// --- Current User Tests ---

#[tokio::test]
async fn me_requires_a_token() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .get(&app.url("/users/me"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn me_rejects_a_forged_token() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .get(&app.url("/users/me"))
        .bearer_auth("eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOjF9.c2lnbmF0dXJl")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn me_returns_the_caller_without_credential() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = app.signed_in(&client, "a@x.com").await;

    let response = client
        .get(&app.url("/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    let user = &body["data"]["user"];
    assert_eq!(user["email"], "a@x.com");
    assert_eq!(user["name"], "Ana Souza");
    assert!(user.get("password_hash").is_none());
}

// --- Refresh Tests ---

#[tokio::test]
async fn refresh_issues_a_new_access_token() {
    let app = spawn_app().await;
    let client = cookie_client();
    let token = app.signed_in(&client, "a@x.com").await;

    let response = client
        .post(&app.url("/users/refresh"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    let new_token = body["data"]["token"].as_str().unwrap().to_string();

    let me = client
        .get(&app.url("/users/me"))
        .bearer_auth(&new_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, me.status().as_u16());
}

#[tokio::test]
async fn refresh_rejects_another_users_refresh_token() {
    let app = spawn_app().await;
    let first = cookie_client();
    let second = reqwest::Client::new();

    app.signed_in(&first, "first@x.com").await;
    let second_token = app.signed_in(&second, "second@x.com").await;

    // first's refresh cookie, second's access token
    let response = first
        .post(&app.url("/users/refresh"))
        .bearer_auth(&second_token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn refresh_without_cookie_returns_400() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = app.signed_in(&client, "a@x.com").await;

    let response = client
        .post(&app.url("/users/refresh"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn refresh_without_access_token_returns_401() {
    let app = spawn_app().await;
    let client = cookie_client();
    app.signed_in(&client, "a@x.com").await;

    let response = client
        .post(&app.url("/users/refresh"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    app.signup(&client, "a@x.com", "Secret1").await;

    let response = app.login(&client, "a@x.com", "Secret1").await;
    let refresh_token = response
        .cookies()
        .find(|c| c.name() == "refresh_token")
        .map(|c| c.value().to_string())
        .expect("refresh cookie not set");

    let me = client
        .get(&app.url("/users/me"))
        .bearer_auth(&refresh_token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, me.status().as_u16());
}

// --- Logout Tests ---

#[tokio::test]
async fn logout_clears_the_refresh_cookie() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&app.url("/users/logout"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let cookie = response
        .cookies()
        .find(|c| c.name() == "refresh_token")
        .expect("removal cookie not set");
    assert!(cookie.value().is_empty());
    assert_eq!(cookie.max_age(), Some(std::time::Duration::from_secs(0)));
}
