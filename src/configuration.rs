use config::ConfigError;

use crate::auth::DEFAULT_HASH_COST;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default = "default_project_name")]
    pub project_name: String,
    #[serde(default = "default_project_name")]
    pub application_id: String,
    /// Comma separated list of origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

impl ApplicationSettings {
    /// All routes are mounted under this prefix
    pub fn base_path(&self) -> String {
        format!("/api/{}", self.project_name)
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Token and password hashing settings
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,   // seconds
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64,  // seconds
    #[serde(default = "default_project_name")]
    pub issuer: String,
    #[serde(default = "default_refresh_cookie_name")]
    pub refresh_cookie_name: String,
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
}

impl AuthSettings {
    /// Reject secrets that would let one token kind stand in for the other
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err(ConfigError::Message(
                "auth.access_secret and auth.refresh_secret are required".to_string(),
            ));
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::Message(
                "auth.access_secret and auth.refresh_secret must differ".to_string(),
            ));
        }
        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err(ConfigError::Message(
                "token expiry must be a positive number of seconds".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_project_name() -> String {
    "finanger-back".to_string()
}

fn default_allowed_origins() -> String {
    "http://localhost:3000".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_access_token_expiry() -> i64 {
    30 * 60
}

fn default_refresh_token_expiry() -> i64 {
    7 * 24 * 60 * 60
}

fn default_refresh_cookie_name() -> String {
    "refresh_token".to_string()
}

fn default_hash_cost() -> u32 {
    DEFAULT_HASH_COST
}

/// Load settings from `configuration.yaml` (optional) and `APP__*` environment variables
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.auth.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_settings() -> AuthSettings {
        AuthSettings {
            access_secret: "access".to_string(),
            refresh_secret: "refresh".to_string(),
            access_token_expiry: default_access_token_expiry(),
            refresh_token_expiry: default_refresh_token_expiry(),
            issuer: "test".to_string(),
            refresh_cookie_name: default_refresh_cookie_name(),
            hash_cost: 4,
        }
    }

    #[test]
    fn test_default_lifetimes() {
        assert_eq!(default_access_token_expiry(), 1800);
        assert_eq!(default_refresh_token_expiry(), 604800);
    }

    #[test]
    fn test_distinct_secrets_accepted() {
        assert!(auth_settings().validate().is_ok());
    }

    #[test]
    fn test_shared_secret_rejected() {
        let mut settings = auth_settings();
        settings.refresh_secret = settings.access_secret.clone();

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut settings = auth_settings();
        settings.access_secret = String::new();

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_allowed_origins_split() {
        let app = ApplicationSettings {
            host: default_host(),
            port: 8080,
            project_name: default_project_name(),
            application_id: default_project_name(),
            allowed_origins: "http://localhost:3000, https://app.example.com,".to_string(),
        };

        assert_eq!(
            app.allowed_origins(),
            vec!["http://localhost:3000".to_string(), "https://app.example.com".to_string()]
        );
        assert_eq!(app.base_path(), "/api/finanger-back");
    }
}
