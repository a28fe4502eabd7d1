use secrecy::{ExposeSecret, SecretString};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    /// Absolute base used to build resource `url` fields, without trailing slash.
    pub public_url: String,
    pub store_backend: StoreBackend,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub metrics_enabled: bool,
    pub rate_limit: RateLimitConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub token_attempts: u32,
    pub token_window_seconds: u64,
}

/// Global admin created at startup when the email is not registered yet.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: SecretString,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let store_backend: StoreBackend = get_env("STORE_BACKEND", Some("postgres"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let database_url = match store_backend {
            StoreBackend::Postgres => get_env("DATABASE_URL", None, is_prod)?,
            StoreBackend::Memory => env::var("DATABASE_URL").unwrap_or_default(),
        };

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                email,
                password: SecretString::new(password),
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD must be set together"
                )))
            }
        };

        let config = ApiConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("authapi-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            public_url: get_env("PUBLIC_URL", Some("http://localhost:8080"), is_prod)?
                .trim_end_matches('/')
                .to_string(),
            store_backend,
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "10", is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", "1", is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            },
            metrics_enabled: parse_env("METRICS_ENABLED", "true", is_prod)?,
            rate_limit: RateLimitConfig {
                token_attempts: parse_env("RATE_LIMIT_TOKEN_ATTEMPTS", "10", is_prod)?,
                token_window_seconds: parse_env("RATE_LIMIT_TOKEN_WINDOW_SECONDS", "60", is_prod)?,
            },
            bootstrap_admin,
        };

        config.validate()?;
        Ok(config)
    }

    /// In-memory development configuration. Used by tests and local runs.
    pub fn development() -> Self {
        Self {
            common: core_config::Config::default(),
            environment: Environment::Dev,
            service_name: "authapi-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            public_url: "http://localhost:8080".to_string(),
            store_backend: StoreBackend::Memory,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                min_connections: 1,
            },
            security: SecurityConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            metrics_enabled: false,
            rate_limit: RateLimitConfig {
                token_attempts: 10,
                token_window_seconds: 60,
            },
            bootstrap_admin: None,
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.store_backend == StoreBackend::Postgres && self.database.url.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_URL is required for the postgres store"
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS cannot exceed DATABASE_MAX_CONNECTIONS"
            )));
        }

        if let Some(admin) = &self.bootstrap_admin {
            if admin.email.trim().is_empty() || admin.password.expose_secret().is_empty() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Bootstrap admin email and password must not be empty"
                )));
            }
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.store_backend == StoreBackend::Memory {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "The memory store cannot be used in production"
                )));
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("Invalid {}: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}
