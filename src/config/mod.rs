use serde::{Deserialize, Serialize};
use std::env;

/// Process configuration, built once at startup and handed to components
/// through shared state. Nothing reads the environment after this point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    pub environment: Environment,
    pub jwt: JwtConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime in minutes.
    pub access_expiry_minutes: i64,
    /// Refresh token lifetime in days.
    pub refresh_expiry_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL. Takes precedence over the discrete fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub origin: String,
    pub credentials: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max_requests: u32,
}

impl Config {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        Self {
            port: parse_env("PORT", 5000),
            environment,
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").unwrap_or_else(|_| "change-me-in-production".to_string()),
                access_expiry_minutes: parse_env("JWT_EXPIRES_IN_MINUTES", 30),
                refresh_expiry_days: parse_env("JWT_REFRESH_EXPIRES_IN_DAYS", 7),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok(),
                host: env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: parse_env("DB_PORT", 5432),
                user: env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string()),
                password: env::var("DB_PASSWORD").unwrap_or_default(),
                name: env::var("DB_NAME").unwrap_or_else(|_| "idc_console".to_string()),
                max_connections: parse_env("DB_MAX_CONNECTIONS", 10),
            },
            cors: CorsConfig {
                origin: env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
                credentials: parse_env("CORS_CREDENTIALS", true),
            },
            rate_limit: RateLimitConfig {
                window_ms: parse_env("RATE_LIMIT_WINDOW_MS", 900_000),
                max_requests: parse_env("RATE_LIMIT_MAX", 100),
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        // Only assert on keys that are unlikely to be set in a test environment.
        let config = Config::from_env();
        assert_eq!(config.jwt.access_expiry_minutes, 30);
        assert_eq!(config.jwt.refresh_expiry_days, 7);
        assert_eq!(config.rate_limit.window_ms, 900_000);
        assert_eq!(config.rate_limit.max_requests, 100);
    }

    #[test]
    fn parse_env_falls_back_on_garbage() {
        std::env::set_var("IDC_TEST_PARSE_ENV", "not-a-number");
        let parsed: u16 = parse_env("IDC_TEST_PARSE_ENV", 42);
        assert_eq!(parsed, 42);
        std::env::remove_var("IDC_TEST_PARSE_ENV");
    }
}
