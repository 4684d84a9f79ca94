use std::env;

use crate::errors::AppError;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_address: String,
}

impl AppConfig {
    /// Reads settings from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| AppError::ConfigError("DATABASE_URL must be set".to_string()))?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| AppError::ConfigError("JWT_SECRET must be set".to_string()))?;
        if jwt_secret.is_empty() {
            return Err(AppError::ConfigError("JWT_SECRET cannot be empty".to_string()));
        }

        let bind_address =
            lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            bind_address,
        })
    }
}
