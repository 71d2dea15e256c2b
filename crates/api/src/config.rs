use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment")]
    Missing(&'static str),

    #[error("{var} has an invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Where product data and analyses come from.
    pub upstream: UpstreamConfig,
}

/// Upstream service locations.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Open Food Facts compatible catalog base URL.
    pub catalog_url: String,
    /// Nutrition analysis service base URL.
    pub analysis_url: String,
    /// Bearer key for the analysis service, if it wants one.
    pub analysis_api_key: Option<String>,
    /// Timeout for one-shot upstream calls in seconds (default: `20`).
    pub timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                           |
    /// |------------------------------|-----------------------------------|
    /// | `HOST`                       | `0.0.0.0`                         |
    /// | `PORT`                       | `3000`                            |
    /// | `CORS_ORIGINS`               | `http://localhost:5173`           |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                              |
    /// | `PRODUCT_CATALOG_URL`        | `https://world.openfoodfacts.org` |
    /// | `NUTRITION_ANALYSIS_URL`     | `http://localhost:8090`           |
    /// | `NUTRITION_ANALYSIS_API_KEY` | unset                             |
    /// | `UPSTREAM_TIMEOUT_SECS`      | `20`                              |
    ///
    /// See [`JwtConfig::from_env`] for the token settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", "0.0.0.0");
        let port = parse_env("PORT", "3000")?;

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", "30")?;

        let upstream = UpstreamConfig {
            catalog_url: env_or("PRODUCT_CATALOG_URL", "https://world.openfoodfacts.org"),
            analysis_url: env_or("NUTRITION_ANALYSIS_URL", "http://localhost:8090"),
            analysis_api_key: std::env::var("NUTRITION_ANALYSIS_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            timeout_secs: parse_env("UPSTREAM_TIMEOUT_SECS", "20")?,
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env()?,
            upstream,
        })
    }
}

pub(crate) fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.into())
}

pub(crate) fn parse_env<T: FromStr>(var: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env_or(var, default);
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}
