use axum::http::HeaderValue;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Service configuration, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Origin allowed by CORS; `*` allows any
    pub cors_origin: String,
    /// Frontend base URL, also allowed by CORS when set
    pub frontend_url: Option<String>,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    pub auth: Option<AuthConfig>,
}

/// Bearer-token checks against an identity provider's JWKS
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwks_url: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub cache_ttl: Duration,
    /// Minimum age of the cached JWKS before an unknown `kid` may refetch it
    pub refresh_cooldown: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            cors_origin: "http://localhost:5173".to_string(),
            frontend_url: None,
            log_level: "info".to_string(),
            auth: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = match non_empty("HOST") {
            Some(v) => parse_value("HOST", &v)?,
            None => defaults.host,
        };

        let port = match non_empty("PORT") {
            Some(v) => parse_value("PORT", &v)?,
            None => defaults.port,
        };

        let auth = match non_empty("JWKS_URL") {
            Some(jwks_url) => {
                let cache_ttl = match non_empty("JWKS_CACHE_TTL_SECS") {
                    Some(v) => Duration::from_secs(parse_value("JWKS_CACHE_TTL_SECS", &v)?),
                    None => Duration::from_secs(600),
                };
                let refresh_cooldown = match non_empty("JWKS_REFRESH_COOLDOWN_SECS") {
                    Some(v) => Duration::from_secs(parse_value("JWKS_REFRESH_COOLDOWN_SECS", &v)?),
                    None => Duration::from_secs(30),
                };
                Some(AuthConfig {
                    jwks_url,
                    issuer: non_empty("JWT_ISSUER"),
                    audience: non_empty("JWT_AUDIENCE"),
                    cache_ttl,
                    refresh_cooldown,
                })
            }
            None => None,
        };

        let cors_origin = match non_empty("CORS_ORIGIN") {
            Some(v) => parse_origin("CORS_ORIGIN", &v)?,
            None => defaults.cors_origin,
        };
        let frontend_url = non_empty("FRONTEND_URL")
            .map(|v| parse_origin("FRONTEND_URL", &v))
            .transpose()?;

        Ok(Config {
            host,
            port,
            cors_origin,
            frontend_url,
            log_level: non_empty("LOG_LEVEL").unwrap_or(defaults.log_level),
            auth,
        })
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Every origin CORS should allow
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![normalize_origin(&self.cors_origin)];
        if let Some(frontend) = &self.frontend_url {
            let frontend = normalize_origin(frontend);
            if !origins.contains(&frontend) {
                origins.push(frontend);
            }
        }
        origins
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

/// Browsers send `Origin` without a trailing slash
fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_string()
}

fn parse_origin(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let origin = normalize_origin(value);
    if origin.is_empty() || HeaderValue::from_str(&origin).is_err() {
        return Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        });
    }
    Ok(origin)
}
