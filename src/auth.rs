//! Bearer-token validation against a JSON Web Key Set.

use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token header has no kid")]
    MissingKeyId,

    #[error("algorithm {0:?} is not accepted")]
    UnsupportedAlgorithm(Algorithm),

    #[error("no key {0} in JWKS")]
    UnknownKey(String),

    #[error("token rejected: {0}")]
    InvalidToken(String),

    #[error("failed to fetch JWKS: {0}")]
    Jwks(String),
}

/// Claims the service cares about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: u64,
}

impl Claims {
    /// Identity used to key per-user history
    pub fn user_id(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.sub)
    }
}

struct CachedJwks {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Validates JWTs with keys fetched (and cached) from a JWKS endpoint
pub struct JwksAuthenticator {
    config: AuthConfig,
    client: Client,
    cache: RwLock<Option<CachedJwks>>,
}

impl JwksAuthenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            client: Client::new(),
            cache: RwLock::new(None),
        }
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        tracing::debug!(url = %self.config.jwks_url, "fetching JWKS");
        self.client
            .get(&self.config.jwks_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| AuthError::Jwks(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::Jwks(format!("invalid JWKS document: {}", e)))
    }

    /// Cached key set, refetched once older than the cache TTL
    async fn keys(&self) -> Result<Arc<JwkSet>, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < self.config.cache_ttl {
                    return Ok(cached.keys.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < self.config.cache_ttl {
                return Ok(cached.keys.clone());
            }
        }
        let keys = Arc::new(self.fetch_jwks().await?);
        *cache = Some(CachedJwks {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }

    /// Refetch ahead of the TTL, unless the cached set is younger than the
    /// refresh cooldown
    async fn refresh_keys(&self) -> Result<Arc<JwkSet>, AuthError> {
        let mut cache = self.cache.write().await;
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < self.config.refresh_cooldown {
                tracing::debug!("JWKS refreshed recently, not refetching");
                return Ok(cached.keys.clone());
            }
        }

        let keys = Arc::new(self.fetch_jwks().await?);
        *cache = Some(CachedJwks {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }

    /// Decode the token header and pick its verification key.
    ///
    /// An unknown `kid` triggers one refetch in case the provider rotated keys,
    /// at most once per refresh cooldown.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let keys = self.keys().await?;
        let keys = if keys.find(kid).is_some() {
            keys
        } else {
            tracing::info!(kid, "unknown key id, refreshing JWKS");
            self.refresh_keys().await?
        };

        let jwk = keys
            .find(kid)
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))?;
        DecodingKey::from_jwk(jwk).map_err(|e| AuthError::Malformed(e.to_string()))
    }

    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::Malformed(e.to_string()))?;
        if matches!(header.alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;

        let key = self.decoding_key(&kid).await?;

        // iss/aud are only compared when present unless listed as required
        let mut validation = Validation::new(header.alg);
        let mut required = vec!["exp"];
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }
        if let Some(audience) = &self.config.audience {
            validation.set_audience(&[audience]);
            required.push("aud");
        }
        validation.set_required_spec_claims(required.as_slice());

        let data = decode::<Claims>(token, &key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(data.claims)
    }
}
