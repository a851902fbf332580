use crate::error::{Error, Result};
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const JWKS_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub exp: usize,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<IdentityClaims>;
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Verifies Firebase ID tokens against Google's published signing keys.
pub struct FirebaseVerifier {
    client: Client,
    project_id: String,
    jwks_url: String,
    cache: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(project_id: String, client: Client) -> Self {
        Self::with_jwks_url(project_id, GOOGLE_JWKS_URL.to_string(), client)
    }

    pub fn with_jwks_url(project_id: String, jwks_url: String, client: Client) -> Self {
        Self {
            client,
            project_id,
            jwks_url,
            cache: RwLock::new(None),
        }
    }

    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 60;
        validation
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < JWKS_TTL {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return DecodingKey::from_jwk(jwk)
                            .map_err(|e| Error::Unauthorized(format!("invalid signing key: {}", e)));
                    }
                }
            }
        }

        // Unknown kid or stale cache: Google rotates keys, so refetch once.
        let keys = self.fetch_keys().await?;
        let mut cache = self.cache.write().await;
        let key = keys
            .find(kid)
            .ok_or_else(|| Error::Unauthorized("unknown signing key".to_string()))
            .and_then(|jwk| {
                DecodingKey::from_jwk(jwk)
                    .map_err(|e| Error::Unauthorized(format!("invalid signing key: {}", e)))
            });
        *cache = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        key
    }

    async fn fetch_keys(&self) -> Result<JwkSet> {
        tracing::debug!(url = %self.jwks_url, "Fetching identity signing keys");
        let response = self
            .client
            .get(&self.jwks_url)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Signing key fetch failed with status {}", status);
            return Err(Error::Internal(format!(
                "signing key fetch failed with status {}",
                status
            )));
        }
        Ok(response.json::<JwkSet>().await?)
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, id_token: &str) -> Result<IdentityClaims> {
        let header = decode_header(id_token)
            .map_err(|_| Error::Unauthorized("invalid_token".to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(Error::Unauthorized("unsupported token algorithm".to_string()));
        }
        let kid = header
            .kid
            .ok_or_else(|| Error::Unauthorized("token has no key id".to_string()))?;

        let key = self.decoding_key(&kid).await?;
        let data = decode::<IdentityClaims>(id_token, &key, &self.validation()).map_err(|e| {
            tracing::warn!("ID token rejected: {}", e);
            Error::Unauthorized("invalid_token".to_string())
        })?;

        if data.claims.sub.is_empty() {
            return Err(Error::Unauthorized("token has no subject".to_string()));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> FirebaseVerifier {
        FirebaseVerifier::with_jwks_url(
            "studify-test".to_string(),
            "http://127.0.0.1:9/keys".to_string(),
            Client::new(),
        )
    }

    #[test]
    fn issuer_follows_project() {
        assert_eq!(
            verifier().issuer(),
            "https://securetoken.google.com/studify-test"
        );
    }

    #[test]
    fn validation_pins_audience_issuer_and_leeway() {
        let validation = verifier().validation();
        assert_eq!(validation.algorithms, vec![Algorithm::RS256]);
        assert_eq!(validation.leeway, 60);
        assert!(validation
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains("studify-test")));
        assert!(validation
            .iss
            .as_ref()
            .is_some_and(|iss| iss.contains("https://securetoken.google.com/studify-test")));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized_without_fetching_keys() {
        let result = verifier().verify("not-a-jwt").await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }

    #[tokio::test]
    async fn hs256_token_is_rejected() {
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(Algorithm::HS256),
            &IdentityClaims {
                sub: "user-1".to_string(),
                exp: 4_102_444_800,
                name: None,
                email: None,
                picture: None,
            },
            &jsonwebtoken::EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        let result = verifier().verify(&token).await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }
}
