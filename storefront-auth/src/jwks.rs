//! Time-bounded JWKS cache.
//!
//! Availability beats freshness for verification keys: an expired entry is
//! refreshed opportunistically, but the stale keyset is still served when the
//! refresh fails.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use jsonwebtoken::jwk::JwkSet;
use parking_lot::RwLock;
use url::Url;

use crate::error::JwksError;

/// Keysets are served from cache for up to an hour.
pub const DEFAULT_JWKS_TTL: Duration = Duration::from_secs(60 * 60);

const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(15);

struct CacheEntry {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Caches the keyset published by the identity provider.
///
/// Refreshes are single-flight: the async mutex admits one fetch at a time
/// and waiters re-check the cache after acquisition, so a fresh keyset is
/// never overwritten by a staler fetch and concurrent callers trigger at most
/// one network call.
pub struct JwksCache {
    url: Url,
    ttl: Duration,
    client: reqwest::Client,
    entry: RwLock<Option<CacheEntry>>,
    refresh: tokio::sync::Mutex<()>,
}

impl JwksCache {
    pub fn new(url: Url) -> Self {
        Self::with_ttl(url, DEFAULT_JWKS_TTL)
    }

    pub fn with_ttl(url: Url, ttl: Duration) -> Self {
        Self {
            url,
            ttl,
            client: reqwest::Client::new(),
            entry: RwLock::new(None),
            refresh: tokio::sync::Mutex::new(()),
        }
    }

    /// The current keyset, fetched at most once per TTL window.
    pub async fn get(&self) -> Result<Arc<JwkSet>, JwksError> {
        if let Some(keys) = self.fresh() {
            return Ok(keys);
        }

        let _refresh = self.refresh.lock().await;
        // another caller may have refreshed while we waited for the lock
        if let Some(keys) = self.fresh() {
            return Ok(keys);
        }

        match self.fetch().await {
            Ok(keys) => {
                let keys = Arc::new(keys);
                *self.entry.write() = Some(CacheEntry {
                    keys: keys.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(keys)
            }
            Err(e) => match self.any() {
                Some(stale) => {
                    tracing::warn!(url = %self.url, error = %e, "JWKS refresh failed, serving stale keyset");
                    Ok(stale)
                }
                None => Err(e),
            },
        }
    }

    /// Drop the cached entry; the next `get` fetches.
    pub fn invalidate(&self) {
        *self.entry.write() = None;
    }

    fn fresh(&self) -> Option<Arc<JwkSet>> {
        let entry = self.entry.read();
        entry
            .as_ref()
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.keys.clone())
    }

    fn any(&self) -> Option<Arc<JwkSet>> {
        self.entry.read().as_ref().map(|e| e.keys.clone())
    }

    async fn fetch(&self) -> Result<JwkSet, JwksError> {
        let response = self
            .client
            .get(self.url.clone())
            .timeout(DEFAULT_NETWORK_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| JwksError::FetchFailed {
                url: self.url.to_string(),
                source,
            })?;
        response
            .json::<JwkSet>()
            .await
            .map_err(|source| JwksError::MalformedKeySet {
                url: self.url.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::method;
    use wiremock::matchers::path;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;

    use super::*;
    use crate::keys::KeyMaterial;

    async fn mock_jwks_server(jwks: &JwkSet, expected_fetches: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
            .expect(expected_fetches)
            .mount(&server)
            .await;
        server
    }

    fn jwks_url(server: &MockServer) -> Url {
        format!("{}/.well-known/jwks.json", server.uri())
            .parse()
            .unwrap()
    }

    #[tokio::test]
    async fn second_get_within_ttl_serves_the_cached_keyset() {
        let jwks = KeyMaterial::ephemeral().jwks();
        let server = mock_jwks_server(&jwks, 1).await;

        let cache = JwksCache::new(jwks_url(&server));
        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn concurrent_cold_gets_fetch_exactly_once() {
        let jwks = KeyMaterial::ephemeral().jwks();
        let server = mock_jwks_server(&jwks, 1).await;

        let cache = Arc::new(JwksCache::new(jwks_url(&server)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get().await.map(|_| ()) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn invalidate_forces_a_refetch() {
        let jwks = KeyMaterial::ephemeral().jwks();
        let server = mock_jwks_server(&jwks, 2).await;

        let cache = JwksCache::new(jwks_url(&server));
        cache.get().await.unwrap();
        cache.invalidate();
        cache.get().await.unwrap();
    }

    #[tokio::test]
    async fn stale_keyset_is_served_when_the_refresh_fails() {
        let jwks = KeyMaterial::ephemeral().jwks();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&jwks))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        // zero TTL: every get is an expiry
        let cache = JwksCache::with_ttl(jwks_url(&server), Duration::ZERO);
        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn fetch_failure_with_no_cached_keyset_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let cache = JwksCache::new(jwks_url(&server));
        let err = cache.get().await.unwrap_err();
        assert!(matches!(err, JwksError::FetchFailed { .. }));
    }
}
