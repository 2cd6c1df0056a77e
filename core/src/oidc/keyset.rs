//! Provider key set cache
//!
//! Holds the provider's converted signing keys for a fixed TTL. The whole set
//! shares one expiry and is only ever replaced wholesale by a successful fetch.
//! Concurrent callers that find the cache stale wait on a single refresh and
//! all observe its outcome.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use super::jwk::{convert, JwkSet, KeyMaterial};
use crate::error::{ApiError, Result};
use crate::platform::{Clock, HttpClient};

/// Snapshot of the cache for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySetStatus {
    pub jwks_uri: String,
    pub key_ids: Vec<String>,
    /// Unix seconds; `None` while the cache is empty
    pub expires_at: Option<u64>,
}

#[derive(Default)]
struct CacheState {
    keys: Arc<HashMap<String, KeyMaterial>>,
    expires_at: u64,
    populated: bool,
    /// Completed fetch attempts, successful or not
    attempts: u64,
    /// Diagnostic of the most recent attempt when it failed
    last_failure: Option<String>,
}

impl CacheState {
    fn is_fresh(&self, now: u64) -> bool {
        self.populated && now < self.expires_at
    }

    fn lookup(&self, kid: &str) -> Result<KeyMaterial> {
        self.keys.get(kid).cloned().ok_or_else(|| {
            ApiError::key_not_found(format!("no key with kid '{}' in provider key set", kid))
        })
    }
}

/// Time-bounded cache of the provider's signing keys
pub struct KeySetCache {
    jwks_uri: String,
    ttl_secs: u64,
    fetch_timeout: Duration,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    state: RwLock<CacheState>,
    /// Serializes refreshes so a stale cache triggers one fetch at a time
    refresh: Mutex<()>,
}

impl KeySetCache {
    pub fn new(
        jwks_uri: impl Into<String>,
        ttl_secs: u64,
        fetch_timeout: Duration,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            jwks_uri: jwks_uri.into(),
            ttl_secs,
            fetch_timeout,
            http,
            clock,
            state: RwLock::new(CacheState::default()),
            refresh: Mutex::new(()),
        }
    }

    /// Get the key for `kid`, fetching the key set if the cache is empty or expired.
    ///
    /// A `kid` missing from a fresh set is a terminal `KeyNotFound`; it does not
    /// force another fetch before the TTL runs out.
    pub async fn get_key(&self, kid: &str) -> Result<KeyMaterial> {
        let observed = {
            let state = self.state.read().await;
            if state.is_fresh(self.clock.now_secs()) {
                tracing::debug!(kid, "key set cache hit");
                return state.lookup(kid);
            }
            state.attempts
        };

        let _guard = self.refresh.lock().await;

        {
            let state = self.state.read().await;
            if state.attempts != observed {
                // Another caller completed a fetch while we were waiting
                if let Some(reason) = &state.last_failure {
                    return Err(ApiError::key_source_unavailable(reason.clone()));
                }
                if state.is_fresh(self.clock.now_secs()) {
                    return state.lookup(kid);
                }
            }
        }

        let keys = self.refresh_locked().await?;
        keys.get(kid).cloned().ok_or_else(|| {
            tracing::warn!(kid, jwks_uri = %self.jwks_uri, "kid absent from freshly fetched key set");
            ApiError::key_not_found(format!("no key with kid '{}' in provider key set", kid))
        })
    }

    /// Refresh the key set if it is empty or expired and report its status
    pub async fn ensure_fresh(&self) -> Result<KeySetStatus> {
        let observed = {
            let state = self.state.read().await;
            if state.is_fresh(self.clock.now_secs()) {
                return Ok(self.snapshot(&state));
            }
            state.attempts
        };

        let _guard = self.refresh.lock().await;

        let already_refreshed = {
            let state = self.state.read().await;
            if state.attempts != observed {
                if let Some(reason) = &state.last_failure {
                    return Err(ApiError::key_source_unavailable(reason.clone()));
                }
            }
            state.is_fresh(self.clock.now_secs())
        };

        if !already_refreshed {
            self.refresh_locked().await?;
        }

        Ok(self.status().await)
    }

    /// Current cache contents without touching the network
    pub async fn status(&self) -> KeySetStatus {
        let state = self.state.read().await;
        self.snapshot(&state)
    }

    /// Drop all cached keys; the next lookup fetches a new set
    pub async fn invalidate(&self) {
        let _guard = self.refresh.lock().await;
        let mut state = self.state.write().await;
        state.keys = Arc::new(HashMap::new());
        state.expires_at = 0;
        state.populated = false;
        tracing::info!(jwks_uri = %self.jwks_uri, "key set cache invalidated");
    }

    fn snapshot(&self, state: &CacheState) -> KeySetStatus {
        let mut key_ids: Vec<String> = state.keys.keys().cloned().collect();
        key_ids.sort();

        KeySetStatus {
            jwks_uri: self.jwks_uri.clone(),
            key_ids,
            expires_at: state.populated.then_some(state.expires_at),
        }
    }

    /// Fetch and install a new key set. Caller must hold `refresh`.
    async fn refresh_locked(&self) -> Result<Arc<HashMap<String, KeyMaterial>>> {
        let fetched_at = self.clock.now_secs();
        let outcome = self.fetch().await;

        let mut state = self.state.write().await;
        state.attempts += 1;

        match outcome {
            Ok(keys) => {
                let keys = Arc::new(keys);
                state.keys = keys.clone();
                state.expires_at = fetched_at.saturating_add(self.ttl_secs);
                state.populated = true;
                state.last_failure = None;
                tracing::info!(
                    jwks_uri = %self.jwks_uri,
                    keys = keys.len(),
                    expires_at = state.expires_at,
                    "key set refreshed"
                );
                Ok(keys)
            }
            Err(err) => {
                // Previous contents stay in place; only the failure is recorded
                let reason = match &err {
                    ApiError::KeySourceUnavailable { message } => message.clone(),
                    other => other.to_string(),
                };
                state.last_failure = Some(reason);
                tracing::warn!(jwks_uri = %self.jwks_uri, error = %err, "key set fetch failed");
                Err(err)
            }
        }
    }

    async fn fetch(&self) -> Result<HashMap<String, KeyMaterial>> {
        tracing::info!(jwks_uri = %self.jwks_uri, "fetching provider key set");

        let request = self.http.get(
            &self.jwks_uri,
            &[
                ("Accept", "application/json"),
                ("User-Agent", "idtoken-verifier"),
            ],
        );

        let response = tokio::time::timeout(self.fetch_timeout, request)
            .await
            .map_err(|_| {
                ApiError::key_source_unavailable(format!(
                    "key set fetch timed out after {}s",
                    self.fetch_timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| ApiError::key_source_unavailable(format!("failed to fetch key set: {}", e)))?;

        if response.status != 200 {
            return Err(ApiError::key_source_unavailable(format!(
                "failed to fetch key set: HTTP {}",
                response.status
            )));
        }

        let set: JwkSet = response
            .json()
            .map_err(|e| ApiError::key_source_unavailable(format!("invalid key set: {}", e)))?;

        let mut keys = HashMap::with_capacity(set.keys.len());
        for jwk in &set.keys {
            match convert(jwk) {
                Ok(key) => {
                    keys.insert(key.kid.clone(), key);
                }
                Err(e) => {
                    tracing::warn!(kid = ?jwk.kid, kty = %jwk.kty, error = %e, "skipping key");
                }
            }
        }

        Ok(keys)
    }
}
