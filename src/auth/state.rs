//! Anti-CSRF state tokens for the OAuth login flow.
//!
//! A token is minted on login initiation, stored server-side with a TTL and
//! redeemed at most once by the callback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{self, Instant};

/// Bytes of entropy in every state token.
pub const STATE_TOKEN_BYTES: usize = 32;

/// Default cap on unredeemed tokens held by [`InMemoryStateStore`].
pub const DEFAULT_MAX_OUTSTANDING: usize = 100_000;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("entropy source failed: {0}")]
    Entropy(String),

    #[error("state store unavailable: {0}")]
    Store(String),
}

/// A single-use, URL-safe random token.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthState(String);

impl OAuthState {
    /// Mint a token from the OS CSPRNG.
    pub fn generate() -> Result<Self, StateError> {
        let mut bytes = [0u8; STATE_TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| StateError::Entropy(e.to_string()))?;
        Ok(Self(URL_SAFE_NO_PAD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for OAuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Enough to correlate in logs, not enough to replay.
        write!(f, "OAuthState({}…)", &self.0[..self.0.len().min(6)])
    }
}

/// Server-side record of outstanding state tokens.
#[async_trait]
pub trait OAuthStateStore: Send + Sync {
    /// Remember `state` as redeemable for `ttl`.
    async fn put(&self, state: &OAuthState, ttl: Duration) -> Result<(), StateError>;

    /// Atomically check that `token` is outstanding and unexpired, and consume it.
    ///
    /// Returns `true` for exactly one caller per issued token.
    async fn consume_if_valid(&self, token: &str) -> Result<bool, StateError>;
}

/// State tokens held in a concurrent map, keyed by token value.
///
/// Holds at most `max_outstanding` tokens; once full, new logins are refused
/// until tokens are redeemed or expire.
#[derive(Clone)]
pub struct InMemoryStateStore {
    /// token -> expiry
    states: Arc<DashMap<String, Instant>>,
    max_outstanding: usize,
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::with_capacity_limit(DEFAULT_MAX_OUTSTANDING)
    }
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(max_outstanding: usize) -> Self {
        Self {
            states: Arc::new(DashMap::new()),
            max_outstanding,
        }
    }

    /// Number of tokens held, expired or not.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Drop every expired token. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.states.len();
        self.states.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.states.len())
    }

    /// Purge expired tokens every `interval` until shutdown.
    pub async fn run_sweeper(self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = self.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, remaining = self.len(), "Purged expired OAuth state tokens");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("OAuth state sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl OAuthStateStore for InMemoryStateStore {
    async fn put(&self, state: &OAuthState, ttl: Duration) -> Result<(), StateError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| StateError::Store(format!("state ttl {:?} out of range", ttl)))?;

        if self.states.len() >= self.max_outstanding {
            self.purge_expired();
            if self.states.len() >= self.max_outstanding {
                tracing::warn!(
                    outstanding = self.states.len(),
                    limit = self.max_outstanding,
                    "OAuth state store full, refusing new login"
                );
                return Err(StateError::Store("too many pending logins".into()));
            }
        }

        self.states.insert(state.as_str().to_string(), expires_at);
        Ok(())
    }

    async fn consume_if_valid(&self, token: &str) -> Result<bool, StateError> {
        if token.is_empty() {
            return Ok(false);
        }
        let now = Instant::now();
        // remove_if holds the shard lock across check and removal. An expired
        // token is left for the sweeper and still rejected here.
        let consumed = self
            .states
            .remove_if(token, |_, expires_at| *expires_at > now)
            .is_some();
        Ok(consumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe_and_distinct() {
        let a = OAuthState::generate().unwrap();
        let b = OAuthState::generate().unwrap();
        assert_ne!(a, b);
        // 32 bytes, base64 without padding.
        assert_eq!(a.as_str().len(), 43);
        assert!(a
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn debug_does_not_print_whole_token() {
        let state = OAuthState::generate().unwrap();
        assert!(!format!("{:?}", state).contains(state.as_str()));
    }

    #[tokio::test]
    async fn token_is_consumed_once() {
        let store = InMemoryStateStore::new();
        let state = OAuthState::generate().unwrap();
        store.put(&state, Duration::from_secs(60)).await.unwrap();

        assert!(store.consume_if_valid(state.as_str()).await.unwrap());
        assert!(!store.consume_if_valid(state.as_str()).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_and_empty_tokens_rejected() {
        let store = InMemoryStateStore::new();
        assert!(!store.consume_if_valid("never-issued").await.unwrap());
        assert!(!store.consume_if_valid("").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_token_rejected() {
        let store = InMemoryStateStore::new();
        let state = OAuthState::generate().unwrap();
        store.put(&state, Duration::from_millis(1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!store.consume_if_valid(state.as_str()).await.unwrap());
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callbacks_only_one_wins() {
        let store = InMemoryStateStore::new();
        let state = OAuthState::generate().unwrap();
        store.put(&state, Duration::from_secs(60)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            let token = state.as_str().to_string();
            handles.push(tokio::spawn(async move {
                store.consume_if_valid(&token).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_keeps_live_tokens() {
        let store = InMemoryStateStore::new();
        let live = OAuthState::generate().unwrap();
        let dead = OAuthState::generate().unwrap();
        store.put(&live, Duration::from_secs(60)).await.unwrap();
        store.put(&dead, Duration::from_millis(1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.purge_expired(), 1);
        assert!(store.consume_if_valid(live.as_str()).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn full_store_refuses_until_tokens_expire() {
        let store = InMemoryStateStore::with_capacity_limit(2);
        let short = OAuthState::generate().unwrap();
        store.put(&short, Duration::from_millis(1)).await.unwrap();
        store
            .put(&OAuthState::generate().unwrap(), Duration::from_secs(60))
            .await
            .unwrap();

        let err = store
            .put(&OAuthState::generate().unwrap(), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::Store(_)));
        assert_eq!(store.len(), 2);

        // The expired token is purged to make room.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let late = OAuthState::generate().unwrap();
        store.put(&late, Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.consume_if_valid(late.as_str()).await.unwrap());
    }

    #[tokio::test]
    async fn overflowing_ttl_is_an_error_not_a_panic() {
        let store = InMemoryStateStore::new();
        let err = store
            .put(&OAuthState::generate().unwrap(), Duration::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::Store(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn sweeper_exits_on_shutdown() {
        let store = InMemoryStateStore::new();
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(store.clone().run_sweeper(Duration::from_millis(10), rx));

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
