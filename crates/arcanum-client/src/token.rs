//! Bearer token persistence with expiry.
//!
//! The token lives in a key-value storage capability behind a trait so the
//! hosting application can plug in whatever persistence it has. The store
//! enforces the expiry contract: reading after the absolute expiry timestamp
//! clears the stored value and reports absence, never the stale token.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const TOKEN_KEY: &str = "arcanum_token";
const TOKEN_EXPIRES_KEY: &str = "arcanum_token_expires_at";

/// Minimal key-value persistence capability.
///
/// Implementations must be cheap to call; the store reads on every request.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory storage, used in tests and as the default backend.
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.lock().unwrap().remove(key);
    }
}

/// Persists the bearer credential and its absolute expiry.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl TokenStore {
    /// Creates a store over the given storage backend.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Creates a store backed by in-memory storage.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Stores a token, with an optional relative expiry in seconds.
    ///
    /// Passing no expiry removes any previously stored expiry.
    pub fn set_token(&self, token: &str, expires_in_seconds: Option<i64>) {
        self.storage.set(TOKEN_KEY, token);

        match expires_in_seconds {
            Some(seconds) if seconds > 0 => {
                let expires_at = chrono::Utc::now().timestamp_millis() + seconds * 1000;
                self.storage.set(TOKEN_EXPIRES_KEY, &expires_at.to_string());
            }
            _ => self.storage.remove(TOKEN_EXPIRES_KEY),
        }
    }

    /// Returns the stored token, or `None` when absent or expired.
    ///
    /// An expired token is cleared as a side effect so later reads are
    /// consistent with this one.
    pub fn get_token(&self) -> Option<String> {
        if let Some(raw) = self.storage.get(TOKEN_EXPIRES_KEY) {
            if let Ok(expires_at) = raw.trim().parse::<i64>() {
                if expires_at <= chrono::Utc::now().timestamp_millis() {
                    self.clear_token();
                    return None;
                }
            }
        }

        self.storage.get(TOKEN_KEY)
    }

    /// Removes the token and its expiry.
    pub fn clear_token(&self) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(TOKEN_EXPIRES_KEY);
    }
}
