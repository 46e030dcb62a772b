//! Upstream session credentials
//!
//! The store holds one [`SessionState`] shared by every request. Reauthentication
//! replaces it wholesale; readers take a cheap `Arc` snapshot per connection attempt.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Storage key holding the anti-bot token forwarded in the request body
pub const TURNSTILE_TOKEN_KEY: &str = "turnstileToken";

/// Storage key holding the token expiry written by the upstream page
pub const TOKEN_EXPIRY_KEY: &str = "tokenExpiry";

/// Storage key holding the page's chat history
pub const CHAT_MESSAGES_KEY: &str = "chatMessages";

/// Browser cookie captured from the upstream page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "/".to_string()
}

impl Cookie {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: default_path(),
        }
    }
}

/// Client-side storage of the upstream page
pub type Storage = IndexMap<String, String>;

/// Authentication materials for the upstream service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub storage: Storage,
}

impl SessionState {
    /// Non-empty turnstile token, if the page stored one
    #[must_use]
    pub fn turnstile_token(&self) -> Option<&str> {
        self.storage
            .get(TURNSTILE_TOKEN_KEY)
            .map(String::as_str)
            .filter(|token| !token.is_empty())
    }

    /// `Cookie` header value (`name=value; ...`), `None` without cookies
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        Some(
            self.cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// State read at a given store generation
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Number of `set` calls that preceded this read
    pub generation: u64,
    pub state: Arc<SessionState>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    state: Arc<SessionState>,
}

/// Shared holder of the current [`SessionState`]
///
/// `set` is last-writer-wins and visible to every `get` that starts after it returns.
#[derive(Debug, Default)]
pub struct SessionStore {
    slot: RwLock<Slot>,
}

impl SessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole session
    pub fn set(&self, cookies: Vec<Cookie>, storage: Storage) {
        self.replace(SessionState { cookies, storage });
    }

    /// Replace the whole session with an already assembled state
    pub fn replace(&self, state: SessionState) {
        let state = Arc::new(state);
        let mut slot = self.slot.write();
        slot.generation += 1;
        slot.state = state;
    }

    /// Current session
    #[must_use]
    pub fn get(&self) -> Arc<SessionState> {
        Arc::clone(&self.slot.read().state)
    }

    /// Current session together with its generation
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let slot = self.slot.read();
        SessionSnapshot {
            generation: slot.generation,
            state: Arc::clone(&slot.state),
        }
    }

    /// Number of replacements so far
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.slot.read().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(token: &str) -> Storage {
        let mut storage = Storage::new();
        storage.insert(TOKEN_EXPIRY_KEY.to_string(), "1735693261".to_string());
        storage.insert(CHAT_MESSAGES_KEY.to_string(), "[]".to_string());
        storage.insert(TURNSTILE_TOKEN_KEY.to_string(), token.to_string());
        storage
    }

    #[test]
    fn test_starts_empty() {
        let store = SessionStore::new();
        let state = store.get();

        assert!(state.cookies.is_empty());
        assert!(state.storage.is_empty());
        assert_eq!(store.generation(), 0);
        assert_eq!(state.cookie_header(), None);
    }

    #[test]
    fn test_get_is_idempotent() {
        let store = SessionStore::new();
        store.set(vec![Cookie::new("sid", "1")], storage("tok"));

        let first = store.get();
        let second = store.get();
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_set_replaces_wholesale() {
        let store = SessionStore::new();
        store.set(
            vec![Cookie::new("sid", "1"), Cookie::new("cf", "x")],
            storage("old"),
        );
        store.set(vec![Cookie::new("sid", "2")], Storage::new());

        let state = store.get();
        assert_eq!(state.cookies, vec![Cookie::new("sid", "2")]);
        assert!(state.storage.is_empty());
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn test_earlier_snapshot_is_unchanged() {
        let store = SessionStore::new();
        store.set(vec![Cookie::new("sid", "1")], storage("a"));
        let before = store.snapshot();

        store.set(vec![Cookie::new("sid", "2")], storage("b"));

        assert_eq!(before.generation, 1);
        assert_eq!(before.state.turnstile_token(), Some("a"));
        assert_eq!(store.get().turnstile_token(), Some("b"));
    }

    #[test]
    fn test_turnstile_token_ignores_empty() {
        let state = SessionState {
            cookies: Vec::new(),
            storage: storage(""),
        };
        assert_eq!(state.turnstile_token(), None);
    }

    #[test]
    fn test_cookie_header_keeps_order() {
        let state = SessionState {
            cookies: vec![Cookie::new("b", "2"), Cookie::new("a", "1")],
            storage: Storage::new(),
        };
        assert_eq!(state.cookie_header().as_deref(), Some("b=2; a=1"));
    }

    #[test]
    fn test_concurrent_readers_see_last_write() {
        let store = Arc::new(SessionStore::new());

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.set(vec![Cookie::new("sid", i.to_string())], Storage::new());
                })
            })
            .collect();
        for handle in writers {
            handle.join().unwrap();
        }

        assert_eq!(store.generation(), 8);
        assert_eq!(store.get().cookies.len(), 1);
    }
}
