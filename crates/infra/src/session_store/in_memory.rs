use std::sync::RwLock;

use campus_auth::{PersistedSession, SessionStore};

/// Raw stored values, kept as the strings a browser-style key/value store
/// would hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSession {
    pub token: Option<String>,
    pub active_module: Option<String>,
}

/// In-memory Session Store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<RawSession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> RawSession {
        self.inner.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Overwrite the raw values directly, bypassing the pair invariant.
    pub fn set_raw(&self, raw: RawSession) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = raw;
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Option<PersistedSession> {
        let raw = self.raw();
        PersistedSession::from_parts(raw.token, raw.active_module)
    }

    fn save(&self, session: &PersistedSession) {
        self.set_raw(RawSession {
            token: Some(session.token.as_str().to_string()),
            active_module: Some(session.active_module.as_str().to_string()),
        });
    }

    fn clear(&self) {
        self.set_raw(RawSession::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_auth::{Module, SessionToken};

    #[test]
    fn pair_round_trips_and_clears_together() {
        let store = InMemorySessionStore::new();
        assert!(store.load().is_none());

        let pair = PersistedSession::new(SessionToken::new("tok"), Module::Library);
        store.save(&pair);
        assert_eq!(store.load(), Some(pair));

        store.clear();
        assert_eq!(store.raw(), RawSession::default());
    }

    #[test]
    fn corrupted_half_loads_as_nothing() {
        let store = InMemorySessionStore::new();
        store.set_raw(RawSession {
            token: Some("tok".into()),
            active_module: Some("cafeteria".into()),
        });
        assert!(store.load().is_none());
    }
}
