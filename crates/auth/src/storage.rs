//! Client-local persistence of the session pair.

use std::sync::Arc;

use crate::{Module, SessionToken};

/// The two values that survive a reload: the token and the active module.
///
/// They are only ever present together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    pub token: SessionToken,
    pub active_module: Module,
}

impl PersistedSession {
    pub fn new(token: SessionToken, active_module: Module) -> Self {
        Self {
            token,
            active_module,
        }
    }

    /// Rebuild the pair from raw stored values.
    ///
    /// A missing, blank or unparsable half makes the whole pair absent.
    pub fn from_parts(token: Option<String>, active_module: Option<String>) -> Option<Self> {
        let token = token.filter(|t| !t.trim().is_empty())?;
        let active_module = active_module?.parse().ok()?;
        Some(Self::new(SessionToken::new(token), active_module))
    }
}

/// Durable client-side storage for [`PersistedSession`].
///
/// Infallible at the interface: implementations log their own I/O failures.
/// A failed load reads as "nothing persisted".
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<PersistedSession>;

    fn save(&self, session: &PersistedSession);

    /// Remove both halves together.
    fn clear(&self);
}

impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    fn load(&self) -> Option<PersistedSession> {
        (**self).load()
    }

    fn save(&self, session: &PersistedSession) {
        (**self).save(session)
    }

    fn clear(&self) {
        (**self).clear()
    }
}
