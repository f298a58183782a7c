//! Client-visible session snapshot.

use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::{Account, AuthError, Module};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Unauthenticated,
    Verifying,
    Authenticated,
    Error,
}

impl core::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SessionStatus::Unauthenticated => write!(f, "unauthenticated"),
            SessionStatus::Verifying => write!(f, "verifying"),
            SessionStatus::Authenticated => write!(f, "authenticated"),
            SessionStatus::Error => write!(f, "error"),
        }
    }
}

/// Read-only view of a session, handed to the presentation layer and to the
/// pure resolvers. The token is deliberately not part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub account: Option<Arc<Account>>,
    pub active_module: Option<Module>,
    #[serde(serialize_with = "serialize_error_code")]
    pub error: Option<AuthError>,
}

impl SessionSnapshot {
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn verifying() -> Self {
        Self {
            status: SessionStatus::Verifying,
            ..Self::default()
        }
    }

    pub fn authenticated(account: Arc<Account>, active_module: Option<Module>) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            account: Some(account),
            active_module,
            error: None,
        }
    }

    /// Authenticated status whose account has not been attached yet.
    pub fn awaiting_account(active_module: Option<Module>) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            active_module,
            ..Self::default()
        }
    }

    pub fn failed(error: AuthError) -> Self {
        Self {
            status: SessionStatus::Error,
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_deref()
    }
}

fn serialize_error_code<S: Serializer>(error: &Option<AuthError>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(err) => s.serialize_some(err.code()),
        None => s.serialize_none(),
    }
}
