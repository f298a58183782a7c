//! Access guard: the decision gate in front of every protected screen/action.

use serde::{Deserialize, Serialize};

use crate::permissions::{has_capability, has_module_access};
use crate::{Capability, Module, SessionSnapshot, SessionStatus};

/// What a caller wants to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Path to come back to after a login redirect.
    pub path: String,
    /// `None` for module-agnostic resources (profile page, settings).
    pub module: Option<Module>,
    /// Defaults to `read`.
    #[serde(default)]
    pub capability: Capability,
}

impl AccessRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            module: None,
            capability: Capability::READ,
        }
    }

    pub fn in_module(mut self, module: Module) -> Self {
        self.module = Some(module);
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = capability;
        self
    }
}

/// Outcome of an access check.
///
/// Every variant is an expected result the caller branches on to pick what
/// to render; none of them is an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Proceed,
    RedirectToLogin { return_path: String },
    AwaitSession,
    DenyModule { module: Module },
    DenyPermission { module: Module, capability: Capability },
}

impl AccessDecision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, AccessDecision::Proceed)
    }
}

/// Decide whether `session` may perform `request`.
///
/// Rows are evaluated in order; module denial always wins over a
/// finer-grained permission denial, and an unattached account yields
/// `AwaitSession` before any permission logic runs.
pub fn check(session: &SessionSnapshot, request: &AccessRequest) -> AccessDecision {
    if session.status != SessionStatus::Authenticated {
        return AccessDecision::RedirectToLogin {
            return_path: request.path.clone(),
        };
    }

    let Some(account) = session.account() else {
        return AccessDecision::AwaitSession;
    };

    let Some(module) = request.module else {
        return AccessDecision::Proceed;
    };

    if !has_module_access(Some(account), module) {
        return AccessDecision::DenyModule { module };
    }

    if request.capability.is_read() {
        return AccessDecision::Proceed;
    }

    if !has_capability(Some(account), module, &request.capability) {
        return AccessDecision::DenyPermission {
            module,
            capability: request.capability.clone(),
        };
    }

    AccessDecision::Proceed
}
