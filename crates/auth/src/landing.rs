//! Landing module resolution.
//!
//! Priority chain, first match wins:
//! 1. the session-scoped module (chosen at login or restored on resume)
//! 2. the account's default module
//! 3. the module of the account's first grant, in grant order
//! 4. the configured fallback
//!
//! Routing depends on this order; it is a contract, not a heuristic.

use serde::{Deserialize, Serialize};

use crate::{Account, Module, SessionSnapshot};

/// Landing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingPolicy {
    /// Module used when an account has no default and no grants at all.
    pub fallback: Module,
}

impl LandingPolicy {
    pub fn new(fallback: Module) -> Self {
        Self { fallback }
    }
}

impl Default for LandingPolicy {
    fn default() -> Self {
        Self {
            fallback: Module::Education,
        }
    }
}

/// Which module a session should land in.
pub fn resolve_landing_module(session: &SessionSnapshot, policy: &LandingPolicy) -> Module {
    session
        .active_module
        .unwrap_or_else(|| account_landing_module(session.account(), policy))
}

/// Steps 2-4 of the chain, ignoring any session-scoped choice.
pub fn account_landing_module(account: Option<&Account>, policy: &LandingPolicy) -> Module {
    account
        .and_then(|a| {
            a.default_module
                .or_else(|| a.permissions.first().map(|grant| grant.module))
        })
        .unwrap_or(policy.fallback)
}
