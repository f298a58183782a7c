//! Permission resolution over an account snapshot.
//!
//! - No IO
//! - No panics
//! - Total: a missing account has no access to anything

use crate::{Account, Capability, Module};

/// Whether the account holds any grant for `module`, whatever its capabilities.
pub fn has_module_access(account: Option<&Account>, module: Module) -> bool {
    account.is_some_and(|a| a.permissions.contains(module))
}

/// Whether the account may act with `capability` in `module`.
///
/// `manage` is the only wildcard and it is scoped to its own module.
pub fn has_capability(account: Option<&Account>, module: Module, capability: &Capability) -> bool {
    account
        .and_then(|a| a.permissions.get(module))
        .is_some_and(|grant| grant.allows(capability))
}

/// Modules the account can enter, in grant order.
pub fn accessible_modules(account: Option<&Account>) -> Vec<Module> {
    account
        .map(|a| a.permissions.modules().collect())
        .unwrap_or_default()
}
