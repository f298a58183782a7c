//! Identity record consumed by the authorization engine.
//!
//! Accounts are owned by the Identity Store. The engine only ever reads a
//! snapshot; grant changes take effect the next time a token is validated.

use serde::{Deserialize, Serialize};

use campus_core::AccountId;

use crate::{Module, ModuleGrants};

/// Informational account role.
///
/// Shown in the console header and audit output. Authorization decisions
/// never look at it: module grants are the only source of access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Staff,
    Viewer,
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Manager => write!(f, "manager"),
            Role::Staff => write!(f, "staff"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

/// Account snapshot.
///
/// # Invariants
/// - `permissions` holds at most one grant per module (enforced by [`ModuleGrants`]).
/// - Every module named in `permissions` or `default_module` is a recognised [`Module`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub permissions: ModuleGrants,
    #[serde(default)]
    pub default_module: Option<Module>,
    pub active: bool,
}

impl Account {
    /// An active account with no grants and no default module.
    pub fn new(id: AccountId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::default(),
            permissions: ModuleGrants::empty(),
            default_module: None,
            active: true,
        }
    }

    pub fn with_names(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_permissions(mut self, permissions: ModuleGrants) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_default_module(mut self, module: Module) -> Self {
        self.default_module = Some(module);
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// "First Last", or the username when no name is on record.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}
