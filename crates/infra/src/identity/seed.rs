//! Demo accounts for local development and black-box tests.

use campus_auth::{Account, Capability, Module, ModuleGrant, ModuleGrants, Role};
use campus_core::AccountId;

use super::{CredentialHasher, IdentityStoreError, InMemoryIdentityStore};

pub struct DemoAccount {
    pub username: &'static str,
    pub password: &'static str,
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub role: Role,
    pub grants: &'static [(Module, &'static [&'static str])],
    pub default_module: Option<Module>,
}

pub const DEMO_ACCOUNTS: &[DemoAccount] = &[
    DemoAccount {
        username: "admin",
        password: "admin123",
        first_name: "Ada",
        last_name: "Admin",
        role: Role::Admin,
        grants: &[
            (Module::Hostel, &["manage"]),
            (Module::Education, &["read", "write", "delete"]),
            (Module::Accounts, &["manage"]),
            (Module::Library, &["manage"]),
            (Module::Boarding, &["manage"]),
        ],
        default_module: None,
    },
    DemoAccount {
        username: "warden",
        password: "warden123",
        first_name: "Wes",
        last_name: "Warden",
        role: Role::Manager,
        grants: &[
            (Module::Hostel, &["read", "write", "manage"]),
            (Module::Boarding, &["read"]),
        ],
        default_module: Some(Module::Hostel),
    },
    DemoAccount {
        username: "teacher",
        password: "teacher123",
        first_name: "Tess",
        last_name: "Teacher",
        role: Role::Staff,
        grants: &[(Module::Education, &["read", "write"])],
        default_module: None,
    },
    DemoAccount {
        username: "librarian",
        password: "library123",
        first_name: "Lin",
        last_name: "Librarian",
        role: Role::Viewer,
        grants: &[(Module::Library, &["read"])],
        default_module: Some(Module::Accounts),
    },
];

impl DemoAccount {
    pub fn to_account(&self) -> Result<Account, IdentityStoreError> {
        let grants = self
            .grants
            .iter()
            .map(|(module, caps)| ModuleGrant::new(*module, caps.iter().copied().map(Capability::from)))
            .collect();
        let permissions =
            ModuleGrants::new(grants).map_err(|e| IdentityStoreError::InvalidRecord(e.to_string()))?;

        let mut account = Account::new(AccountId::new(), self.username)
            .with_names(self.first_name, self.last_name)
            .with_role(self.role)
            .with_permissions(permissions);
        account.default_module = self.default_module;
        Ok(account)
    }
}

/// An Identity Store holding [`DEMO_ACCOUNTS`].
pub fn demo_identity_store(hasher: CredentialHasher) -> Result<InMemoryIdentityStore, IdentityStoreError> {
    let store = InMemoryIdentityStore::with_hasher(hasher);
    for demo in DEMO_ACCOUNTS {
        store.insert(demo.to_account()?, demo.password)?;
    }
    tracing::info!(accounts = store.len(), "seeded demo identity store");
    Ok(store)
}
