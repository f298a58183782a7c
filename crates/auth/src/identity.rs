use std::sync::Arc;

use campus_core::AccountId;

use crate::Account;

/// Read-only view of the Identity Store.
///
/// The store owns account records and is their only writer; the engine never
/// mutates an account through this interface.
pub trait IdentityStore: Send + Sync {
    fn find_account_by_username(&self, username: &str) -> Option<Account>;

    fn find_account_by_id(&self, id: AccountId) -> Option<Account>;

    fn is_active(&self, account: &Account) -> bool {
        account.active
    }

    /// Check a presented password against the stored credential.
    ///
    /// With no account the check must still cost as much as a real one and
    /// return `false`, so a missing username cannot be told apart by timing.
    fn verify_password(&self, account: Option<&Account>, password: &str) -> bool;
}

impl<S> IdentityStore for Arc<S>
where
    S: IdentityStore + ?Sized,
{
    fn find_account_by_username(&self, username: &str) -> Option<Account> {
        (**self).find_account_by_username(username)
    }

    fn find_account_by_id(&self, id: AccountId) -> Option<Account> {
        (**self).find_account_by_id(id)
    }

    fn is_active(&self, account: &Account) -> bool {
        (**self).is_active(account)
    }

    fn verify_password(&self, account: Option<&Account>, password: &str) -> bool {
        (**self).verify_password(account, password)
    }
}
