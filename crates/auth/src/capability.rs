use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Capability identifier: a fine-grained action right within one module.
///
/// Capabilities are modeled as open strings ("read", "write", "export", ...).
/// The special capability [`Capability::MANAGE`] is a superset marker: a grant
/// holding it satisfies every capability check for that module, and nothing
/// outside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(Cow<'static, str>);

impl Capability {
    pub const READ: Capability = Capability(Cow::Borrowed("read"));
    pub const WRITE: Capability = Capability(Cow::Borrowed("write"));
    pub const DELETE: Capability = Capability(Cow::Borrowed("delete"));
    pub const MANAGE: Capability = Capability(Cow::Borrowed("manage"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_manage(&self) -> bool {
        self.as_str() == Self::MANAGE.as_str()
    }

    pub fn is_read(&self) -> bool {
        self.as_str() == Self::READ.as_str()
    }
}

impl Default for Capability {
    fn default() -> Self {
        Self::READ
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Capability {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}
