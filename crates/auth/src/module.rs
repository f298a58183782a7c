use core::str::FromStr;

use serde::{Deserialize, Serialize};

use campus_core::DomainError;

/// A coarse-grained business area that permission grants are scoped to.
///
/// The set is closed: a grant, a default module or a persisted session naming
/// anything else is rejected at parse time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Hostel,
    Education,
    Accounts,
    Library,
    Boarding,
}

impl Module {
    /// Every recognised module, in declaration order.
    pub const ALL: [Module; 5] = [
        Module::Hostel,
        Module::Education,
        Module::Accounts,
        Module::Library,
        Module::Boarding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Hostel => "hostel",
            Module::Education => "education",
            Module::Accounts => "accounts",
            Module::Library => "library",
            Module::Boarding => "boarding",
        }
    }
}

impl core::fmt::Display for Module {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Module::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| DomainError::validation(format!("unknown module '{needle}'")))
    }
}
