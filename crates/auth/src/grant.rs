use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use campus_core::DomainError;

use crate::{Capability, Module};

/// The capabilities an account holds within one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleGrant {
    pub module: Module,
    pub capabilities: BTreeSet<Capability>,
}

impl ModuleGrant {
    pub fn new(module: Module, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            module,
            capabilities: capabilities.into_iter().collect(),
        }
    }

    /// Whether this grant holds the `manage` superset marker.
    pub fn is_managed(&self) -> bool {
        self.capabilities.contains(&Capability::MANAGE)
    }

    /// Capability check within this grant's module (`manage` satisfies everything).
    pub fn allows(&self, capability: &Capability) -> bool {
        self.is_managed() || self.capabilities.contains(capability)
    }
}

/// An account's grants, in the order they were originally granted.
///
/// Each module appears at most once. Duplicates are a data-integrity
/// violation and are rejected on construction (including deserialization),
/// so resolver code never has to pick between two grants for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ModuleGrant>", into = "Vec<ModuleGrant>")]
pub struct ModuleGrants(Vec<ModuleGrant>);

impl ModuleGrants {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn new(grants: Vec<ModuleGrant>) -> Result<Self, DomainError> {
        let mut seen = HashSet::with_capacity(grants.len());
        for grant in &grants {
            if !seen.insert(grant.module) {
                return Err(DomainError::invariant(format!(
                    "duplicate grant for module '{}'",
                    grant.module
                )));
            }
        }
        Ok(Self(grants))
    }

    pub fn get(&self, module: Module) -> Option<&ModuleGrant> {
        self.0.iter().find(|g| g.module == module)
    }

    pub fn contains(&self, module: Module) -> bool {
        self.get(module).is_some()
    }

    /// The earliest grant in sequence order.
    pub fn first(&self) -> Option<&ModuleGrant> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleGrant> {
        self.0.iter()
    }

    pub fn modules(&self) -> impl Iterator<Item = Module> + '_ {
        self.0.iter().map(|g| g.module)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl TryFrom<Vec<ModuleGrant>> for ModuleGrants {
    type Error = DomainError;

    fn try_from(value: Vec<ModuleGrant>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ModuleGrants> for Vec<ModuleGrant> {
    fn from(value: ModuleGrants) -> Self {
        value.0
    }
}
