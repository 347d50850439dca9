use crate::types::Role;
use serde::Serialize;
use std::fmt;

const ROLE_PREFIX: &str = "ROLE_";

/// Authorization tag checked by the route policy, e.g. `ROLE_ADMIN`.
///
/// Kept distinct from [`Role`], which is how the role is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Authority(String);

impl Authority {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Role> for Authority {
    fn from(role: Role) -> Self {
        Authority(format!("{}{}", ROLE_PREFIX, role.as_str()))
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity resolved for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn authorities(&self) -> Vec<Authority> {
        vec![Authority::from(self.role)]
    }

    /// True if this principal holds at least one of `required`.
    pub fn has_any_authority(&self, required: &[Authority]) -> bool {
        self.authorities().iter().any(|a| required.contains(a))
    }
}
