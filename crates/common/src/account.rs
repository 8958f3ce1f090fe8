use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Login name of the administrator created at bootstrap.
pub const DEFAULT_ADMIN_LOGIN: &str = "admin";
/// Factory credential of the administrator created at bootstrap.
pub const DEFAULT_ADMIN_CREDENTIAL: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "administrator" => Ok(Role::Administrator),
            "user" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// An identity with a role and a stored credential hash.
///
/// `login_name` is unique within its role; the administrator and user
/// namespaces never overlap in lookups.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub login_name: String,
    /// PHC-formatted argon2 hash
    pub credential_hash: String,
    pub role: Role,
    /// Only ever true for the administrator, and only until the factory
    /// credential has been replaced.
    pub uses_default_credential: bool,
}

impl Account {
    pub fn new(login_name: impl Into<String>, credential_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            login_name: login_name.into(),
            credential_hash,
            role,
            uses_default_credential: false,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("login_name", &self.login_name)
            .field("role", &self.role)
            .field("uses_default_credential", &self.uses_default_credential)
            .finish_non_exhaustive()
    }
}
