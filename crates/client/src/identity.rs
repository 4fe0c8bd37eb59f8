//! Signed-in identity as resolved by the external identity provider.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Staff,
    Admin,
}

impl Role {
    /// Staff and admins see store-wide attention items.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub role: Role,
}

impl Identity {
    pub fn new(uid: impl Into<String>, role: Role) -> Self {
        Self { uid: uid.into(), role }
    }
}
