use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Client,
    Worker,
    Admin,
}

/// What a caller may do. Every workflow entry point checks one of these
/// through [`Role::require`] instead of comparing roles directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    PostProjects,
    BidOnProjects,
    Administer,
}

impl Capability {
    fn describe(self) -> &'static str {
        match self {
            Capability::PostProjects => "Only clients can post projects",
            Capability::BidOnProjects => "Only workers can apply to projects",
            Capability::Administer => "Admin access required",
        }
    }
}

impl Role {
    pub fn has(self, capability: Capability) -> bool {
        matches!(
            (self, capability),
            (Role::Client, Capability::PostProjects)
                | (Role::Worker, Capability::BidOnProjects)
                | (Role::Admin, Capability::Administer)
        )
    }

    pub fn require(self, capability: Capability) -> Result<(), AppError> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden(capability.describe().to_string()))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Worker => "WORKER",
            Role::Admin => "ADMIN",
        }
    }
}
