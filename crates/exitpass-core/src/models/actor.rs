//! Actor domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    Employee,
    Manager,
    HumanResources,
    Security,
    Admin,
}

impl Role {
    /// Label shown to users of the deployment.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Employee => "Empleado",
            Role::Manager => "Jefe de Sector",
            Role::HumanResources => "RRHH",
            Role::Security => "Portería",
            Role::Admin => "Administrador",
        }
    }
}

/// A participant invoking an operation.
///
/// `id` and `name` are used for attribution; authorization looks only at
/// `role` and, for managers, `sector`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub sector: Option<String>,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: Role, sector: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role,
            sector: sector.map(str::to_string),
        }
    }

    pub fn in_sector(&self, sector: &str) -> bool {
        self.sector.as_deref() == Some(sector)
    }
}
