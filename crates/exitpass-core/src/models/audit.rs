//! Permit audit trail model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actor::Role;
use super::permit::{PermitAction, PermitStatus};

/// One committed action on a permit, attributed to the actor that took it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermitEvent {
    pub id: Uuid,
    pub permit_id: Uuid,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub actor_role: Role,
    pub action: PermitAction,
    /// `None` for creation.
    pub from_status: Option<PermitStatus>,
    pub to_status: PermitStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreatePermitEvent {
    pub permit_id: Uuid,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub actor_role: Role,
    pub action: PermitAction,
    pub from_status: Option<PermitStatus>,
    pub to_status: PermitStatus,
    pub occurred_at: DateTime<Utc>,
}
