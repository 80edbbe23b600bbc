//! SurrealDB implementation of [`PermitEventRepository`].

use chrono::{DateTime, Utc};
use exitpass_core::error::ExitPassResult;
use exitpass_core::models::actor::Role;
use exitpass_core::models::audit::{CreatePermitEvent, PermitEvent};
use exitpass_core::models::permit::{PermitAction, PermitStatus};
use exitpass_core::repository::PermitEventRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::permit::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct EventRowWithId {
    record_id: String,
    permit_id: String,
    actor_id: String,
    actor_name: String,
    actor_role: String,
    action: String,
    from_status: Option<String>,
    to_status: String,
    occurred_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    match s {
        "Employee" => Ok(Role::Employee),
        "Manager" => Ok(Role::Manager),
        "HumanResources" => Ok(Role::HumanResources),
        "Security" => Ok(Role::Security),
        "Admin" => Ok(Role::Admin),
        other => Err(DbError::Decode(format!("unknown role: {other}"))),
    }
}

fn role_to_string(role: Role) -> &'static str {
    match role {
        Role::Employee => "Employee",
        Role::Manager => "Manager",
        Role::HumanResources => "HumanResources",
        Role::Security => "Security",
        Role::Admin => "Admin",
    }
}

fn parse_status(s: &str) -> Result<PermitStatus, DbError> {
    s.parse::<PermitStatus>()
        .map_err(|e| DbError::Decode(e.to_string()))
}

impl EventRowWithId {
    fn try_into_event(self) -> Result<PermitEvent, DbError> {
        Ok(PermitEvent {
            id: parse_uuid(&self.record_id, "event")?,
            permit_id: parse_uuid(&self.permit_id, "permit")?,
            actor_id: parse_uuid(&self.actor_id, "actor")?,
            actor_name: self.actor_name,
            actor_role: parse_role(&self.actor_role)?,
            action: self
                .action
                .parse::<PermitAction>()
                .map_err(DbError::Decode)?,
            from_status: self.from_status.as_deref().map(parse_status).transpose()?,
            to_status: parse_status(&self.to_status)?,
            occurred_at: self.occurred_at,
        })
    }
}

/// SurrealDB implementation of the permit audit trail.
#[derive(Clone)]
pub struct SurrealPermitEventRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermitEventRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PermitEventRepository for SurrealPermitEventRepository<C> {
    async fn record(&self, input: CreatePermitEvent) -> ExitPassResult<PermitEvent> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('permit_event', $id) SET \
                 permit_id = $permit_id, \
                 actor_id = $actor_id, \
                 actor_name = $actor_name, \
                 actor_role = $actor_role, \
                 action = $action, \
                 from_status = $from_status, \
                 to_status = $to_status, \
                 occurred_at = $occurred_at",
            )
            .bind(("id", id.to_string()))
            .bind(("permit_id", input.permit_id.to_string()))
            .bind(("actor_id", input.actor_id.to_string()))
            .bind(("actor_name", input.actor_name.clone()))
            .bind(("actor_role", role_to_string(input.actor_role).to_string()))
            .bind(("action", input.action.as_str().to_string()))
            .bind((
                "from_status",
                input.from_status.map(|s| s.as_str().to_string()),
            ))
            .bind(("to_status", input.to_status.as_str().to_string()))
            .bind(("occurred_at", input.occurred_at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(PermitEvent {
            id,
            permit_id: input.permit_id,
            actor_id: input.actor_id,
            actor_name: input.actor_name,
            actor_role: input.actor_role,
            action: input.action,
            from_status: input.from_status,
            to_status: input.to_status,
            occurred_at: input.occurred_at,
        })
    }

    async fn list_for_permit(&self, permit_id: Uuid) -> ExitPassResult<Vec<PermitEvent>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permit_event \
                 WHERE permit_id = $permit_id \
                 ORDER BY occurred_at ASC",
            )
            .bind(("permit_id", permit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EventRowWithId> = result.take(0).map_err(DbError::from)?;

        let events = rows
            .into_iter()
            .map(|row| row.try_into_event())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(events)
    }
}
