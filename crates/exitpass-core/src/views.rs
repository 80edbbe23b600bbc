//! Read-only views over a snapshot of permit records.
//!
//! Every function here is a pure filter: it borrows the full record set,
//! mutates nothing, and must simply be re-run when the set changes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::actor::{Actor, Role};
use crate::models::permit::{PermitRequest, PermitStatus};

/// Records the employee requested.
pub fn employee_view<'a>(actor: &Actor, records: &'a [PermitRequest]) -> Vec<&'a PermitRequest> {
    records
        .iter()
        .filter(|r| r.employee_id == actor.id)
        .collect()
}

/// Requests of the manager's sector still waiting on the manager.
pub fn manager_view<'a>(actor: &Actor, records: &'a [PermitRequest]) -> Vec<&'a PermitRequest> {
    records
        .iter()
        .filter(|r| r.status == PermitStatus::PendingManager && actor.in_sector(&r.sector))
        .collect()
}

pub fn hr_view(records: &[PermitRequest]) -> Vec<&PermitRequest> {
    records
        .iter()
        .filter(|r| {
            matches!(
                r.status,
                PermitStatus::PendingHR
                    | PermitStatus::Approved
                    | PermitStatus::Exited
                    | PermitStatus::Returned
            )
        })
        .collect()
}

/// Permits the gate has to act on: approved, or out and possibly returning.
pub fn security_view(records: &[PermitRequest]) -> Vec<&PermitRequest> {
    records
        .iter()
        .filter(|r| matches!(r.status, PermitStatus::Approved | PermitStatus::Exited))
        .collect()
}

/// The default list for `actor`'s role. Admins see every record.
pub fn dashboard<'a>(actor: &Actor, records: &'a [PermitRequest]) -> Vec<&'a PermitRequest> {
    match actor.role {
        Role::Employee => employee_view(actor, records),
        Role::Manager => manager_view(actor, records),
        Role::HumanResources => hr_view(records),
        Role::Security => security_view(records),
        Role::Admin => records.iter().collect(),
    }
}

/// Historical search filters. Unset fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermitSearch {
    /// Substring of the requesting employee's id.
    pub employee_id: Option<String>,
    pub status: Option<PermitStatus>,
    /// Inclusive lower bound on the requested exit date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the requested exit date.
    pub date_to: Option<NaiveDate>,
}

impl PermitSearch {
    pub fn is_empty(&self) -> bool {
        self.employee_id.as_deref().is_none_or(str::is_empty)
            && self.status.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    pub fn matches(&self, record: &PermitRequest) -> bool {
        let id_ok = match self.employee_id.as_deref() {
            Some(needle) if !needle.is_empty() => {
                record.employee_id.to_string().contains(needle)
            }
            _ => true,
        };
        id_ok
            && self.status.is_none_or(|s| record.status == s)
            && self.date_from.is_none_or(|from| record.date >= from)
            && self.date_to.is_none_or(|to| record.date <= to)
    }
}

/// Unrestricted historical search. An empty filter returns the full history.
pub fn search<'a>(records: &'a [PermitRequest], filters: &PermitSearch) -> Vec<&'a PermitRequest> {
    records.iter().filter(|r| filters.matches(r)).collect()
}
