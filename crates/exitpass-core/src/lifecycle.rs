//! Permit lifecycle engine.
//!
//! The one place that decides which role may act on a permit in which
//! status, what status the action leads to, and which timestamp it stamps.
//! Everything here is pure: callers read a record, [`plan`] a transition
//! against it, [`Transition::apply`] it to a copy and hand the copy to the
//! store.
//!
//! ```text
//! PendingManager --approve--> PendingHR --approve--> Approved --exit--> Exited --return--> Returned
//!       |                         |                                  (WillReturn only)
//!     reject                    reject
//!       v                         v
//! RejectedByManager          RejectedByHR
//! ```

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{ExitPassError, ExitPassResult};
use crate::models::actor::{Actor, Role};
use crate::models::permit::{
    ExitKind, PermitAction, PermitDetails, PermitRequest, PermitStatus, ReturnExpectation,
};

/// Lifecycle timestamp set by exactly one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    BossApproval,
    HrApproval,
    SecurityExit,
    SecurityReturn,
}

/// A validated status change for one permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub action: PermitAction,
    pub from: PermitStatus,
    pub to: PermitStatus,
    pub stamp: Option<Stamp>,
}

impl Transition {
    /// Move `permit` to the target status and stamp the transition's
    /// timestamp. Status and timestamp change together or not at all.
    pub fn apply(&self, permit: &mut PermitRequest, at: DateTime<Utc>) {
        debug_assert_eq!(permit.status, self.from);
        let slot = match self.stamp {
            Some(Stamp::BossApproval) => Some(&mut permit.boss_approval_date),
            Some(Stamp::HrApproval) => Some(&mut permit.hr_approval_date),
            Some(Stamp::SecurityExit) => Some(&mut permit.security_exit_date),
            Some(Stamp::SecurityReturn) => Some(&mut permit.security_return_date),
            None => None,
        };
        if let Some(slot) = slot {
            // Each stamp belongs to a single edge of the graph, so it can
            // only be empty here.
            debug_assert!(slot.is_none());
            slot.get_or_insert(at);
        }
        permit.status = self.to;
    }
}

/// Check that `actor` may create a request with `details` on `today`.
pub fn validate_creation(
    actor: &Actor,
    details: &PermitDetails,
    today: NaiveDate,
) -> ExitPassResult<()> {
    if actor.role != Role::Employee {
        return Err(ExitPassError::unauthorized(format!(
            "only employees can request an exit permit, actor has role {:?}",
            actor.role
        )));
    }
    if details.motive.trim().is_empty() {
        return Err(ExitPassError::validation("motive must not be empty"));
    }
    if details.exit_kind == ExitKind::Unplanned && details.date < today {
        return Err(ExitPassError::validation(format!(
            "unplanned exits cannot be dated before today ({today}), got {}",
            details.date
        )));
    }
    Ok(())
}

/// Resolve `action` by `actor` against the permit's current status.
///
/// Status is checked before role: an action that is not defined for the
/// current status fails with `InvalidTransition` whoever asks, and a defined
/// action requested by the wrong role (or the wrong sector's manager) fails
/// with `Unauthorized`.
pub fn plan(
    actor: &Actor,
    permit: &PermitRequest,
    action: PermitAction,
) -> ExitPassResult<Transition> {
    let from = permit.status;
    let invalid = || ExitPassError::InvalidTransition {
        action,
        status: from,
    };

    let (to, stamp) = match (action, from) {
        (PermitAction::Approve, PermitStatus::PendingManager) => {
            authorize_manager(actor, permit)?;
            (PermitStatus::PendingHR, Some(Stamp::BossApproval))
        }
        (PermitAction::Reject, PermitStatus::PendingManager) => {
            authorize_manager(actor, permit)?;
            (PermitStatus::RejectedByManager, None)
        }
        (PermitAction::Approve, PermitStatus::PendingHR) => {
            require_role(actor, Role::HumanResources, action, from)?;
            (PermitStatus::Approved, Some(Stamp::HrApproval))
        }
        (PermitAction::Reject, PermitStatus::PendingHR) => {
            require_role(actor, Role::HumanResources, action, from)?;
            (PermitStatus::RejectedByHR, None)
        }
        (PermitAction::RecordExit, PermitStatus::Approved) => {
            require_role(actor, Role::Security, action, from)?;
            (PermitStatus::Exited, Some(Stamp::SecurityExit))
        }
        (PermitAction::RecordReturn, PermitStatus::Exited)
            if permit.return_expectation == ReturnExpectation::WillReturn =>
        {
            require_role(actor, Role::Security, action, from)?;
            (PermitStatus::Returned, Some(Stamp::SecurityReturn))
        }
        _ => return Err(invalid()),
    };

    Ok(Transition {
        action,
        from,
        to,
        stamp,
    })
}

/// Proof can be attached by the requesting employee at any status.
pub fn authorize_proof(actor: &Actor, permit: &PermitRequest) -> ExitPassResult<()> {
    if actor.id != permit.employee_id {
        return Err(ExitPassError::unauthorized(format!(
            "only the requesting employee can attach proof to permit {}",
            permit.id
        )));
    }
    Ok(())
}

/// Whether any further transition is defined for this permit.
pub fn is_terminal(permit: &PermitRequest) -> bool {
    if permit.status.is_rejected() {
        return true;
    }
    match permit.status {
        PermitStatus::Returned => true,
        PermitStatus::Exited => permit.return_expectation == ReturnExpectation::WillNotReturn,
        _ => false,
    }
}

/// Actions the presentation layer should offer `actor` for `permit`.
///
/// Workflow actions are listed when [`plan`] would accept them. Proof
/// attachment is only offered once the employee has left, if proof was
/// promised and nothing is attached yet, even though [`authorize_proof`]
/// accepts it at any point.
pub fn available_actions(actor: &Actor, permit: &PermitRequest) -> Vec<PermitAction> {
    let mut actions: Vec<PermitAction> = [
        PermitAction::Approve,
        PermitAction::Reject,
        PermitAction::RecordExit,
        PermitAction::RecordReturn,
    ]
    .into_iter()
    .filter(|action| plan(actor, permit, *action).is_ok())
    .collect();

    if authorize_proof(actor, permit).is_ok()
        && permit.awaiting_proof()
        && matches!(
            permit.status,
            PermitStatus::Exited | PermitStatus::Returned
        )
    {
        actions.push(PermitAction::AttachProof);
    }

    actions
}

/// Who may read a single permit and its audit trail: the requester, the
/// manager of its sector, and the organization-wide roles.
pub fn authorize_view(actor: &Actor, permit: &PermitRequest) -> ExitPassResult<()> {
    let allowed = match actor.role {
        Role::Employee => actor.id == permit.employee_id,
        Role::Manager => actor.in_sector(&permit.sector),
        Role::HumanResources | Role::Security | Role::Admin => true,
    };
    if !allowed {
        return Err(ExitPassError::unauthorized(format!(
            "actor {} cannot view permit {}",
            actor.id, permit.id
        )));
    }
    Ok(())
}

/// Historical search is open to the gate, HR and administrators.
pub fn authorize_search(actor: &Actor) -> ExitPassResult<()> {
    match actor.role {
        Role::HumanResources | Role::Security | Role::Admin => Ok(()),
        Role::Employee | Role::Manager => Err(ExitPassError::unauthorized(format!(
            "historical search is not available to role {:?}",
            actor.role
        ))),
    }
}

fn authorize_manager(actor: &Actor, permit: &PermitRequest) -> ExitPassResult<()> {
    if actor.role != Role::Manager {
        return Err(ExitPassError::unauthorized(format!(
            "permit {} is awaiting a sector manager, actor has role {:?}",
            permit.id, actor.role
        )));
    }
    if !actor.in_sector(&permit.sector) {
        return Err(ExitPassError::unauthorized(format!(
            "manager of sector {} cannot act on permits of sector {}",
            actor.sector.as_deref().unwrap_or("<none>"),
            permit.sector
        )));
    }
    Ok(())
}

fn require_role(
    actor: &Actor,
    role: Role,
    action: PermitAction,
    status: PermitStatus,
) -> ExitPassResult<()> {
    if actor.role != role {
        return Err(ExitPassError::unauthorized(format!(
            "{action} on a {status} permit requires role {role:?}, actor has role {:?}",
            actor.role
        )));
    }
    Ok(())
}
