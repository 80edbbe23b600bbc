//! Transport-neutral command model.
//!
//! One serde-tagged enum per mutating operation, so any transport can
//! deserialize a request body and hand it to [`PermitService::execute`].

use exitpass_core::annotator::MotiveAnnotator;
use exitpass_core::error::{ErrorKind, ExitPassError, ExitPassResult};
use exitpass_core::models::actor::Actor;
use exitpass_core::models::permit::{PermitAction, PermitDetails, PermitRequest};
use exitpass_core::repository::{PermitEventRepository, PermitRepository};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::PermitService;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PermitCommand {
    Create {
        actor: Actor,
        details: PermitDetails,
    },
    Approve {
        actor: Actor,
        permit_id: Uuid,
    },
    Reject {
        actor: Actor,
        permit_id: Uuid,
    },
    RecordExit {
        actor: Actor,
        permit_id: Uuid,
    },
    RecordReturn {
        actor: Actor,
        permit_id: Uuid,
    },
    AttachProof {
        actor: Actor,
        permit_id: Uuid,
        reference: String,
        #[serde(default)]
        content_type: Option<String>,
    },
}

impl PermitCommand {
    pub fn action(&self) -> PermitAction {
        match self {
            PermitCommand::Create { .. } => PermitAction::Create,
            PermitCommand::Approve { .. } => PermitAction::Approve,
            PermitCommand::Reject { .. } => PermitAction::Reject,
            PermitCommand::RecordExit { .. } => PermitAction::RecordExit,
            PermitCommand::RecordReturn { .. } => PermitAction::RecordReturn,
            PermitCommand::AttachProof { .. } => PermitAction::AttachProof,
        }
    }

    pub fn actor(&self) -> &Actor {
        match self {
            PermitCommand::Create { actor, .. }
            | PermitCommand::Approve { actor, .. }
            | PermitCommand::Reject { actor, .. }
            | PermitCommand::RecordExit { actor, .. }
            | PermitCommand::RecordReturn { actor, .. }
            | PermitCommand::AttachProof { actor, .. } => actor,
        }
    }
}

/// Structured error returned to callers of the command surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ExitPassError> for ErrorBody {
    fn from(err: &ExitPassError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl<P, E, A> PermitService<P, E, A>
where
    P: PermitRepository + 'static,
    E: PermitEventRepository,
    A: MotiveAnnotator + 'static,
{
    /// Run one command and return the resulting record.
    pub async fn execute(&self, command: PermitCommand) -> ExitPassResult<PermitRequest> {
        match command {
            PermitCommand::Create { actor, details } => {
                self.create_request(&actor, details).await
            }
            PermitCommand::Approve { actor, permit_id } => self.approve(&actor, permit_id).await,
            PermitCommand::Reject { actor, permit_id } => self.reject(&actor, permit_id).await,
            PermitCommand::RecordExit { actor, permit_id } => {
                self.record_exit(&actor, permit_id).await
            }
            PermitCommand::RecordReturn { actor, permit_id } => {
                self.record_return(&actor, permit_id).await
            }
            PermitCommand::AttachProof {
                actor,
                permit_id,
                reference,
                content_type,
            } => {
                self.attach_proof(&actor, permit_id, reference, content_type)
                    .await
            }
        }
    }
}
