//! Permit service.
//!
//! Orchestrates the lifecycle engine over a record store: every mutating
//! operation reads the record, plans against what it read, and commits with
//! a compare-and-swap. Committed actions are appended to the audit trail.

use std::sync::Arc;
use std::time::Duration;

use exitpass_core::annotator::MotiveAnnotator;
use exitpass_core::clock::{Clock, SystemClock};
use exitpass_core::error::{ExitPassError, ExitPassResult};
use exitpass_core::lifecycle;
use exitpass_core::models::actor::Actor;
use exitpass_core::models::audit::{CreatePermitEvent, PermitEvent};
use exitpass_core::models::permit::{
    CreatePermit, PermitAction, PermitDetails, PermitRequest, PermitStatus, ProofArtifact,
    UNASSIGNED_SECTOR,
};
use exitpass_core::repository::{PermitEventRepository, PermitRepository};
use exitpass_core::views::{self, PermitSearch};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::annotation::AnnotationJob;
use crate::config::WorkflowConfig;
use crate::retry::update_with_retry;

/// Exit permit service.
///
/// Generic over the record store, the audit store and the motive annotator
/// so that the workflow has no dependency on the database crate.
pub struct PermitService<P, E, A> {
    permits: Arc<P>,
    events: E,
    annotator: Arc<A>,
    clock: Arc<dyn Clock>,
    config: WorkflowConfig,
    annotations: Mutex<JoinSet<()>>,
}

impl<P, E, A> PermitService<P, E, A>
where
    P: PermitRepository + 'static,
    E: PermitEventRepository,
    A: MotiveAnnotator + 'static,
{
    pub fn new(permits: P, events: E, annotator: A, config: WorkflowConfig) -> Self {
        Self {
            permits: Arc::new(permits),
            events,
            annotator: Arc::new(annotator),
            clock: Arc::new(SystemClock),
            config,
            annotations: Mutex::new(JoinSet::new()),
        }
    }

    /// Replace the time source used for "today" and for every timestamp
    /// the service stamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Submit a new exit request on behalf of an employee.
    ///
    /// Returns as soon as the record is stored. Motive annotation, when
    /// enabled, runs in the background and may land later.
    pub async fn create_request(
        &self,
        actor: &Actor,
        details: PermitDetails,
    ) -> ExitPassResult<PermitRequest> {
        lifecycle::validate_creation(actor, &details, self.clock.today())?;

        let motive = details.motive.clone();
        let permit = self
            .permits
            .create(CreatePermit {
                employee_id: actor.id,
                employee_name: actor.name.clone(),
                sector: actor
                    .sector
                    .clone()
                    .unwrap_or_else(|| UNASSIGNED_SECTOR.to_string()),
                details,
            })
            .await?;

        info!(
            permit_id = %permit.id,
            actor_id = %actor.id,
            sector = %permit.sector,
            exit_kind = permit.exit_kind.as_str(),
            "Exit permit requested"
        );
        self.audit(actor, &permit, PermitAction::Create, None).await;

        if self.config.annotate_motives {
            self.spawn_annotation(permit.id, motive).await;
        }

        Ok(permit)
    }

    /// Sector manager approval (`PendingManager`) or HR approval
    /// (`PendingHR`), depending on where the permit stands.
    pub async fn approve(&self, actor: &Actor, id: Uuid) -> ExitPassResult<PermitRequest> {
        self.transition(actor, id, PermitAction::Approve).await
    }

    pub async fn reject(&self, actor: &Actor, id: Uuid) -> ExitPassResult<PermitRequest> {
        self.transition(actor, id, PermitAction::Reject).await
    }

    pub async fn record_exit(&self, actor: &Actor, id: Uuid) -> ExitPassResult<PermitRequest> {
        self.transition(actor, id, PermitAction::RecordExit).await
    }

    pub async fn record_return(&self, actor: &Actor, id: Uuid) -> ExitPassResult<PermitRequest> {
        self.transition(actor, id, PermitAction::RecordReturn).await
    }

    /// Attach (or replace) the supporting document of a permit. Allowed to
    /// the requesting employee at any status; never changes the status.
    pub async fn attach_proof(
        &self,
        actor: &Actor,
        id: Uuid,
        reference: String,
        content_type: Option<String>,
    ) -> ExitPassResult<PermitRequest> {
        if reference.trim().is_empty() {
            return Err(ExitPassError::validation("proof reference must not be empty"));
        }

        let (before, saved) = update_with_retry(
            self.permits.as_ref(),
            self.config.max_write_retries,
            id,
            |current| {
                lifecycle::authorize_proof(actor, current)?;
                let mut next = current.clone();
                next.proof_artifact = Some(ProofArtifact {
                    reference: reference.clone(),
                    content_type: content_type.clone(),
                    attached_at: self.clock.now(),
                });
                Ok(next)
            },
        )
        .await?;

        info!(
            permit_id = %id,
            actor_id = %actor.id,
            status = %saved.status,
            replaced = before.proof_artifact.is_some(),
            "Proof attached"
        );
        self.audit(actor, &saved, PermitAction::AttachProof, Some(before.status))
            .await;

        Ok(saved)
    }

    /// The role's default list: own requests, the sector's pending
    /// requests, the HR queue, or the gate queue.
    pub async fn dashboard(&self, actor: &Actor) -> ExitPassResult<Vec<PermitRequest>> {
        let records = self.permits.list().await?;
        Ok(views::dashboard(actor, &records).into_iter().cloned().collect())
    }

    /// Historical search over all permits.
    pub async fn search(
        &self,
        actor: &Actor,
        filters: &PermitSearch,
    ) -> ExitPassResult<Vec<PermitRequest>> {
        lifecycle::authorize_search(actor)?;
        let records = self.permits.list().await?;
        Ok(views::search(&records, filters).into_iter().cloned().collect())
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> ExitPassResult<PermitRequest> {
        let permit = self.permits.get_by_id(id).await?;
        lifecycle::authorize_view(actor, &permit)?;
        Ok(permit)
    }

    /// Actions `actor` can take on the permit right now.
    pub async fn available_actions(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> ExitPassResult<Vec<PermitAction>> {
        let permit = self.permits.get_by_id(id).await?;
        lifecycle::authorize_view(actor, &permit)?;
        Ok(lifecycle::available_actions(actor, &permit))
    }

    /// Audit trail of a permit, oldest first.
    pub async fn history(&self, actor: &Actor, id: Uuid) -> ExitPassResult<Vec<PermitEvent>> {
        let permit = self.permits.get_by_id(id).await?;
        lifecycle::authorize_view(actor, &permit)?;
        self.events.list_for_permit(id).await
    }

    /// Wait until every annotation dispatched so far has finished.
    ///
    /// The lock is only held to take the pending set, so requests created
    /// meanwhile still dispatch their own annotation without waiting.
    pub async fn wait_for_annotations(&self) {
        let mut tasks = std::mem::take(&mut *self.annotations.lock().await);
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Motive annotation task aborted");
            }
        }
    }

    async fn transition(
        &self,
        actor: &Actor,
        id: Uuid,
        action: PermitAction,
    ) -> ExitPassResult<PermitRequest> {
        let mut planned_from: Option<PermitStatus> = None;

        let (before, saved) = update_with_retry(
            self.permits.as_ref(),
            self.config.max_write_retries,
            id,
            |current| {
                // Lost the race to a status change: the action no longer
                // applies to what the permit is now.
                if planned_from.is_some_and(|from| from != current.status) {
                    return Err(ExitPassError::InvalidTransition {
                        action,
                        status: current.status,
                    });
                }
                let transition = lifecycle::plan(actor, current, action)?;
                planned_from = Some(transition.from);

                let mut next = current.clone();
                transition.apply(&mut next, self.clock.now());
                Ok(next)
            },
        )
        .await?;

        info!(
            permit_id = %id,
            actor_id = %actor.id,
            role = ?actor.role,
            action = %action,
            from = %before.status,
            to = %saved.status,
            "Permit transition committed"
        );
        self.audit(actor, &saved, action, Some(before.status)).await;

        Ok(saved)
    }

    async fn audit(
        &self,
        actor: &Actor,
        permit: &PermitRequest,
        action: PermitAction,
        from_status: Option<PermitStatus>,
    ) {
        let event = CreatePermitEvent {
            permit_id: permit.id,
            actor_id: actor.id,
            actor_name: actor.name.clone(),
            actor_role: actor.role,
            action,
            from_status,
            to_status: permit.status,
            occurred_at: self.clock.now(),
        };
        if let Err(e) = self.events.record(event).await {
            warn!(
                permit_id = %permit.id,
                action = %action,
                error = %e,
                "Failed to append permit audit event"
            );
        }
    }

    async fn spawn_annotation(&self, permit_id: Uuid, motive: String) {
        let job = AnnotationJob {
            permits: Arc::clone(&self.permits),
            annotator: Arc::clone(&self.annotator),
            timeout: Duration::from_secs(self.config.annotation_timeout_secs),
            max_retries: self.config.max_write_retries,
            permit_id,
            motive,
        };

        let mut tasks = self.annotations.lock().await;
        // Reap finished tasks so the set only holds in-flight work.
        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                warn!(error = %e, "Motive annotation task aborted");
            }
        }
        tasks.spawn(job.run());
    }
}
