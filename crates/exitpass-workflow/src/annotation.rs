//! Background motive annotation.
//!
//! Classification runs after the record is committed and is merged back
//! through the same compare-and-swap path as every other write. Nothing
//! here can fail the request that triggered it.

use std::sync::Arc;
use std::time::Duration;

use exitpass_core::annotator::MotiveAnnotator;
use exitpass_core::error::{ExitPassError, ExitPassResult};
use exitpass_core::models::permit::MotiveAnalysis;
use exitpass_core::repository::PermitRepository;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::retry::update_with_retry;

const COLLABORATOR: &str = "motive_annotator";

/// Annotator for deployments without a classification backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAnnotator;

impl MotiveAnnotator for DisabledAnnotator {
    async fn classify(&self, _motive: &str) -> ExitPassResult<MotiveAnalysis> {
        Err(ExitPassError::Collaborator {
            collaborator: COLLABORATOR.into(),
            message: "motive annotation is disabled".into(),
        })
    }
}

/// Owned inputs of one annotation task.
pub(crate) struct AnnotationJob<P, A> {
    pub permits: Arc<P>,
    pub annotator: Arc<A>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub permit_id: Uuid,
    pub motive: String,
}

impl<P: PermitRepository, A: MotiveAnnotator> AnnotationJob<P, A> {
    /// Classify and merge, logging instead of returning any failure.
    pub(crate) async fn run(self) {
        let permit_id = self.permit_id;
        match self.classify_and_merge().await {
            Ok(analysis) => debug!(
                permit_id = %permit_id,
                category = %analysis.category,
                "Motive annotation merged"
            ),
            Err(e) => warn!(permit_id = %permit_id, error = %e, "Motive annotation skipped"),
        }
    }

    async fn classify_and_merge(&self) -> ExitPassResult<MotiveAnalysis> {
        let analysis = tokio::time::timeout(self.timeout, self.annotator.classify(&self.motive))
            .await
            .map_err(|_| ExitPassError::Collaborator {
                collaborator: COLLABORATOR.into(),
                message: format!("no answer within {}s", self.timeout.as_secs()),
            })??;

        update_with_retry(
            self.permits.as_ref(),
            self.max_retries,
            self.permit_id,
            |current| {
                let mut next = current.clone();
                next.motive_analysis = Some(analysis.clone());
                Ok(next)
            },
        )
        .await?;

        Ok(analysis)
    }
}
