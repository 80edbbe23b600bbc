//! Motive annotation collaborator.

use crate::error::ExitPassResult;
use crate::models::permit::MotiveAnalysis;

/// Classifies the free-text motive of a request.
///
/// Results are advisory: they are merged into the record after creation and
/// never read by the lifecycle engine. Failures should be reported as
/// [`ExitPassError::Collaborator`](crate::error::ExitPassError::Collaborator).
pub trait MotiveAnnotator: Send + Sync {
    fn classify(&self, motive: &str) -> impl Future<Output = ExitPassResult<MotiveAnalysis>> + Send;
}
