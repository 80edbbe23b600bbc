//! Optimistic-concurrency write loop shared by the service and the
//! annotation task.

use exitpass_core::error::{ExitPassError, ExitPassResult};
use exitpass_core::models::permit::PermitRequest;
use exitpass_core::repository::PermitRepository;
use tracing::debug;
use uuid::Uuid;

/// Read the permit, derive the next state with `mutate`, and write it back
/// with a compare-and-swap on `version`.
///
/// A lost race re-runs the whole read/mutate/write cycle, so `mutate` always
/// sees the latest committed state. Returns the state it was applied to and
/// the committed result.
pub(crate) async fn update_with_retry<P, F>(
    permits: &P,
    max_retries: u32,
    id: Uuid,
    mut mutate: F,
) -> ExitPassResult<(PermitRequest, PermitRequest)>
where
    P: PermitRepository,
    F: FnMut(&PermitRequest) -> ExitPassResult<PermitRequest> + Send,
{
    let mut attempt = 0;
    loop {
        let current = permits.get_by_id(id).await?;
        let next = mutate(&current)?;
        match permits.put(&next).await {
            Ok(saved) => return Ok((current, saved)),
            Err(ExitPassError::Conflict { .. }) if attempt < max_retries => {
                attempt += 1;
                debug!(permit_id = %id, attempt, "Concurrent write detected, retrying");
            }
            Err(e) => return Err(e),
        }
    }
}
