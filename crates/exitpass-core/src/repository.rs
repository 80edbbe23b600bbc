//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The permit store is the
//! authoritative state; durability and transactionality are the
//! implementation's responsibility.

use uuid::Uuid;

use crate::error::ExitPassResult;
use crate::models::{
    audit::{CreatePermitEvent, PermitEvent},
    permit::{CreatePermit, PermitRequest},
};

pub trait PermitRepository: Send + Sync {
    /// Allocate a new record with status `PendingManager` and `version` 1.
    fn create(&self, input: CreatePermit)
    -> impl Future<Output = ExitPassResult<PermitRequest>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ExitPassResult<PermitRequest>> + Send;

    /// All records, newest first.
    fn list(&self) -> impl Future<Output = ExitPassResult<Vec<PermitRequest>>> + Send;

    /// Persist the mutable fields of `record` (status, lifecycle
    /// timestamps, motive analysis, proof artifact).
    ///
    /// Compare-and-swap on `record.version`: if the stored version differs
    /// the write is refused with `Conflict`. On success the returned record
    /// carries the bumped version.
    fn put(
        &self,
        record: &PermitRequest,
    ) -> impl Future<Output = ExitPassResult<PermitRequest>> + Send;
}

/// Append-only audit log of committed permit actions.
pub trait PermitEventRepository: Send + Sync {
    fn record(
        &self,
        input: CreatePermitEvent,
    ) -> impl Future<Output = ExitPassResult<PermitEvent>> + Send;

    /// Events for one permit, oldest first.
    fn list_for_permit(
        &self,
        permit_id: Uuid,
    ) -> impl Future<Output = ExitPassResult<Vec<PermitEvent>>> + Send;
}
