//! SurrealDB implementation of [`PermitRepository`].
//!
//! Writes after creation go through a compare-and-swap on the `revision`
//! column, which is exposed to callers as `PermitRequest::version`.

use chrono::{DateTime, NaiveDate, Utc};
use exitpass_core::error::{ExitPassError, ExitPassResult};
use exitpass_core::models::permit::{
    CreatePermit, ExitKind, MotiveAnalysis, PermitRequest, PermitStatus, ProofArtifact,
    ReturnExpectation, hh_mm,
};
use exitpass_core::repository::PermitRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct PermitRow {
    employee_id: String,
    employee_name: String,
    sector: String,
    exit_date: String,
    exit_time: String,
    exit_kind: String,
    return_expectation: String,
    motive: String,
    will_present_proof: bool,
    status: String,
    boss_approval_date: Option<DateTime<Utc>>,
    hr_approval_date: Option<DateTime<Utc>>,
    security_exit_date: Option<DateTime<Utc>>,
    security_return_date: Option<DateTime<Utc>>,
    analysis_category: Option<String>,
    analysis_summary: Option<String>,
    analysis_is_reasonable: Option<bool>,
    proof_reference: Option<String>,
    proof_content_type: Option<String>,
    proof_attached_at: Option<DateTime<Utc>>,
    revision: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PermitRowWithId {
    record_id: String,
    employee_id: String,
    employee_name: String,
    sector: String,
    exit_date: String,
    exit_time: String,
    exit_kind: String,
    return_expectation: String,
    motive: String,
    will_present_proof: bool,
    status: String,
    boss_approval_date: Option<DateTime<Utc>>,
    hr_approval_date: Option<DateTime<Utc>>,
    security_exit_date: Option<DateTime<Utc>>,
    security_return_date: Option<DateTime<Utc>>,
    analysis_category: Option<String>,
    analysis_summary: Option<String>,
    analysis_is_reasonable: Option<bool>,
    proof_reference: Option<String>,
    proof_content_type: Option<String>,
    proof_attached_at: Option<DateTime<Utc>>,
    revision: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_exit_kind(s: &str) -> Result<ExitKind, DbError> {
    match s {
        "Planned" => Ok(ExitKind::Planned),
        "Unplanned" => Ok(ExitKind::Unplanned),
        other => Err(DbError::Decode(format!("unknown exit kind: {other}"))),
    }
}

fn parse_return_expectation(s: &str) -> Result<ReturnExpectation, DbError> {
    match s {
        "WillReturn" => Ok(ReturnExpectation::WillReturn),
        "WillNotReturn" => Ok(ReturnExpectation::WillNotReturn),
        other => Err(DbError::Decode(format!(
            "unknown return expectation: {other}"
        ))),
    }
}

pub(crate) fn parse_uuid(s: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

impl PermitRow {
    fn into_permit(self, id: Uuid) -> Result<PermitRequest, DbError> {
        let motive_analysis = match (
            self.analysis_category,
            self.analysis_summary,
            self.analysis_is_reasonable,
        ) {
            (Some(category), Some(summary), Some(is_reasonable)) => Some(MotiveAnalysis {
                category,
                summary,
                is_reasonable,
            }),
            _ => None,
        };
        let proof_artifact = match (self.proof_reference, self.proof_attached_at) {
            (Some(reference), Some(attached_at)) => Some(ProofArtifact {
                reference,
                content_type: self.proof_content_type,
                attached_at,
            }),
            _ => None,
        };

        Ok(PermitRequest {
            id,
            employee_id: parse_uuid(&self.employee_id, "employee")?,
            employee_name: self.employee_name,
            sector: self.sector,
            date: NaiveDate::parse_from_str(&self.exit_date, DATE_FORMAT)
                .map_err(|e| DbError::Decode(format!("invalid exit date: {e}")))?,
            time: hh_mm::parse(&self.exit_time)
                .map_err(|e| DbError::Decode(format!("invalid exit time: {e}")))?,
            exit_kind: parse_exit_kind(&self.exit_kind)?,
            return_expectation: parse_return_expectation(&self.return_expectation)?,
            motive: self.motive,
            will_present_proof: self.will_present_proof,
            status: self
                .status
                .parse::<PermitStatus>()
                .map_err(|e| DbError::Decode(e.to_string()))?,
            boss_approval_date: self.boss_approval_date,
            hr_approval_date: self.hr_approval_date,
            security_exit_date: self.security_exit_date,
            security_return_date: self.security_return_date,
            motive_analysis,
            proof_artifact,
            version: self.revision,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PermitRowWithId {
    fn try_into_permit(self) -> Result<PermitRequest, DbError> {
        let id = parse_uuid(&self.record_id, "permit")?;
        PermitRow {
            employee_id: self.employee_id,
            employee_name: self.employee_name,
            sector: self.sector,
            exit_date: self.exit_date,
            exit_time: self.exit_time,
            exit_kind: self.exit_kind,
            return_expectation: self.return_expectation,
            motive: self.motive,
            will_present_proof: self.will_present_proof,
            status: self.status,
            boss_approval_date: self.boss_approval_date,
            hr_approval_date: self.hr_approval_date,
            security_exit_date: self.security_exit_date,
            security_return_date: self.security_return_date,
            analysis_category: self.analysis_category,
            analysis_summary: self.analysis_summary,
            analysis_is_reasonable: self.analysis_is_reasonable,
            proof_reference: self.proof_reference,
            proof_content_type: self.proof_content_type,
            proof_attached_at: self.proof_attached_at,
            revision: self.revision,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_permit(id)
    }
}

/// SurrealDB implementation of the permit record store.
#[derive(Clone)]
pub struct SurrealPermitRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermitRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PermitRepository for SurrealPermitRepository<C> {
    async fn create(&self, input: CreatePermit) -> ExitPassResult<PermitRequest> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let details = input.details;

        let result = self
            .db
            .query(
                "CREATE type::record('permit', $id) SET \
                 employee_id = $employee_id, \
                 employee_name = $employee_name, \
                 sector = $sector, \
                 exit_date = $exit_date, exit_time = $exit_time, \
                 exit_kind = $exit_kind, \
                 return_expectation = $return_expectation, \
                 motive = $motive, \
                 will_present_proof = $will_present_proof, \
                 status = $status, \
                 revision = 1",
            )
            .bind(("id", id_str.clone()))
            .bind(("employee_id", input.employee_id.to_string()))
            .bind(("employee_name", input.employee_name))
            .bind(("sector", input.sector))
            .bind(("exit_date", details.date.format(DATE_FORMAT).to_string()))
            .bind(("exit_time", details.time.format(hh_mm::FORMAT).to_string()))
            .bind(("exit_kind", details.exit_kind.as_str().to_string()))
            .bind((
                "return_expectation",
                details.return_expectation.as_str().to_string(),
            ))
            .bind(("motive", details.motive))
            .bind(("will_present_proof", details.will_present_proof))
            .bind(("status", PermitStatus::PendingManager.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<PermitRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "permit".into(),
            id: id_str,
        })?;

        Ok(row.into_permit(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ExitPassResult<PermitRequest> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('permit', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermitRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "permit".into(),
            id: id_str,
        })?;

        Ok(row.into_permit(id)?)
    }

    async fn list(&self) -> ExitPassResult<Vec<PermitRequest>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permit \
                 ORDER BY created_at DESC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermitRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_permit())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn put(&self, record: &PermitRequest) -> ExitPassResult<PermitRequest> {
        let id_str = record.id.to_string();
        let analysis = record.motive_analysis.as_ref();
        let proof = record.proof_artifact.as_ref();

        let result = self
            .db
            .query(
                "UPDATE type::record('permit', $id) SET \
                 status = $status, \
                 boss_approval_date = $boss_approval_date, \
                 hr_approval_date = $hr_approval_date, \
                 security_exit_date = $security_exit_date, \
                 security_return_date = $security_return_date, \
                 analysis_category = $analysis_category, \
                 analysis_summary = $analysis_summary, \
                 analysis_is_reasonable = $analysis_is_reasonable, \
                 proof_reference = $proof_reference, \
                 proof_content_type = $proof_content_type, \
                 proof_attached_at = $proof_attached_at, \
                 revision = revision + 1, \
                 updated_at = time::now() \
                 WHERE revision = $expected_revision",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", record.status.as_str().to_string()))
            .bind(("boss_approval_date", record.boss_approval_date))
            .bind(("hr_approval_date", record.hr_approval_date))
            .bind(("security_exit_date", record.security_exit_date))
            .bind(("security_return_date", record.security_return_date))
            .bind(("analysis_category", analysis.map(|a| a.category.clone())))
            .bind(("analysis_summary", analysis.map(|a| a.summary.clone())))
            .bind((
                "analysis_is_reasonable",
                analysis.map(|a| a.is_reasonable),
            ))
            .bind(("proof_reference", proof.map(|p| p.reference.clone())))
            .bind((
                "proof_content_type",
                proof.and_then(|p| p.content_type.clone()),
            ))
            .bind(("proof_attached_at", proof.map(|p| p.attached_at)))
            .bind(("expected_revision", record.version))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<PermitRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_permit(record.id)?),
            None => {
                // Nothing matched: either the record is gone or someone
                // else wrote first.
                self.get_by_id(record.id).await?;
                Err(ExitPassError::Conflict {
                    entity: "permit".into(),
                    id: id_str,
                })
            }
        }
    }
}
