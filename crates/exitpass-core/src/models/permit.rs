//! Exit permit domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sector recorded for employees that have none assigned.
pub const UNASSIGNED_SECTOR: &str = "N/A";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PermitStatus {
    PendingManager,
    RejectedByManager,
    PendingHR,
    RejectedByHR,
    Approved,
    Exited,
    Returned,
}

impl PermitStatus {
    pub const ALL: [PermitStatus; 7] = [
        PermitStatus::PendingManager,
        PermitStatus::RejectedByManager,
        PermitStatus::PendingHR,
        PermitStatus::RejectedByHR,
        PermitStatus::Approved,
        PermitStatus::Exited,
        PermitStatus::Returned,
    ];

    /// Canonical name, used for storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            PermitStatus::PendingManager => "PendingManager",
            PermitStatus::RejectedByManager => "RejectedByManager",
            PermitStatus::PendingHR => "PendingHR",
            PermitStatus::RejectedByHR => "RejectedByHR",
            PermitStatus::Approved => "Approved",
            PermitStatus::Exited => "Exited",
            PermitStatus::Returned => "Returned",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PermitStatus::PendingManager => "Pendiente Jefe",
            PermitStatus::RejectedByManager => "Rechazado por Jefe",
            PermitStatus::PendingHR => "Pendiente RRHH",
            PermitStatus::RejectedByHR => "Rechazado por RRHH",
            PermitStatus::Approved => "Aprobado",
            PermitStatus::Exited => "Salida Registrada",
            PermitStatus::Returned => "Regreso Registrado",
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            PermitStatus::RejectedByManager | PermitStatus::RejectedByHR
        )
    }
}

impl fmt::Display for PermitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown permit status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for PermitStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermitStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExitKind {
    Planned,
    Unplanned,
}

impl ExitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitKind::Planned => "Planned",
            ExitKind::Unplanned => "Unplanned",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExitKind::Planned => "Previsto",
            ExitKind::Unplanned => "Imprevisto",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReturnExpectation {
    WillReturn,
    WillNotReturn,
}

impl ReturnExpectation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnExpectation::WillReturn => "WillReturn",
            ReturnExpectation::WillNotReturn => "WillNotReturn",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReturnExpectation::WillReturn => "Regresa",
            ReturnExpectation::WillNotReturn => "No Regresa",
        }
    }
}

/// Operations an actor can invoke on a permit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PermitAction {
    Create,
    Approve,
    Reject,
    RecordExit,
    RecordReturn,
    AttachProof,
}

impl PermitAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermitAction::Create => "create",
            PermitAction::Approve => "approve",
            PermitAction::Reject => "reject",
            PermitAction::RecordExit => "record_exit",
            PermitAction::RecordReturn => "record_return",
            PermitAction::AttachProof => "attach_proof",
        }
    }
}

impl fmt::Display for PermitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermitAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(PermitAction::Create),
            "approve" => Ok(PermitAction::Approve),
            "reject" => Ok(PermitAction::Reject),
            "record_exit" => Ok(PermitAction::RecordExit),
            "record_return" => Ok(PermitAction::RecordReturn),
            "attach_proof" => Ok(PermitAction::AttachProof),
            other => Err(format!("unknown permit action: {other}")),
        }
    }
}

/// Advisory classification of the motive, produced by an external annotator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MotiveAnalysis {
    pub category: String,
    pub summary: String,
    pub is_reasonable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProofArtifact {
    /// Opaque handle to the stored blob (data URL, object key, ...).
    pub reference: String,
    pub content_type: Option<String>,
    pub attached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermitRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub sector: String,
    pub date: NaiveDate,
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,
    pub exit_kind: ExitKind,
    pub return_expectation: ReturnExpectation,
    pub motive: String,
    pub will_present_proof: bool,
    pub status: PermitStatus,
    pub boss_approval_date: Option<DateTime<Utc>>,
    pub hr_approval_date: Option<DateTime<Utc>>,
    pub security_exit_date: Option<DateTime<Utc>>,
    pub security_return_date: Option<DateTime<Utc>>,
    pub motive_analysis: Option<MotiveAnalysis>,
    pub proof_artifact: Option<ProofArtifact>,
    /// Optimistic-concurrency token, bumped by the store on every write.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PermitRequest {
    /// Proof was promised at creation but nothing is attached yet.
    pub fn awaiting_proof(&self) -> bool {
        self.will_present_proof && self.proof_artifact.is_none()
    }
}

/// What an employee fills in when requesting an exit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermitDetails {
    pub date: NaiveDate,
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,
    pub exit_kind: ExitKind,
    pub return_expectation: ReturnExpectation,
    pub motive: String,
    pub will_present_proof: bool,
}

/// Store input for a new permit. The store assigns `id` and `version`.
#[derive(Debug, Clone)]
pub struct CreatePermit {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub sector: String,
    pub details: PermitDetails,
}

/// `HH:MM` wire format for times of day; seconds are accepted on input.
pub mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
    }
}
