//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs, calendar dates and
//! enums are stored as strings; enums carry ASSERT constraints.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Exit permits
-- =======================================================================
DEFINE TABLE permit SCHEMAFULL;
DEFINE FIELD employee_id ON TABLE permit TYPE string;
DEFINE FIELD employee_name ON TABLE permit TYPE string;
DEFINE FIELD sector ON TABLE permit TYPE string;
DEFINE FIELD exit_date ON TABLE permit TYPE string;
DEFINE FIELD exit_time ON TABLE permit TYPE string;
DEFINE FIELD exit_kind ON TABLE permit TYPE string \
    ASSERT $value IN ['Planned', 'Unplanned'];
DEFINE FIELD return_expectation ON TABLE permit TYPE string \
    ASSERT $value IN ['WillReturn', 'WillNotReturn'];
DEFINE FIELD motive ON TABLE permit TYPE string;
DEFINE FIELD will_present_proof ON TABLE permit TYPE bool;
DEFINE FIELD status ON TABLE permit TYPE string \
    ASSERT $value IN ['PendingManager', 'RejectedByManager', \
    'PendingHR', 'RejectedByHR', 'Approved', 'Exited', 'Returned'];
DEFINE FIELD boss_approval_date ON TABLE permit TYPE option<datetime>;
DEFINE FIELD hr_approval_date ON TABLE permit TYPE option<datetime>;
DEFINE FIELD security_exit_date ON TABLE permit TYPE option<datetime>;
DEFINE FIELD security_return_date ON TABLE permit \
    TYPE option<datetime>;
DEFINE FIELD analysis_category ON TABLE permit TYPE option<string>;
DEFINE FIELD analysis_summary ON TABLE permit TYPE option<string>;
DEFINE FIELD analysis_is_reasonable ON TABLE permit TYPE option<bool>;
DEFINE FIELD proof_reference ON TABLE permit TYPE option<string>;
DEFINE FIELD proof_content_type ON TABLE permit TYPE option<string>;
DEFINE FIELD proof_attached_at ON TABLE permit TYPE option<datetime>;
DEFINE FIELD revision ON TABLE permit TYPE int DEFAULT 1;
DEFINE FIELD created_at ON TABLE permit TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE permit TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_permit_employee ON TABLE permit COLUMNS employee_id;
DEFINE INDEX idx_permit_sector_status ON TABLE permit \
    COLUMNS sector, status;
DEFINE INDEX idx_permit_exit_date ON TABLE permit COLUMNS exit_date;

-- =======================================================================
-- Permit audit trail (append-only)
-- =======================================================================
DEFINE TABLE permit_event SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD permit_id ON TABLE permit_event TYPE string;
DEFINE FIELD actor_id ON TABLE permit_event TYPE string;
DEFINE FIELD actor_name ON TABLE permit_event TYPE string;
DEFINE FIELD actor_role ON TABLE permit_event TYPE string \
    ASSERT $value IN ['Employee', 'Manager', 'HumanResources', \
    'Security', 'Admin'];
DEFINE FIELD action ON TABLE permit_event TYPE string \
    ASSERT $value IN ['create', 'approve', 'reject', 'record_exit', \
    'record_return', 'attach_proof'];
DEFINE FIELD from_status ON TABLE permit_event TYPE option<string>;
DEFINE FIELD to_status ON TABLE permit_event TYPE string;
DEFINE FIELD occurred_at ON TABLE permit_event TYPE datetime;
DEFINE INDEX idx_permit_event_permit_time ON TABLE permit_event \
    COLUMNS permit_id, occurred_at;
";

/// Apply all pending migrations in order.
///
/// Safe to call repeatedly; applied versions are tracked in `_migration`.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
