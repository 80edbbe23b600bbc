//! Exit permit database layer: SurrealDB connection management, schema
//! migrations and repository implementations.
//!
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - Repositories ([`repository::SurrealPermitRepository`],
//!   [`repository::SurrealPermitEventRepository`])

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
