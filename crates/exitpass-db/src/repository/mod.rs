//! SurrealDB repository implementations.

mod event;
mod permit;

pub use event::SurrealPermitEventRepository;
pub use permit::SurrealPermitRepository;
