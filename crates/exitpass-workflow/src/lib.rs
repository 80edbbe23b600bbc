//! ExitPass Workflow: the permit service, with lifecycle operations over a
//! record store, background motive annotation, audit trail and the
//! transport-neutral command model.

pub mod annotation;
pub mod command;
pub mod config;
mod retry;
pub mod service;

pub use annotation::DisabledAnnotator;
pub use command::{ErrorBody, PermitCommand};
pub use config::WorkflowConfig;
pub use service::PermitService;
