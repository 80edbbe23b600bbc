//! Domain models for the exit permit system.
//!
//! These are the core types shared across all crates.

pub mod actor;
pub mod audit;
pub mod permit;
