//! Exit permit core: domain models, errors, store and collaborator traits,
//! and the pure permit lifecycle engine and views.

pub mod annotator;
pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod views;
