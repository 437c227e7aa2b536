//! TaskGrid engine — tenant integrity validation, cascading soft delete
//! and the command layer.
//!
//! This crate provides:
//! - [`commands::CommandService`]: the only write path into the entity
//!   graph (`apply_create` / `apply_update` / `apply_delete`)
//! - The Tenant Integrity Validator and its static reference-rule tables
//! - The Cascade Engine: breadth-first, transactional, convergent closure
//!   over the dependency graph of a soft-deleted entity
//! - [`config::EngineConfig`] and [`error::EngineError`]
//!
//! The engine is generic over [`taskgrid_core::store::EntityStore`]; it
//! performs no locking of its own and relies on store-level transaction
//! isolation.

mod cascade;
mod rules;
mod validator;

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{CommandService, EntityPatch, NewEntity};
pub use config::EngineConfig;
pub use error::EngineError;
