//! TaskGrid store — the in-memory transactional implementation of the
//! [`taskgrid_core::store::EntityStore`] contract.
//!
//! This crate provides:
//! - [`MemStore`] / [`MemTx`]: single-writer snapshot transactions with
//!   rollback-on-drop
//! - [`StoreError`]: store-layer failures, convertible into
//!   `TaskgridError`
//!
//! The production store is an external system; this implementation backs
//! tests and embedded deployments with the same transaction semantics the
//! engine assumes.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::{MemStore, MemTx};
