//! Domain core for the campus attendance backend.
//!
//! Pure types and logic shared by the database, reconciliation engine and
//! API crates:
//!
//! - [`types`] — common id and timestamp aliases.
//! - [`error`] — the domain error taxonomy.
//! - [`state`] — state machine enums and the central transition guard.
//! - [`config`] — reconciliation timing knobs.
//! - [`cleanup`] — decision logic for the periodic cleanup sweeps.
//! - [`reconcile`] — pending-entry assignment rules for holding start.
//! - [`mask`] — matriculation number masking for device responses.
//!
//! This crate has no database or HTTP dependencies; everything in it is
//! unit-testable without infrastructure.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod mask;
pub mod reconcile;
pub mod state;
pub mod types;
