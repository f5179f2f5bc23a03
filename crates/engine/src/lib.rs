//! Reconciliation engine: state transition services, terminal behaviour
//! dispatch, cleanup sweeps and the notification worker.
//!
//! Each transition service function owns exactly one database transaction:
//! it locks the record, validates the state change through the guards in
//! `attend-core`, applies the mutation (and any coupled booking write-back)
//! and commits. Batch operations over a holding's entries run one
//! transaction per entry so a single bad record never wedges the batch.

pub mod behaviour;
pub mod error;
pub mod holding;
pub mod manual_entry;
pub mod notify;
pub mod room_entry;
pub mod sweep;

pub use error::EngineError;
