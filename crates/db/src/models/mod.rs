//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//!
//! The `campus` module maps the read-only schedule replica.

pub mod campus;
pub mod entry;
pub mod holding;
pub mod manual_entry;
pub mod room_entry;
pub mod statistics;
pub mod terminal;
