//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Plain CRUD takes `&PgPool`; methods meant to run inside a transition's
//! transaction take `&mut PgConnection` so callers control the
//! transaction boundary.

pub mod entry_repo;
pub mod holding_repo;
pub mod manual_entry_repo;
pub mod room_entry_repo;
pub mod schedule_repo;
pub mod statistics_repo;
pub mod terminal_repo;

pub use entry_repo::EntryRepo;
pub use holding_repo::HoldingRepo;
pub use manual_entry_repo::ManualEntryRepo;
pub use room_entry_repo::RoomEntryRepo;
pub use schedule_repo::ScheduleRepo;
pub use statistics_repo::StatisticsRepo;
pub use terminal_repo::TerminalRepo;
