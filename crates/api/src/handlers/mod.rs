pub mod clock;
pub mod holdings;
pub mod manual_entries;
pub mod room_entries;
pub mod statistics;
pub mod terminals;
