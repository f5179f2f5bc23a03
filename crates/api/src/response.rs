//! Shared response envelope types for API handlers.
//!
//! Entity CRUD handlers return the row (or list) directly; derived and
//! computed payloads (e.g. the accredited roster) use a `{ "data": ... }`
//! envelope. Use [`DataResponse`] instead of ad-hoc
//! `serde_json::json!({ "data": ... })` to get compile-time type safety
//! and consistent serialization.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
