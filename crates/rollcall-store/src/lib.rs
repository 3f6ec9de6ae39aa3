//! rollcall-store — Durable attendance records and the identity cache.
//!
//! One SQLite connection is held for the process lifetime; each logical
//! write commits individually and immediately. The identity cache is a
//! read-optimized shadow of the store's user set.

pub mod cache;
pub mod db;

pub use cache::{IdentityCache, UNKNOWN_NAME};
pub use db::{AttendanceStore, CheckInRecord, StoreError, UserRecord};
