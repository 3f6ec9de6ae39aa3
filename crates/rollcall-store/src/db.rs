//! SQLite attendance store.
//!
//! Two tables, append-only in this scope:
//!   users(id PK autoincrement, name, registration_date)
//!   attendance(id PK autoincrement, user_id FK -> users.id, check_in)
//!
//! Timestamps are RFC 3339 text in UTC, which sorts chronologically, so
//! the reporting query can order on the raw column.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// One row of the users table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub registration_date: String,
}

/// One row of the attendance report, joined to the user's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInRecord {
    pub name: String,
    pub check_in: String,
}

/// Durable record of identities and check-in events.
///
/// The connection is opened once at startup and held for the process
/// lifetime; there is no reconnection logic — a connectivity failure
/// propagates to the operator as a hard stop.
pub struct AttendanceStore {
    conn: Connection,
}

impl AttendanceStore {
    /// Open (or create) the store at the given path and ensure the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path.as_ref())?;
        let store = Self::bootstrap(conn)?;
        tracing::info!(path = %path.as_ref().display(), "attendance store opened");
        Ok(store)
    }

    /// Open an in-memory store (tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                name              TEXT NOT NULL,
                registration_date TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS attendance (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id  INTEGER NOT NULL REFERENCES users(id),
                check_in TEXT NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }

    /// Insert a new identity, returning its generated key.
    pub fn insert_user(&self, name: &str, registered: DateTime<Utc>) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO users (name, registration_date) VALUES (?1, ?2);",
            params![name, rfc3339(registered)],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(id, name, "user registered");
        Ok(id)
    }

    /// Append one check-in event for an identity.
    pub fn insert_attendance(
        &self,
        user_id: i64,
        check_in: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO attendance (user_id, check_in) VALUES (?1, ?2);",
            params![user_id, rfc3339(check_in)],
        )?;
        tracing::info!(user_id, "attendance recorded");
        Ok(())
    }

    /// Full identity set, for cache hydration.
    pub fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, registration_date FROM users ORDER BY id ASC;")?;
        let rows = stmt.query_map([], |row| {
            Ok(UserRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                registration_date: row.get(2)?,
            })
        })?;
        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    /// The attendance report: `name | check_in`, latest first.
    pub fn list_attendance(&self) -> Result<Vec<CheckInRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT users.name, attendance.check_in
             FROM attendance
             JOIN users ON attendance.user_id = users.id
             ORDER BY attendance.check_in DESC, attendance.id DESC;",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CheckInRecord { name: row.get(0)?, check_in: row.get(1)? })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_insert_user_returns_generated_keys() {
        let store = AttendanceStore::open_in_memory().unwrap();
        let a = store.insert_user("Alice", ts(0)).unwrap();
        let b = store.insert_user("Bob", ts(1)).unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_list_users_full_set() {
        let store = AttendanceStore::open_in_memory().unwrap();
        store.insert_user("Alice", ts(0)).unwrap();
        store.insert_user("Bob", ts(1)).unwrap();
        let users = store.list_users().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "Alice");
        assert_eq!(users[1].name, "Bob");
    }

    #[test]
    fn test_attendance_report_latest_first() {
        let store = AttendanceStore::open_in_memory().unwrap();
        let alice = store.insert_user("Alice", ts(0)).unwrap();
        let bob = store.insert_user("Bob", ts(0)).unwrap();
        store.insert_attendance(alice, ts(10)).unwrap();
        store.insert_attendance(bob, ts(30)).unwrap();
        store.insert_attendance(alice, ts(20)).unwrap();

        let report = store.list_attendance().unwrap();
        let names: Vec<&str> = report.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alice", "Alice"]);
    }

    #[test]
    fn test_report_read_is_idempotent() {
        let store = AttendanceStore::open_in_memory().unwrap();
        let alice = store.insert_user("Alice", ts(0)).unwrap();
        store.insert_attendance(alice, ts(5)).unwrap();
        store.insert_attendance(alice, ts(7)).unwrap();

        let first = store.list_attendance().unwrap();
        let second = store.list_attendance().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_attendance_requires_existing_user() {
        let store = AttendanceStore::open_in_memory().unwrap();
        // Foreign keys are ON, so a dangling user_id must fail.
        assert!(store.insert_attendance(999, ts(0)).is_err());
    }

    #[test]
    fn test_repeated_check_ins_not_deduplicated() {
        let store = AttendanceStore::open_in_memory().unwrap();
        let alice = store.insert_user("Alice", ts(0)).unwrap();
        store.insert_attendance(alice, ts(1)).unwrap();
        store.insert_attendance(alice, ts(1)).unwrap();
        assert_eq!(store.list_attendance().unwrap().len(), 2);
    }
}
