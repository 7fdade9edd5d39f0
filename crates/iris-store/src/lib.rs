//! iris-store — SQLite persistence for enrollments and attendance events.
//!
//! Descriptor sets are stored as one packed BLOB per enrollment together
//! with their bit width, so a row can always be decoded without guessing.

use chrono::{DateTime, SecondsFormat, Utc};
use iris_core::{DescriptorSet, EnrollmentRecord, EnrollmentStore};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS enrollments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    identity    TEXT    NOT NULL,
    name        TEXT    NOT NULL,
    attribute   TEXT    NOT NULL,
    bit_width   INTEGER NOT NULL,
    descriptors BLOB    NOT NULL,
    created_at  TEXT    NOT NULL
);
CREATE TABLE IF NOT EXISTS attendance (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    enrollment_id INTEGER NOT NULL REFERENCES enrollments(id),
    timestamp     TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_attendance_timestamp ON attendance(timestamp);
";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cannot create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("enrollment {0} not found")]
    UnknownEnrollment(i64),
}

/// Enrollment row without its descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentSummary {
    pub id: i64,
    pub identity: String,
    pub name: String,
    pub attribute: String,
    pub descriptor_count: usize,
    pub bit_width: usize,
    pub created_at: String,
}

/// One attendance event joined with the enrollment it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceEntry {
    pub id: i64,
    pub enrollment_id: i64,
    pub identity: String,
    pub name: String,
    pub attribute: String,
    pub timestamp: String,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// `$XDG_DATA_HOME/iris/attendance.db`, falling back to
    /// `$HOME/.local/share` and then `/tmp` for the data directory.
    pub fn default_path() -> PathBuf {
        database_path(std::env::var("XDG_DATA_HOME").ok(), std::env::var("HOME").ok())
    }

    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let store = Self::init(Connection::open(path)?)?;
        tracing::info!(path = %path.display(), "database opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn enrollment_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM enrollments", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Every enrollment without descriptors, in insertion order.
    pub fn list_enrollments(&self) -> Result<Vec<EnrollmentSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, identity, name, attribute, bit_width, length(descriptors), created_at
             FROM enrollments ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            let bit_width = row.get::<_, i64>(4)? as usize;
            let blob_len = row.get::<_, i64>(5)? as usize;
            let stride = (bit_width / 8).max(1);
            Ok(EnrollmentSummary {
                id: row.get(0)?,
                identity: row.get(1)?,
                name: row.get(2)?,
                attribute: row.get(3)?,
                descriptor_count: blob_len / stride,
                bit_width,
                created_at: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Attendance events, newest first. `limit` of `None` returns all.
    pub fn attendance_log(&self, limit: Option<usize>) -> Result<Vec<AttendanceEntry>, StoreError> {
        let limit = limit.map_or(-1, |l| l as i64);
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.enrollment_id, e.identity, e.name, e.attribute, a.timestamp
             FROM attendance a JOIN enrollments e ON e.id = a.enrollment_id
             ORDER BY a.timestamp DESC, a.id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(AttendanceEntry {
                id: row.get(0)?,
                enrollment_id: row.get(1)?,
                identity: row.get(2)?,
                name: row.get(3)?,
                attribute: row.get(4)?,
                timestamp: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn enrollment_exists(&self, id: i64) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM enrollments WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }
}

impl EnrollmentStore for Store {
    type Error = StoreError;

    /// Rows whose descriptor blob cannot be decoded are left out and logged.
    fn fetch_all_enrollments(&self) -> Result<Vec<EnrollmentRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, identity, name, attribute, bit_width, descriptors, created_at
             FROM enrollments ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Vec<u8>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, identity, name, attribute, bit_width, blob, created_at) = row?;
            match DescriptorSet::from_blob(bit_width as usize, &blob) {
                Ok(descriptors) => records.push(EnrollmentRecord {
                    id,
                    identity,
                    name,
                    attribute,
                    descriptors,
                    created_at,
                }),
                Err(e) => {
                    tracing::warn!(record_id = id, %identity, error = %e, "undecodable enrollment skipped");
                }
            }
        }
        Ok(records)
    }

    fn append_enrollment(
        &self,
        identity: &str,
        name: &str,
        attribute: &str,
        descriptors: &DescriptorSet,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO enrollments (identity, name, attribute, bit_width, descriptors, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                identity,
                name,
                attribute,
                descriptors.bit_width() as i64,
                descriptors.to_blob(),
                rfc3339(Utc::now()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(record_id = id, identity, descriptors = descriptors.len(), "enrollment stored");
        Ok(id)
    }

    fn append_attendance_event(&self, record_id: i64, timestamp: DateTime<Utc>) -> Result<i64, StoreError> {
        if !self.enrollment_exists(record_id)? {
            return Err(StoreError::UnknownEnrollment(record_id));
        }
        self.conn.execute(
            "INSERT INTO attendance (enrollment_id, timestamp) VALUES (?1, ?2)",
            params![record_id, rfc3339(timestamp)],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

/// Fixed-width UTC timestamp so that text ordering is chronological.
fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn database_path(xdg_data_home: Option<String>, home: Option<String>) -> PathBuf {
    xdg_data_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            PathBuf::from(home.unwrap_or_else(|| "/tmp".to_string())).join(".local/share")
        })
        .join("iris")
        .join("attendance.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use iris_core::Descriptor;

    fn set(count: usize, fill: u8) -> DescriptorSet {
        let descriptors = (0..count).map(|i| Descriptor(vec![fill.wrapping_add(i as u8); 32])).collect();
        DescriptorSet::new(256, descriptors).unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_database_path_resolution() {
        assert_eq!(
            database_path(Some("/data".into()), Some("/home/ada".into())),
            PathBuf::from("/data/iris/attendance.db")
        );
        assert_eq!(
            database_path(None, Some("/home/ada".into())),
            PathBuf::from("/home/ada/.local/share/iris/attendance.db")
        );
        assert_eq!(
            database_path(Some(String::new()), None),
            PathBuf::from("/tmp/.local/share/iris/attendance.db")
        );
        assert!(Store::default_path().ends_with("iris/attendance.db"));
    }

    #[test]
    fn test_enrollments_round_trip_in_order() {
        let store = Store::open_in_memory().unwrap();
        let a = store.append_enrollment("S-1", "Ada", "Physics", &set(3, 1)).unwrap();
        let b = store.append_enrollment("S-2", "Brin", "Biology", &set(5, 9)).unwrap();
        assert!(a < b);

        let records = store.fetch_all_enrollments().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, a);
        assert_eq!(records[0].identity, "S-1");
        assert_eq!(records[0].descriptors, set(3, 1));
        assert_eq!(records[1].name, "Brin");
        assert_eq!(records[1].descriptors.len(), 5);
        assert!(DateTime::parse_from_rfc3339(&records[0].created_at).is_ok());
    }

    #[test]
    fn test_same_identity_may_enroll_twice() {
        let store = Store::open_in_memory().unwrap();
        store.append_enrollment("S-1", "Ada", "Physics", &set(3, 1)).unwrap();
        store.append_enrollment("S-1", "Ada", "Physics", &set(4, 2)).unwrap();
        assert_eq!(store.enrollment_count().unwrap(), 2);
    }

    #[test]
    fn test_list_enrollments_counts_descriptors() {
        let store = Store::open_in_memory().unwrap();
        store.append_enrollment("S-1", "Ada", "Physics", &set(7, 1)).unwrap();
        let list = store.list_enrollments().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].descriptor_count, 7);
        assert_eq!(list[0].bit_width, 256);
    }

    #[test]
    fn test_empty_set_is_stored() {
        let store = Store::open_in_memory().unwrap();
        store.append_enrollment("S-1", "Ada", "Physics", &DescriptorSet::empty(256)).unwrap();
        let records = store.fetch_all_enrollments().unwrap();
        assert!(records[0].descriptors.is_empty());
        assert_eq!(records[0].descriptors.bit_width(), 256);
    }

    #[test]
    fn test_corrupt_blob_is_left_out() {
        let store = Store::open_in_memory().unwrap();
        store.append_enrollment("S-1", "Ada", "Physics", &set(2, 1)).unwrap();
        store
            .conn
            .execute(
                "INSERT INTO enrollments (identity, name, attribute, bit_width, descriptors, created_at)
                 VALUES ('S-9', 'Bad', 'X', 256, x'0102', '2024-01-01T00:00:00.000Z')",
                [],
            )
            .unwrap();

        let records = store.fetch_all_enrollments().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity, "S-1");
    }

    #[test]
    fn test_attendance_log_is_newest_first() {
        let store = Store::open_in_memory().unwrap();
        let ada = store.append_enrollment("S-1", "Ada", "Physics", &set(2, 1)).unwrap();
        let brin = store.append_enrollment("S-2", "Brin", "Biology", &set(2, 5)).unwrap();

        store.append_attendance_event(ada, at(8)).unwrap();
        store.append_attendance_event(brin, at(10)).unwrap();
        store.append_attendance_event(ada, at(9)).unwrap();

        let log = store.attendance_log(None).unwrap();
        let names: Vec<_> = log.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Brin", "Ada", "Ada"]);
        assert_eq!(log[0].timestamp, "2024-03-01T10:00:00.000Z");
        assert_eq!(log[0].attribute, "Biology");

        assert_eq!(store.attendance_log(Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_attendance_for_unknown_enrollment_fails() {
        let store = Store::open_in_memory().unwrap();
        let err = store.append_attendance_event(42, at(8)).unwrap_err();
        assert!(matches!(err, StoreError::UnknownEnrollment(42)));
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = std::env::temp_dir().join(format!("iris-store-test-{}", std::process::id()));
        let path = dir.join("nested").join("attendance.db");
        {
            let store = Store::open(&path).unwrap();
            store.append_enrollment("S-1", "Ada", "Physics", &set(1, 1)).unwrap();
        }
        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.enrollment_count().unwrap(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
