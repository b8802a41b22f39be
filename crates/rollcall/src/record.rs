//! Core attendance types for rollcall.
//!
//! This module defines the fundamental data structures for representing
//! students, attendance records, teachers, and activity log entries as
//! returned by the remote store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-day, per-subject attendance status of a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// The student was present for the subject on the day.
    Present,
    /// The student was absent (the default when no record exists).
    Absent,
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

impl AttendanceStatus {
    /// The logical negation of this status.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Present => Self::Absent,
            Self::Absent => Self::Present,
        }
    }

    /// Parse a status string from the remote store.
    ///
    /// Unknown values are logged and treated as `Absent` so that a malformed
    /// row never poisons the rest of a fetch.
    #[must_use]
    pub fn parse_lossy(raw: &str) -> Self {
        match raw {
            "present" => Self::Present,
            "absent" => Self::Absent,
            other => {
                warn!("Unknown attendance status: {}, defaulting to absent", other);
                Self::Absent
            }
        }
    }
}

/// A student as exposed by the joined `students` relation.
///
/// Students are owned by the remote store and immutable from this
/// application's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// National registry identifier (LRN); the unique student key.
    pub lrn: String,
    /// First name.
    pub first_name: String,
    /// Middle name, when registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    /// Last name.
    pub last_name: String,
}

impl Student {
    /// Full display name: name parts joined with single spaces, trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut parts = vec![self.first_name.as_str()];
        if let Some(middle) = &self.middle_name {
            parts.push(middle.as_str());
        }
        parts.push(self.last_name.as_str());
        parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

/// A single attendance row, keyed by (student, subject, date).
///
/// Rows from the legacy schema carry no subject; see
/// [`crate::remote::schema`] for how those are widened onto the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Student key.
    pub student_lrn: String,
    /// Subject code, absent on legacy rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Calendar day the record is logically on.
    pub date: NaiveDate,
    /// Recorded status.
    pub status: AttendanceStatus,
    /// Free-text evaluation, when the teacher left one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<String>,
    /// Joined student row, when the query embedded it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<Student>,
}

/// A teacher row from the `teachers` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Numeric teacher identifier.
    pub teacher_id: i64,
    /// Display name.
    pub teacher: String,
}

/// An activity log entry from the `logs` table.
///
/// Read-only here; the remote store appends them out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique log identifier.
    pub log_id: i64,
    /// What happened.
    pub activity: String,
    /// Numeric reference into the teachers table.
    pub teacher: i64,
    /// Student key the activity concerns.
    pub student: String,
    /// Stated reason.
    pub reason: String,
    /// Free-text comment.
    pub comment: String,
    /// When the activity was logged.
    pub datetime: DateTime<Utc>,
}

/// Sentinel used when a teacher reference cannot be resolved.
pub const UNKNOWN_TEACHER: &str = "Unknown Teacher";

/// Retain the first-encountered record per student key.
///
/// Insertion order follows the query result; callers must not depend on
/// which duplicate wins unless the query specifies an explicit order.
#[must_use]
pub fn dedup_by_student(records: &[AttendanceRecord]) -> Vec<AttendanceRecord> {
    let mut seen = std::collections::HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.student_lrn.clone()))
        .cloned()
        .collect()
}

/// Resolve a numeric teacher reference against the loaded teacher list.
///
/// Linear scan; classroom-scale lists only.
#[must_use]
pub fn resolve_teacher(teacher_id: i64, teachers: &[Teacher]) -> String {
    teachers
        .iter()
        .find(|t| t.teacher_id == teacher_id)
        .map_or_else(|| UNKNOWN_TEACHER.to_string(), |t| t.teacher.clone())
}

/// Resolve a student key to a display name via the loaded records.
///
/// The first record referencing the key projects the student's name;
/// the raw key is returned when no match carries a joined student.
#[must_use]
pub fn resolve_student_name(lrn: &str, records: &[AttendanceRecord]) -> String {
    records
        .iter()
        .filter(|r| r.student_lrn == lrn)
        .find_map(|r| r.student.as_ref())
        .map_or_else(|| lrn.to_string(), Student::full_name)
}
