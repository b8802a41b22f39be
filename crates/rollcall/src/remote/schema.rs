//! Versioned remote row shapes.
//!
//! The backend has carried attendance under two table shapes over time:
//! `attendance` with per-subject rows, and the older `monitoring_log` with
//! one subject-less row per student. Rather than duplicating the client per
//! shape, each version is an explicit adapter onto the one canonical
//! [`AttendanceRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::{AttendanceRecord, AttendanceStatus, Student};

/// Which remote table shape the client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVersion {
    /// Current shape: `attendance`, one row per (student, subject, date).
    #[default]
    Attendance,
    /// Legacy shape: `monitoring_log`, one row per (student, date).
    MonitoringLog,
}

impl SchemaVersion {
    /// Remote table name.
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Attendance => "attendance",
            Self::MonitoringLog => "monitoring_log",
        }
    }

    /// Select clause, including the embedded `students` relation.
    #[must_use]
    pub fn select_clause(self) -> &'static str {
        match self {
            Self::Attendance => {
                "student_lrn,subject,date,status,evaluation,students(first_name,middle_name,last_name)"
            }
            Self::MonitoringLog => {
                "student_lrn,date,status,evaluation,students(first_name,middle_name,last_name)"
            }
        }
    }

    /// Declared upsert conflict target for this shape.
    #[must_use]
    pub fn conflict_target(self) -> &'static str {
        match self {
            Self::Attendance => "student_lrn,subject,date",
            Self::MonitoringLog => "student_lrn,date",
        }
    }

    /// Whether rows carry per-subject granularity.
    #[must_use]
    pub fn has_subject(self) -> bool {
        matches!(self, Self::Attendance)
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table())
    }
}

/// The joined `students` relation as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStudent {
    /// First name.
    pub first_name: String,
    /// Middle name, when registered.
    pub middle_name: Option<String>,
    /// Last name.
    pub last_name: String,
}

/// An attendance row as returned by either table shape.
///
/// `subject` is only present under [`SchemaVersion::Attendance`]; the date
/// column is timestamp-typed on the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAttendanceRow {
    /// Student key.
    pub student_lrn: String,
    /// Subject code (current shape only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Row timestamp; logically a calendar day.
    pub date: DateTime<Utc>,
    /// Status string, `present` or `absent`.
    pub status: String,
    /// Free-text evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<String>,
    /// Embedded student row, when the select joined it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub students: Option<RawStudent>,
}

impl RawAttendanceRow {
    /// Decode a raw row into the canonical record type.
    ///
    /// # Errors
    ///
    /// Returns an error if the row is missing its student key.
    pub fn decode(self, version: SchemaVersion) -> Result<AttendanceRecord> {
        if self.student_lrn.is_empty() {
            return Err(Error::malformed_row("missing student_lrn"));
        }

        let student = self.students.map(|s| Student {
            lrn: self.student_lrn.clone(),
            first_name: s.first_name,
            middle_name: s.middle_name,
            last_name: s.last_name,
        });

        Ok(AttendanceRecord {
            student_lrn: self.student_lrn,
            subject: if version.has_subject() { self.subject } else { None },
            date: self.date.date_naive(),
            status: AttendanceStatus::parse_lossy(&self.status),
            evaluation: self.evaluation,
            student,
        })
    }
}

/// Encode a canonical record as an upsert payload for the given shape.
#[must_use]
pub fn encode_upsert(record: &AttendanceRecord, version: SchemaVersion) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "student_lrn": record.student_lrn,
        "date": record.date.to_string(),
        "status": record.status.to_string(),
    });
    if let Some(evaluation) = &record.evaluation {
        payload["evaluation"] = serde_json::Value::String(evaluation.clone());
    }
    if version.has_subject() {
        if let Some(subject) = &record.subject {
            payload["subject"] = serde_json::Value::String(subject.clone());
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn raw_row(subject: Option<&str>) -> RawAttendanceRow {
        RawAttendanceRow {
            student_lrn: "A1".to_string(),
            subject: subject.map(ToString::to_string),
            date: Utc.with_ymd_and_hms(2024, 5, 1, 7, 30, 0).unwrap(),
            status: "present".to_string(),
            evaluation: None,
            students: Some(RawStudent {
                first_name: "Juan".to_string(),
                middle_name: None,
                last_name: "Dela Cruz".to_string(),
            }),
        }
    }

    #[test]
    fn test_table_names() {
        assert_eq!(SchemaVersion::Attendance.table(), "attendance");
        assert_eq!(SchemaVersion::MonitoringLog.table(), "monitoring_log");
    }

    #[test]
    fn test_conflict_targets() {
        assert_eq!(
            SchemaVersion::Attendance.conflict_target(),
            "student_lrn,subject,date"
        );
        assert_eq!(
            SchemaVersion::MonitoringLog.conflict_target(),
            "student_lrn,date"
        );
    }

    #[test]
    fn test_select_clause_embeds_students() {
        for version in [SchemaVersion::Attendance, SchemaVersion::MonitoringLog] {
            assert!(version
                .select_clause()
                .contains("students(first_name,middle_name,last_name)"));
        }
        assert!(SchemaVersion::Attendance.select_clause().contains("subject"));
        assert!(!SchemaVersion::MonitoringLog.select_clause().contains("subject"));
    }

    #[test]
    fn test_decode_attendance_row() {
        let record = raw_row(Some("PE")).decode(SchemaVersion::Attendance).unwrap();
        assert_eq!(record.student_lrn, "A1");
        assert_eq!(record.subject.as_deref(), Some("PE"));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.student.as_ref().unwrap().lrn, "A1");
    }

    #[test]
    fn test_decode_monitoring_log_drops_subject() {
        let record = raw_row(Some("PE"))
            .decode(SchemaVersion::MonitoringLog)
            .unwrap();
        assert!(record.subject.is_none());
    }

    #[test]
    fn test_decode_timestamp_collapses_to_day() {
        let mut row = raw_row(None);
        row.date = Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 59).unwrap();
        let record = row.decode(SchemaVersion::MonitoringLog).unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn test_decode_rejects_missing_key() {
        let mut row = raw_row(None);
        row.student_lrn = String::new();
        assert!(row.decode(SchemaVersion::Attendance).is_err());
    }

    #[test]
    fn test_decode_unknown_status_defaults_absent() {
        let mut row = raw_row(Some("PE"));
        row.status = "excused".to_string();
        let record = row.decode(SchemaVersion::Attendance).unwrap();
        assert_eq!(record.status, AttendanceStatus::Absent);
    }

    #[test]
    fn test_encode_upsert_attendance() {
        let record = AttendanceRecord {
            student_lrn: "A1".to_string(),
            subject: Some("PE".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            status: AttendanceStatus::Present,
            evaluation: Some("good".to_string()),
            student: None,
        };
        let payload = encode_upsert(&record, SchemaVersion::Attendance);
        assert_eq!(payload["student_lrn"], "A1");
        assert_eq!(payload["subject"], "PE");
        assert_eq!(payload["status"], "present");
        assert_eq!(payload["date"], "2024-05-01");
        assert_eq!(payload["evaluation"], "good");
    }

    #[test]
    fn test_encode_upsert_monitoring_log_omits_subject() {
        let record = AttendanceRecord {
            student_lrn: "A1".to_string(),
            subject: Some("PE".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            status: AttendanceStatus::Absent,
            evaluation: None,
            student: None,
        };
        let payload = encode_upsert(&record, SchemaVersion::MonitoringLog);
        assert!(payload.get("subject").is_none());
        assert!(payload.get("evaluation").is_none());
    }

    #[test]
    fn test_schema_version_serde() {
        let json = serde_json::to_string(&SchemaVersion::MonitoringLog).unwrap();
        assert_eq!(json, "\"monitoring_log\"");
        let back: SchemaVersion = serde_json::from_str("\"attendance\"").unwrap();
        assert_eq!(back, SchemaVersion::Attendance);
    }

    #[test]
    fn test_schema_version_display() {
        assert_eq!(SchemaVersion::Attendance.to_string(), "attendance");
    }
}
