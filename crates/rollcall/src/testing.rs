//! In-memory store double shared by board and poll tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::record::{AttendanceRecord, LogEntry, Teacher};
use crate::remote::{RemoteStore, Session};

/// A failure-injectable in-memory [`RemoteStore`].
#[derive(Debug, Default)]
pub struct MockStore {
    /// Rows returned by fetches, filtered by day.
    pub records: Mutex<Vec<AttendanceRecord>>,
    /// Teacher list.
    pub teachers: Vec<Teacher>,
    /// Log entries, stored newest first.
    pub logs: Vec<LogEntry>,
    /// Session returned by introspection; `None` blocks writes.
    pub session: Option<Session>,
    /// When set, fetches fail with a remote API error.
    pub fail_fetch: AtomicBool,
    /// When set, upserts and deletes fail with a remote API error.
    pub fail_writes: AtomicBool,
    /// Upserts the store accepted.
    pub upserts: Mutex<Vec<AttendanceRecord>>,
    /// Deletes the store accepted, as (lrn, subject, date).
    pub deletes: Mutex<Vec<(String, Option<String>, NaiveDate)>>,
}

impl MockStore {
    /// A store with the given rows and an authenticated session.
    pub fn with_records(records: Vec<AttendanceRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            session: Some(Session {
                id: "test-user".to_string(),
                email: None,
            }),
            ..Self::default()
        }
    }

    /// Flip fetch failure injection.
    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Flip write failure injection.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    async fn fetch_attendance(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Error::remote_api(503, "injected fetch failure"));
        }
        let records = self.records.lock().map_err(|_| Error::internal("poisoned"))?;
        Ok(records.iter().filter(|r| r.date == date).cloned().collect())
    }

    async fn fetch_logs(&self, limit: usize) -> Result<Vec<LogEntry>> {
        Ok(self.logs.iter().take(limit).cloned().collect())
    }

    async fn fetch_teachers(&self) -> Result<Vec<Teacher>> {
        Ok(self.teachers.clone())
    }

    async fn upsert_attendance(&self, record: &AttendanceRecord) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::remote_api(503, "injected write failure"));
        }
        self.upserts
            .lock()
            .map_err(|_| Error::internal("poisoned"))?
            .push(record.clone());
        Ok(())
    }

    async fn delete_attendance(
        &self,
        lrn: &str,
        subject: Option<&str>,
        date: NaiveDate,
    ) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::remote_api(503, "injected write failure"));
        }
        self.deletes
            .lock()
            .map_err(|_| Error::internal("poisoned"))?
            .push((lrn.to_string(), subject.map(ToString::to_string), date));
        Ok(())
    }

    async fn session(&self) -> Result<Option<Session>> {
        Ok(self.session.clone())
    }
}
