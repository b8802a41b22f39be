//! The attendance board: an optimistic local view of one day's attendance.
//!
//! The board is derived state, never authoritative. It is rebuilt wholesale
//! from remote rows on every successful refresh and patched in place on user
//! toggles. Local edits are tracked as *pending* until their remote write
//! confirms, so a refresh that lands mid-write re-applies them instead of
//! silently reverting what the user just did.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::TogglePolicy;
use crate::record::{
    dedup_by_student, resolve_student_name, resolve_teacher, AttendanceRecord, AttendanceStatus,
    Teacher,
};
use crate::remote::RemoteStore;

/// What happened to a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The edit was applied locally and confirmed by the remote store.
    Applied(AttendanceStatus),
    /// The remote write failed (or no session existed); the local edit
    /// was rolled back to its pre-toggle value.
    RolledBack,
    /// The policy made the toggle a no-op.
    NoOp,
}

/// A rendered view of the board at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    /// The day the board shows.
    pub date: NaiveDate,
    /// Monotonic refresh counter.
    pub generation: u64,
    /// One row per roster student, ordered by student key.
    pub rows: Vec<SnapshotRow>,
}

/// One student's statuses across the fixed subject list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotRow {
    /// Student key.
    pub lrn: String,
    /// Resolved display name (raw key when unresolvable).
    pub name: String,
    /// Status per subject, in configured subject order.
    pub statuses: Vec<(String, AttendanceStatus)>,
}

/// Per-student, per-subject attendance state for one calendar day.
#[derive(Debug)]
pub struct AttendanceBoard {
    subjects: Vec<String>,
    policy: TogglePolicy,
    date: NaiveDate,
    /// Full last snapshot, as fetched.
    records: Vec<AttendanceRecord>,
    /// First-encountered record per student key; defines the roster.
    roster: Vec<AttendanceRecord>,
    /// student key -> subject -> status. Derived, non-authoritative.
    display: HashMap<String, HashMap<String, AttendanceStatus>>,
    /// Local edits not yet confirmed by the remote store.
    pending: HashMap<(String, String), AttendanceStatus>,
    generation: u64,
}

impl AttendanceBoard {
    /// Create an empty board for a day.
    #[must_use]
    pub fn new(subjects: Vec<String>, policy: TogglePolicy, date: NaiveDate) -> Self {
        Self {
            subjects,
            policy,
            date,
            records: Vec::new(),
            roster: Vec::new(),
            display: HashMap::new(),
            pending: HashMap::new(),
            generation: 0,
        }
    }

    /// The day this board shows.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Number of successful refreshes so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Move the board to a different day, discarding all derived state.
    pub fn set_date(&mut self, date: NaiveDate) {
        if date != self.date {
            self.date = date;
            self.records.clear();
            self.roster.clear();
            self.display.clear();
            self.pending.clear();
            self.generation = 0;
        }
    }

    /// Current status of a cell, if the student is on the board.
    #[must_use]
    pub fn status(&self, lrn: &str, subject: &str) -> Option<AttendanceStatus> {
        self.display.get(lrn).and_then(|m| m.get(subject)).copied()
    }

    /// Re-fetch the day's rows and rebuild the display map.
    ///
    /// Returns `true` if the snapshot was applied. A failed fetch leaves the
    /// previous map untouched; it is logged, never surfaced as a hard error.
    pub async fn refresh(&mut self, store: &dyn RemoteStore) -> bool {
        let records = match store.fetch_attendance(self.date).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Attendance fetch failed for {}: {}", self.date, e);
                return false;
            }
        };

        self.roster = dedup_by_student(&records);
        self.records = records;

        // Every (roster student, subject) pair gets an entry, absent by
        // default, then actual statuses overlay.
        let mut display: HashMap<String, HashMap<String, AttendanceStatus>> = HashMap::new();
        for entry in &self.roster {
            let row = display.entry(entry.student_lrn.clone()).or_default();
            for subject in &self.subjects {
                row.insert(subject.clone(), AttendanceStatus::Absent);
            }
        }
        for record in &self.records {
            if let Some(subject) = &record.subject {
                if let Some(row) = display.get_mut(&record.student_lrn) {
                    if row.contains_key(subject) {
                        row.insert(subject.clone(), record.status);
                    }
                }
            }
        }
        // Subject-less legacy rows widen onto every subject; first row per
        // student wins, which is what the roster already encodes.
        for entry in &self.roster {
            if entry.subject.is_none() {
                if let Some(row) = display.get_mut(&entry.student_lrn) {
                    for subject in &self.subjects {
                        row.insert(subject.clone(), entry.status);
                    }
                }
            }
        }

        // Re-apply pending edits the snapshot has not caught up with; an
        // edit the snapshot already shows is confirmed-visible and dropped.
        self.pending.retain(|(lrn, subject), status| {
            match display.get_mut(lrn) {
                Some(row) if row.get(subject) == Some(status) => {
                    debug!("Pending edit for {lrn}/{subject} visible in snapshot");
                    false
                }
                Some(row) => {
                    row.insert(subject.clone(), *status);
                    true
                }
                // The student left the snapshot; the edit has nothing to
                // attach to anymore.
                None => false,
            }
        });

        self.display = display;
        self.generation += 1;
        true
    }

    /// Toggle a cell and push the change to the remote store.
    ///
    /// The local map is patched first (what the user sees has zero latency),
    /// then the write goes out; on failure the patch is rolled back and the
    /// failure is logged. No retry is attempted.
    pub async fn toggle(
        &mut self,
        store: &dyn RemoteStore,
        lrn: &str,
        subject: &str,
    ) -> ToggleOutcome {
        let current = self.status(lrn, subject);

        let new_status = match self.policy {
            TogglePolicy::LockAbsent => {
                if current == Some(AttendanceStatus::Absent) {
                    return ToggleOutcome::NoOp;
                }
                AttendanceStatus::Absent
            }
            // An unset cell counts as present, so the first toggle marks
            // the student absent.
            TogglePolicy::Bidirectional => {
                current.unwrap_or(AttendanceStatus::Present).toggled()
            }
        };

        let key = (lrn.to_string(), subject.to_string());
        let previous = self
            .display
            .entry(lrn.to_string())
            .or_default()
            .insert(subject.to_string(), new_status);
        self.pending.insert(key.clone(), new_status);

        match self.write_toggle(store, lrn, subject, new_status).await {
            Ok(()) => {
                self.pending.remove(&key);
                ToggleOutcome::Applied(new_status)
            }
            Err(e) => {
                warn!("Toggle write failed for {lrn}/{subject}: {}", e);
                self.rollback(lrn, subject, previous);
                self.pending.remove(&key);
                ToggleOutcome::RolledBack
            }
        }
    }

    async fn write_toggle(
        &self,
        store: &dyn RemoteStore,
        lrn: &str,
        subject: &str,
        status: AttendanceStatus,
    ) -> crate::error::Result<()> {
        // Writes are gated on an authenticated session.
        if store.session().await?.is_none() {
            return Err(crate::error::Error::SessionMissing);
        }

        match (self.policy, status) {
            // The one-way lock always records an explicit absent row.
            (TogglePolicy::LockAbsent, _) | (TogglePolicy::Bidirectional, AttendanceStatus::Present) => {
                store
                    .upsert_attendance(&AttendanceRecord {
                        student_lrn: lrn.to_string(),
                        subject: Some(subject.to_string()),
                        date: self.date,
                        status,
                        evaluation: None,
                        student: None,
                    })
                    .await
            }
            (TogglePolicy::Bidirectional, AttendanceStatus::Absent) => {
                store.delete_attendance(lrn, Some(subject), self.date).await
            }
        }
    }

    fn rollback(&mut self, lrn: &str, subject: &str, previous: Option<AttendanceStatus>) {
        match previous {
            Some(status) => {
                if let Some(row) = self.display.get_mut(lrn) {
                    row.insert(subject.to_string(), status);
                }
            }
            None => {
                if let Some(row) = self.display.get_mut(lrn) {
                    row.remove(subject);
                    if row.is_empty() {
                        self.display.remove(lrn);
                    }
                }
            }
        }
    }

    /// Resolve a student key to a display name via the last snapshot.
    #[must_use]
    pub fn student_name(&self, lrn: &str) -> String {
        resolve_student_name(lrn, &self.records)
    }

    /// Resolve a teacher reference against a loaded teacher list.
    #[must_use]
    pub fn teacher_name(teacher_id: i64, teachers: &[Teacher]) -> String {
        resolve_teacher(teacher_id, teachers)
    }

    /// Render the board into an ordered snapshot.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        let ordered: BTreeMap<&String, &HashMap<String, AttendanceStatus>> =
            self.display.iter().collect();

        let rows = ordered
            .into_iter()
            .map(|(lrn, row)| SnapshotRow {
                lrn: lrn.clone(),
                name: self.student_name(lrn),
                statuses: self
                    .subjects
                    .iter()
                    .map(|subject| {
                        (
                            subject.clone(),
                            row.get(subject).copied().unwrap_or(AttendanceStatus::Absent),
                        )
                    })
                    .collect(),
            })
            .collect();

        BoardSnapshot {
            date: self.date,
            generation: self.generation,
            rows,
        }
    }
}
