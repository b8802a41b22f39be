//! `rollcall` - classroom attendance tracking against a hosted backend
//!
//! This library keeps a derived, optimistic view of one day's per-subject
//! attendance in sync with a remote hosted store: fetches rebuild the view,
//! user toggles patch it optimistically with rollback on write failure, and
//! a polling loop reconciles it with out-of-band changes.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod board;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod poll;
pub mod record;
pub mod remote;

#[cfg(test)]
pub(crate) mod testing;

pub use board::{AttendanceBoard, BoardSnapshot, ToggleOutcome};
pub use calendar::MonthCursor;
pub use config::{Config, TogglePolicy};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use poll::{spawn_refresh_loop, PollHandle};
pub use record::{AttendanceRecord, AttendanceStatus, LogEntry, Student, Teacher};
pub use remote::{RemoteStore, RestStore, Session};
