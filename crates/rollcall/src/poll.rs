//! Polling refresh loop.
//!
//! There is no push channel from the backend, so liveness is approximated by
//! re-fetching on a fixed interval. Only the first fetch is user-visible as a
//! loading state; every later tick replaces the board silently. The loop is a
//! resource with an explicit lifetime: it must be stopped on teardown or when
//! the effective date changes, otherwise a fetch loop against a stale date
//! outlives the view that wanted it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::board::{AttendanceBoard, BoardSnapshot};
use crate::config::TogglePolicy;
use crate::remote::RemoteStore;

/// A handle to stop a running refresh loop.
///
/// Lightweight and cloneable; any clone can signal the stop.
#[derive(Debug, Clone, Default)]
pub struct PollHandle {
    stop_signal: Arc<AtomicBool>,
}

impl PollHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the loop to stop after its current tick.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }
}

/// Spawn the refresh loop for one day.
///
/// Fetches immediately, then on every `interval` tick, sending a board
/// snapshot through `tx` after each successful refresh. Failed ticks are
/// logged by the board and skipped; they never kill the loop. The loop ends
/// when `handle` signals stop or the receiver side of `tx` is dropped.
pub fn spawn_refresh_loop(
    store: Arc<dyn RemoteStore>,
    subjects: Vec<String>,
    policy: TogglePolicy,
    date: NaiveDate,
    interval: Duration,
    handle: PollHandle,
    tx: mpsc::Sender<BoardSnapshot>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut board = AttendanceBoard::new(subjects, policy, date);
        // tokio::time::interval panics on a zero period; config validation
        // rejects it upstream, but a caller-supplied zero must not kill
        // the task.
        let interval = interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!("Refresh loop started for {} ({:?} interval)", date, interval);
        loop {
            ticker.tick().await;
            if handle.should_stop() {
                break;
            }

            if board.refresh(store.as_ref()).await {
                debug!("Refresh {} applied for {}", board.generation(), date);
                if tx.send(board.snapshot()).await.is_err() {
                    // Receiver gone; nobody is watching this date anymore.
                    break;
                }
            }
        }
        info!("Refresh loop stopped for {}", date);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AttendanceRecord, AttendanceStatus};
    use crate::testing::MockStore;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn store_with_row() -> Arc<MockStore> {
        Arc::new(MockStore::with_records(vec![AttendanceRecord {
            student_lrn: "A1".to_string(),
            subject: Some("PE".to_string()),
            date: day(),
            status: AttendanceStatus::Present,
            evaluation: None,
            student: None,
        }]))
    }

    fn spawn(
        store: Arc<MockStore>,
        handle: PollHandle,
        tx: mpsc::Sender<BoardSnapshot>,
    ) -> tokio::task::JoinHandle<()> {
        spawn_refresh_loop(
            store,
            vec!["PE".to_string(), "MATH".to_string()],
            TogglePolicy::Bidirectional,
            day(),
            Duration::from_millis(10),
            handle,
            tx,
        )
    }

    #[test]
    fn test_handle_new() {
        let handle = PollHandle::new();
        assert!(!handle.should_stop());
    }

    #[test]
    fn test_handle_stop() {
        let handle = PollHandle::new();
        handle.stop();
        assert!(handle.should_stop());
    }

    #[test]
    fn test_handle_clone_shares_signal() {
        let handle1 = PollHandle::new();
        let handle2 = handle1.clone();
        handle1.stop();
        assert!(handle2.should_stop());
    }

    #[tokio::test]
    async fn test_loop_sends_initial_and_periodic_snapshots() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = PollHandle::new();
        let task = spawn(store_with_row(), handle.clone(), tx);

        let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(first.generation, 1);
        assert_eq!(first.rows.len(), 1);

        let second = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert!(second.generation > first.generation);

        handle.stop();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_loop_stops_on_handle() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = PollHandle::new();
        let task = spawn(store_with_row(), handle.clone(), tx);

        // Let at least one snapshot through, then stop.
        let _ = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        handle.stop();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("loop did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_loop_exits_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        let handle = PollHandle::new();
        let task = spawn(store_with_row(), handle, tx);

        drop(rx);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("loop outlived its receiver")
            .unwrap();
    }

    #[tokio::test]
    async fn test_zero_interval_does_not_kill_loop() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = PollHandle::new();
        let task = spawn_refresh_loop(
            store_with_row(),
            vec!["PE".to_string()],
            TogglePolicy::Bidirectional,
            day(),
            Duration::ZERO,
            handle.clone(),
            tx,
        );

        let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(first.generation, 1);

        handle.stop();
        // A panic inside the task would surface here as a JoinError.
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_loop_survives_fetch_failures() {
        let store = store_with_row();
        let (tx, mut rx) = mpsc::channel(8);
        let handle = PollHandle::new();
        let task = spawn(Arc::clone(&store), handle.clone(), tx);

        let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");

        // Ticks fail for a while, then recover; the loop must keep going.
        store.set_fail_fetch(true);
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.set_fail_fetch(false);

        let recovered = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("loop died on fetch failure")
            .expect("channel closed");
        assert!(recovered.generation > first.generation);

        handle.stop();
        task.await.unwrap();
    }
}
