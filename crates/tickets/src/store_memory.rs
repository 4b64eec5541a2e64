//! In-memory store for tests and dry runs.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{
    Error, Result,
    store::TicketStore,
    types::{Assignments, FeedbackRecord, StaffLoad, StoreSnapshot, merge_load},
};

/// Store backed by plain collections. No persistence.
#[derive(Default)]
pub struct InMemoryStore {
    snapshot: Mutex<StoreSnapshot>,
    feedback: Mutex<Vec<FeedbackRecord>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot, as if it had been persisted earlier.
    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            ..Self::default()
        }
    }

    /// Make every subsequent write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Current persisted state.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::message("store is read-only"));
        }
        Ok(())
    }
}

#[async_trait]
impl TicketStore for InMemoryStore {
    async fn load(&self) -> StoreSnapshot {
        self.snapshot()
    }

    async fn save(&self, assignments: &Assignments, staff_load: &StaffLoad) -> Result<()> {
        self.check_writable()?;
        let mut snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        snapshot.assignments = assignments.clone();
        snapshot.staff_load = staff_load.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn save_panel_ref(&self, message_id: Option<&str>) -> Result<()> {
        self.check_writable()?;
        let mut snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        snapshot.panel_message_id = message_id.map(str::to_owned);
        Ok(())
    }

    async fn save_leaderboard_ref(&self, message_id: &str, staff_load: &StaffLoad) -> Result<()> {
        self.check_writable()?;
        let mut snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        snapshot.leaderboard_message_id = Some(message_id.to_owned());
        merge_load(&mut snapshot.staff_load, staff_load);
        Ok(())
    }

    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<()> {
        self.check_writable()?;
        self.feedback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }

    async fn load_feedback(&self) -> Result<Vec<FeedbackRecord>> {
        Ok(self
            .feedback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}
