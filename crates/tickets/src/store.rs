//! Persistence trait for ticket state.

use async_trait::async_trait;

use crate::{
    Result,
    types::{Assignments, FeedbackRecord, StaffLoad, StoreSnapshot},
};

/// Durable home of assignments, staff load, display references and feedback.
///
/// Single writer: the running [`crate::TicketDesk`] is assumed to be the only
/// process touching the backing storage.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Load everything. Never fails: unreadable entities come back empty and
    /// the problem is logged.
    async fn load(&self) -> StoreSnapshot;

    /// Persist assignments and staff load together. Keeps the stored
    /// leaderboard reference.
    async fn save(&self, assignments: &Assignments, staff_load: &StaffLoad) -> Result<()>;

    async fn save_panel_ref(&self, message_id: Option<&str>) -> Result<()>;

    async fn save_leaderboard_ref(&self, message_id: &str, staff_load: &StaffLoad) -> Result<()>;

    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<()>;

    async fn load_feedback(&self) -> Result<Vec<FeedbackRecord>>;
}
