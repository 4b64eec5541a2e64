//! Ticket lifecycle and staff-assignment engine.
//!
//! A ticket moves `open → closing → finalized`: it is opened with the
//! least-loaded available staff member, closed by either party, and
//! finalized once feedback is submitted or skipped (transcript archived,
//! channel deleted after a grace delay, leaderboard refreshed).
//!
//! State lives in [`desk::TicketDesk`] and is persisted through a
//! [`store::TicketStore`] on every mutation.

pub mod desk;
pub mod error;
pub mod feedback;
pub mod leaderboard;
pub mod messages;
pub mod outcome;
pub mod panel;
pub mod schedule;
pub mod selector;
pub mod settings;
pub mod store;
pub mod store_file;
pub mod store_memory;
pub mod transcript;
pub mod types;

pub use {
    desk::{StartReport, TicketDesk},
    error::{Error, Result},
    outcome::{CloseOutcome, CreateOutcome, FeedbackSubmission, FinalizeReport, Step},
    panel::PanelOutcome,
    settings::DeskSettings,
    store::TicketStore,
    store_file::FileStore,
    store_memory::InMemoryStore,
    types::{Assignments, FeedbackRecord, StaffLoad, StoreSnapshot, TicketAssignment, TicketStatus},
};
