//! Structured results of lifecycle operations.
//!
//! Side effects are best-effort: each one records a [`Step`] and the
//! operation logs a single summary line instead of failing as a whole.

use std::{fmt, path::PathBuf};

use tracing::{info, warn};

use crate::types::FeedbackRecord;

/// Result of one best-effort side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Done,
    Skipped(&'static str),
    Failed(String),
}

impl Step {
    pub fn from_result<T, E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::Done,
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => f.write_str("done"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::Failed(error) => write!(f, "failed ({error})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created {
        channel_id: String,
        staff_id: String,
        persisted: Step,
        welcome: Step,
    },
    /// Nobody with the staff role is available; the requester was told.
    NoStaffAvailable { notified: Step },
    /// The private channel could not be created; nothing was recorded.
    SpaceFailed { reason: String },
}

impl CreateOutcome {
    pub(crate) fn log(&self, requester_id: &str) {
        match self {
            Self::Created {
                channel_id,
                staff_id,
                persisted,
                welcome,
            } => info!(
                requester_id,
                channel_id,
                staff_id,
                %persisted,
                %welcome,
                "ticket created"
            ),
            Self::NoStaffAvailable { notified } => {
                warn!(requester_id, %notified, "no staff available for ticket")
            },
            Self::SpaceFailed { reason } => {
                warn!(requester_id, reason, "ticket channel could not be created")
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed {
        requester_id: String,
        persisted: Step,
        revoke: Step,
        feedback_prompt: Step,
    },
    /// No open ticket for this channel (never opened, or already closed).
    UnknownTicket,
}

impl CloseOutcome {
    pub(crate) fn log(&self, channel_id: &str) {
        match self {
            Self::Closed {
                requester_id,
                persisted,
                revoke,
                feedback_prompt,
            } => info!(
                channel_id,
                requester_id,
                %persisted,
                %revoke,
                %feedback_prompt,
                "ticket closed, awaiting feedback"
            ),
            Self::UnknownTicket => {
                warn!(channel_id, "close requested for a channel with no open ticket")
            },
        }
    }
}

/// What happened while wrapping up a closed ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeReport {
    pub transcript: Option<PathBuf>,
    pub direct: Step,
    pub archive_log: Step,
    pub deletion: Step,
    pub leaderboard: Step,
}

impl FinalizeReport {
    pub(crate) fn already_finalizing() -> Self {
        let skipped = Step::Skipped("already finalizing");
        Self {
            transcript: None,
            direct: skipped.clone(),
            archive_log: skipped.clone(),
            deletion: skipped.clone(),
            leaderboard: skipped,
        }
    }

    pub(crate) fn log(&self, channel_id: &str) {
        let transcript = self
            .transcript
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".into());
        let steps = [
            &self.direct,
            &self.archive_log,
            &self.deletion,
            &self.leaderboard,
        ];
        if steps.iter().any(|s| s.is_failed()) {
            warn!(
                channel_id,
                transcript,
                direct = %self.direct,
                archive_log = %self.archive_log,
                deletion = %self.deletion,
                leaderboard = %self.leaderboard,
                "ticket finalized with failures"
            );
        } else {
            info!(
                channel_id,
                transcript,
                direct = %self.direct,
                archive_log = %self.archive_log,
                deletion = %self.deletion,
                leaderboard = %self.leaderboard,
                "ticket finalized"
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSubmission {
    pub record: FeedbackRecord,
    pub review: Step,
    pub finalize: FinalizeReport,
}
