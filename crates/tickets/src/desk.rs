//! Ticket lifecycle: create, close, collect feedback, finalize.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use {
    helpdesk_platform::{PlatformUser, SupportPlatform},
    tokio::sync::Mutex,
    tracing::{info, warn},
};

use crate::{
    Result, feedback, leaderboard, messages,
    outcome::{CloseOutcome, CreateOutcome, FeedbackSubmission, FinalizeReport, Step},
    panel::{self, PanelOutcome},
    schedule::DeferredDeletions,
    selector::select_staff,
    settings::DeskSettings,
    store::TicketStore,
    transcript::TranscriptArchiver,
    types::{Assignments, StaffLoad, TicketAssignment, TicketStatus},
};

/// In-memory mirror of the store plus tickets between close and finalize.
#[derive(Default)]
struct DeskState {
    assignments: Assignments,
    staff_load: StaffLoad,
    /// Closed tickets awaiting feedback. Not persisted.
    closing: HashMap<String, TicketAssignment>,
    /// Channels currently being finalized.
    finalizing: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReport {
    pub open_tickets: usize,
    pub panel: Option<PanelOutcome>,
    pub leaderboard: Step,
}

/// Owns ticket state and drives every lifecycle transition.
///
/// All mutations of assignments and staff load go through one async mutex,
/// and each one is persisted before any message is sent.
pub struct TicketDesk {
    platform: Arc<dyn SupportPlatform>,
    store: Arc<dyn TicketStore>,
    settings: DeskSettings,
    transcripts: TranscriptArchiver,
    deletions: DeferredDeletions,
    state: Mutex<DeskState>,
    /// Live leaderboard message; the lock also serialises refreshes.
    leaderboard_ref: Mutex<Option<String>>,
}

impl TicketDesk {
    pub fn new(
        platform: Arc<dyn SupportPlatform>,
        store: Arc<dyn TicketStore>,
        settings: DeskSettings,
    ) -> Self {
        let transcripts =
            TranscriptArchiver::new(settings.transcript_dir.clone(), settings.transcript_window);
        Self {
            platform,
            store,
            settings,
            transcripts,
            deletions: DeferredDeletions::new(),
            state: Mutex::new(DeskState::default()),
            leaderboard_ref: Mutex::new(None),
        }
    }

    /// Load persisted state, reconcile the panel and leaderboard messages
    /// and publish the activity line.
    pub async fn start(&self) -> StartReport {
        let snapshot = self.store.load().await;
        let open_tickets = snapshot.assignments.len();
        {
            let mut state = self.state.lock().await;
            state.assignments = snapshot.assignments;
            state.staff_load = snapshot.staff_load;
        }
        *self.leaderboard_ref.lock().await = snapshot.leaderboard_message_id;

        let panel = match self.settings.panel_channel.as_deref() {
            Some(channel_id) => Some(
                panel::reconcile(
                    self.platform.as_ref(),
                    self.store.as_ref(),
                    channel_id,
                    self.settings.panel_scan_limit,
                    &self.settings.panel_emoji,
                )
                .await,
            ),
            None => {
                warn!("panel channel not configured, tickets can only be opened programmatically");
                None
            },
        };
        let leaderboard = self.refresh_leaderboard().await;
        self.update_activity(open_tickets).await;

        info!(open_tickets, ?panel, %leaderboard, "ticket desk started");
        StartReport {
            open_tickets,
            panel,
            leaderboard,
        }
    }

    /// Open a ticket for `requester` with the least-loaded available staff member.
    pub async fn create_ticket(&self, requester: &PlatformUser) -> CreateOutcome {
        let mut state = self.state.lock().await;

        let pool = self.platform.staff_pool().await.unwrap_or_else(|e| {
            warn!(error = %e, "could not fetch staff pool");
            Vec::new()
        });
        let Some(staff) = select_staff(&pool, &state.staff_load).cloned() else {
            drop(state);
            let notified = Step::from_result(
                self.platform
                    .send_direct(&requester.id, &messages::no_staff_available())
                    .await,
            );
            let outcome = CreateOutcome::NoStaffAvailable { notified };
            outcome.log(&requester.id);
            return outcome;
        };

        let name = format!("ticket-{}", requester.name);
        let channel_id = match self
            .platform
            .create_private_space(
                &name,
                self.settings.ticket_category.as_deref(),
                &[requester.id.as_str(), staff.id.as_str()],
            )
            .await
        {
            Ok(id) => id,
            Err(e) => {
                let outcome = CreateOutcome::SpaceFailed {
                    reason: e.to_string(),
                };
                outcome.log(&requester.id);
                return outcome;
            },
        };

        state.assignments.insert(
            channel_id.clone(),
            TicketAssignment::open(&requester.id, &staff.id),
        );
        *state.staff_load.entry(staff.id.clone()).or_insert(0) += 1;
        let persisted = self.persist(&state).await;
        let open_tickets = state.assignments.len();
        drop(state);

        let welcome = messages::welcome(requester, self.platform.mention(&staff.id));
        let welcome = Step::from_result(self.platform.send_message(&channel_id, &welcome).await);
        self.update_activity(open_tickets).await;

        let outcome = CreateOutcome::Created {
            channel_id,
            staff_id: staff.id,
            persisted,
            welcome,
        };
        outcome.log(&requester.id);
        outcome
    }

    /// Close the ticket in `channel_id` and ask the requester for feedback.
    ///
    /// A second close of the same channel finds no assignment and is a no-op.
    pub async fn close_ticket(&self, channel_id: &str) -> CloseOutcome {
        let (requester_id, persisted, open_tickets) = {
            let mut state = self.state.lock().await;
            let Some(mut assignment) = state.assignments.remove(channel_id) else {
                let outcome = CloseOutcome::UnknownTicket;
                outcome.log(channel_id);
                return outcome;
            };
            let persisted = self.persist(&state).await;
            assignment.status = TicketStatus::Closing;
            let requester_id = assignment.user_id.clone();
            state.closing.insert(channel_id.to_owned(), assignment);
            (requester_id, persisted, state.assignments.len())
        };

        let revoke = Step::from_result(self.platform.revoke_send(channel_id, &requester_id).await);
        let feedback_prompt = Step::from_result(
            self.platform
                .send_message(channel_id, &messages::feedback_request())
                .await,
        );
        self.update_activity(open_tickets).await;

        let outcome = CloseOutcome::Closed {
            requester_id,
            persisted,
            revoke,
            feedback_prompt,
        };
        outcome.log(channel_id);
        outcome
    }

    /// Record feedback for a closed ticket, notify reviewers, then finalize.
    ///
    /// Only a failure to record the feedback is returned as an error; in
    /// that case the ticket is left for another attempt.
    pub async fn submit_feedback(
        &self,
        channel_id: &str,
        submitter_id: &str,
        rating: &str,
        comment: Option<&str>,
    ) -> Result<FeedbackSubmission> {
        let record = feedback::build_record(channel_id, submitter_id, rating, comment);
        feedback::record(self.store.as_ref(), &record).await?;

        let review = feedback::notify_review(
            self.platform.as_ref(),
            self.settings.feedback_channel.as_deref(),
            &record,
        )
        .await;
        let finalize = self.finalize(channel_id, Some(submitter_id)).await;

        Ok(FeedbackSubmission {
            record,
            review,
            finalize,
        })
    }

    /// Finalize without a feedback record.
    pub async fn skip_feedback(&self, channel_id: &str, actor_id: &str) -> FinalizeReport {
        self.finalize(channel_id, Some(actor_id)).await
    }

    /// Archive the transcript, deliver it, schedule channel deletion and
    /// refresh the leaderboard. Every step is independent of the others.
    ///
    /// The transcript goes to the ticket's requester, or to `fallback_recipient`
    /// when the requester is no longer known (e.g. after a restart).
    pub async fn finalize(&self, channel_id: &str, fallback_recipient: Option<&str>) -> FinalizeReport {
        let requester = {
            let mut state = self.state.lock().await;
            if self.deletions.is_pending(channel_id) || !state.finalizing.insert(channel_id.to_owned()) {
                let report = FinalizeReport::already_finalizing();
                report.log(channel_id);
                return report;
            }
            let closing = state.closing.remove(channel_id);
            // Feedback on a ticket that was never closed still ends it.
            let still_open = state.assignments.remove(channel_id);
            if still_open.is_some() {
                self.persist(&state).await;
            }
            closing.or(still_open).map(|a| a.user_id)
        }
        .or_else(|| fallback_recipient.map(str::to_owned));

        let transcript = self.transcripts.archive(self.platform.as_ref(), channel_id).await;
        let (direct, archive_log) = match &transcript {
            Some(path) => {
                let direct = match &requester {
                    Some(user_id) => Step::from_result(
                        self.platform
                            .send_direct(user_id, &messages::transcript_for_requester(path))
                            .await,
                    ),
                    None => Step::Skipped("requester unknown"),
                };
                let archive_log = match self.settings.transcript_log_channel.as_deref() {
                    Some(log_channel) => Step::from_result(
                        self.platform
                            .send_message(log_channel, &messages::transcript_for_log(path, channel_id))
                            .await,
                    ),
                    None => Step::Skipped("transcript log channel not configured"),
                };
                (direct, archive_log)
            },
            None => (Step::Skipped("no transcript"), Step::Skipped("no transcript")),
        };

        let deletion = if self.deletions.schedule(
            Arc::clone(&self.platform),
            channel_id,
            self.settings.grace_delay,
        ) {
            Step::Done
        } else {
            Step::Skipped("deletion already scheduled")
        };
        self.state.lock().await.finalizing.remove(channel_id);

        let leaderboard = self.refresh_leaderboard().await;

        let report = FinalizeReport {
            transcript,
            direct,
            archive_log,
            deletion,
            leaderboard,
        };
        report.log(channel_id);
        report
    }

    /// The platform reports `channel_id` is gone: drop any pending deletion
    /// and any state still referring to it.
    pub async fn space_removed(&self, channel_id: &str) -> bool {
        let cancelled = self.deletions.cancel(channel_id);
        let (dropped, open_tickets) = {
            let mut state = self.state.lock().await;
            let was_closing = state.closing.remove(channel_id).is_some();
            let was_open = state.assignments.remove(channel_id).is_some();
            if was_open {
                self.persist(&state).await;
            }
            (was_open || was_closing, was_open.then_some(state.assignments.len()))
        };
        if let Some(open_tickets) = open_tickets {
            warn!(channel_id, "ticket channel deleted while the ticket was open");
            self.update_activity(open_tickets).await;
        }
        cancelled || dropped
    }

    /// Re-render the leaderboard from the current staff load.
    pub async fn refresh_leaderboard(&self) -> Step {
        let Some(channel_id) = self.settings.leaderboard_channel.as_deref() else {
            return Step::Skipped("leaderboard channel not configured");
        };
        let load = self.state.lock().await.staff_load.clone();

        let mut current = self.leaderboard_ref.lock().await;
        let (live, step) = leaderboard::refresh(
            self.platform.as_ref(),
            self.store.as_ref(),
            channel_id,
            current.as_deref(),
            &load,
            self.settings.leaderboard_size,
        )
        .await;
        *current = live;
        step
    }

    pub async fn assignment(&self, channel_id: &str) -> Option<TicketAssignment> {
        let state = self.state.lock().await;
        state
            .assignments
            .get(channel_id)
            .or_else(|| state.closing.get(channel_id))
            .cloned()
    }

    pub async fn open_tickets(&self) -> Assignments {
        self.state.lock().await.assignments.clone()
    }

    pub async fn staff_load(&self) -> StaffLoad {
        self.state.lock().await.staff_load.clone()
    }

    pub fn deletion_pending(&self, channel_id: &str) -> bool {
        self.deletions.is_pending(channel_id)
    }

    /// Write-through of the mirror. Failures are logged; memory stays
    /// authoritative for the running process.
    async fn persist(&self, state: &DeskState) -> Step {
        match self.store.save(&state.assignments, &state.staff_load).await {
            Ok(()) => Step::Done,
            Err(e) => {
                warn!(error = %e, "failed to persist ticket state");
                Step::Failed(e.to_string())
            },
        }
    }

    async fn update_activity(&self, open_tickets: usize) {
        if let Err(e) = self
            .platform
            .set_activity(&messages::activity(open_tickets))
            .await
        {
            warn!(error = %e, "failed to update bot activity");
        }
    }
}
