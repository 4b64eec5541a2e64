//! Feedback collection: append to the log, tell the reviewers.

use {
    helpdesk_platform::SupportPlatform,
    tracing::{debug, warn},
};

use crate::{Result, messages, outcome::Step, store::TicketStore, types::FeedbackRecord};

/// Build a record from raw form input. A blank comment gets the placeholder.
pub fn build_record(
    ticket_id: &str,
    submitter_id: &str,
    rating: &str,
    comment: Option<&str>,
) -> FeedbackRecord {
    let comment = comment
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(messages::NO_COMMENT);
    FeedbackRecord {
        ticket_id: ticket_id.to_owned(),
        user_id: submitter_id.to_owned(),
        rating: rating.trim().to_owned(),
        comment: comment.to_owned(),
    }
}

/// Append `record` to the feedback log. No deduplication, no range checks.
pub async fn record(store: &dyn TicketStore, record: &FeedbackRecord) -> Result<()> {
    store.append_feedback(record).await?;
    debug!(ticket_id = %record.ticket_id, "feedback recorded");
    Ok(())
}

/// Post the record to the review channel, if one is configured.
pub async fn notify_review(
    platform: &dyn SupportPlatform,
    review_channel: Option<&str>,
    record: &FeedbackRecord,
) -> Step {
    let Some(channel_id) = review_channel else {
        warn!("feedback channel not configured, review notice skipped");
        return Step::Skipped("feedback channel not configured");
    };

    let submitter = match platform.user_profile(&record.user_id).await {
        Ok(user) => Some(user),
        Err(e) => {
            warn!(user_id = %record.user_id, error = %e, "could not fetch feedback submitter");
            None
        },
    };
    let message = messages::feedback_review(record, submitter.as_ref());
    Step::from_result(platform.send_message(channel_id, &message).await)
}
