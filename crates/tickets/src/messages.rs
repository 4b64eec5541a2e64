//! Text, cards and controls the desk sends.
//!
//! Control and field ids are matched by the platform adapter when the
//! corresponding button click or form submission comes back.

use helpdesk_platform::{Card, Control, OutgoingMessage, PlatformUser};

use crate::types::FeedbackRecord;

pub const CLOSE_TICKET: &str = "close_ticket";
pub const PROVIDE_FEEDBACK: &str = "provide_feedback";
pub const SKIP_FEEDBACK: &str = "skip_feedback";
pub const FEEDBACK_FORM: &str = "feedback_modal";
pub const RATING_FIELD: &str = "rating";
pub const COMMENTS_FIELD: &str = "comments";

/// Title that identifies the ticket panel among channel messages.
pub const PANEL_TITLE: &str = "🎟️ Ticket Support System";

pub const NO_COMMENT: &str = "No additional comments provided.";
pub const FEEDBACK_THANKS: &str =
    "Thank you for your feedback! The ticket will now be closed and deleted.";
pub const FEEDBACK_FAILED: &str =
    "An error occurred while processing your feedback. Please try again later.";
pub const SKIP_ACK: &str = "Understood. The ticket will now be closed and deleted.";

const BLURPLE: u32 = 0x5865F2;
const ORANGE: u32 = 0xFFA500;
const GOLD: u32 = 0xFFD700;

/// Highest star count drawn for a rating.
const MAX_STARS: usize = 10;

pub fn panel(emoji: &str) -> OutgoingMessage {
    OutgoingMessage::card(
        Card::new(
            PANEL_TITLE,
            format!("React with {emoji} below to open a support ticket."),
            BLURPLE,
        )
        .footer("Customer Support"),
    )
}

pub fn no_staff_available() -> OutgoingMessage {
    OutgoingMessage::text("No available staff members right now. Please try again later.")
}

pub fn welcome(requester: &PlatformUser, staff_mention: String) -> OutgoingMessage {
    OutgoingMessage::card(
        Card::new(
            "📩 Support Ticket",
            "A staff member will assist you shortly.\nWhen you are done, click the **Close Ticket** button below.",
            BLURPLE,
        )
        .footer(format!("Ticket created by {}", requester.tag)),
    )
    .with_content(staff_mention)
    .with_control(Control::primary(CLOSE_TICKET, "Close Ticket"))
}

pub fn feedback_request() -> OutgoingMessage {
    OutgoingMessage::card(
        Card::new(
            "📝 Feedback Request",
            "Please provide feedback by clicking the button below.",
            ORANGE,
        )
        .footer("Customer Feedback"),
    )
    .with_control(Control::primary(PROVIDE_FEEDBACK, "Provide Feedback"))
    .with_control(Control::secondary(SKIP_FEEDBACK, "Skip"))
}

/// Card posted to the feedback review channel.
pub fn feedback_review(record: &FeedbackRecord, submitter: Option<&PlatformUser>) -> OutgoingMessage {
    let stars = helpdesk_common::star_bar(&record.rating, MAX_STARS);
    let mut card = Card::new(
        "✨ User Feedback",
        "Feedback received from a recently closed support ticket.",
        GOLD,
    )
    .field("🌟 Rating", format!("{stars} ({} stars)", record.rating), true)
    .field("💬 Comments", record.comment.clone(), false);
    card.timestamped = true;

    match submitter {
        Some(user) => {
            card.footer = Some(format!("Submitted by {}", user.tag));
            card.footer_icon = user.avatar_url.clone();
            card.thumbnail = user.avatar_url.clone();
        },
        None => card.footer = Some(format!("Submitted by {}", record.user_id)),
    }
    OutgoingMessage::card(card)
}

pub fn transcript_for_requester(path: &std::path::Path) -> OutgoingMessage {
    OutgoingMessage::text("Here’s the transcript for your closed ticket:").with_attachment(path)
}

pub fn transcript_for_log(path: &std::path::Path, channel_id: &str) -> OutgoingMessage {
    OutgoingMessage::text(format!("Transcript for the closed ticket `{channel_id}`:"))
        .with_attachment(path)
}

pub fn leaderboard(title_size: usize, body: String) -> OutgoingMessage {
    OutgoingMessage::card(
        Card::new(
            format!("🏆 Top {title_size} Most Active Ticket Staff"),
            body,
            GOLD,
        )
        .footer("Updated every time a ticket is closed."),
    )
}

pub fn activity(open_tickets: usize) -> String {
    format!("Handling {open_tickets} tickets")
}
