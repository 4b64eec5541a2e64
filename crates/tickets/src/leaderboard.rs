//! Staff leaderboard: ranking and the single persistent display message.

use {
    helpdesk_platform::SupportPlatform,
    tracing::{info, warn},
};

use crate::{messages, outcome::Step, store::TicketStore, types::StaffLoad};

/// Top `limit` staff by load, highest first. Equal loads are ordered by
/// staff id so the ranking does not depend on insertion history.
pub fn top_staff(load: &StaffLoad, limit: usize) -> Vec<(&str, u64)> {
    let mut ranked: Vec<(&str, u64)> = load.iter().map(|(id, n)| (id.as_str(), *n)).collect();
    // `load` iterates in id order and the sort is stable.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

/// One line per ranked member, or a placeholder when nobody has tickets.
pub fn render(ranked: &[(&str, u64)], mention: impl Fn(&str) -> String) -> String {
    if ranked.is_empty() {
        return "No activity yet.".into();
    }
    ranked
        .iter()
        .enumerate()
        .map(|(i, (id, n))| format!("{}. {} - {n} tickets", i + 1, mention(id)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bring the leaderboard message up to date.
///
/// Edits `current` in place when possible. If there is no reference, or the
/// edit fails for any reason, a new message is posted and its id persisted.
/// Returns the id of the live message, if any.
pub async fn refresh(
    platform: &dyn SupportPlatform,
    store: &dyn TicketStore,
    channel_id: &str,
    current: Option<&str>,
    load: &StaffLoad,
    limit: usize,
) -> (Option<String>, Step) {
    let ranked = top_staff(load, limit);
    let body = render(&ranked, |id| platform.mention(id));
    let message = messages::leaderboard(limit, body);

    if let Some(message_id) = current {
        match platform.edit_message(channel_id, message_id, &message).await {
            Ok(()) => return (Some(message_id.to_owned()), Step::Done),
            Err(e) if e.is_gone() => {
                info!(channel_id, message_id, "leaderboard message was deleted, posting a new one");
            },
            Err(e) => {
                warn!(channel_id, message_id, error = %e, "could not edit leaderboard, posting a new one");
            },
        }
    }

    let message_id = match platform.send_message(channel_id, &message).await {
        Ok(id) => id,
        Err(e) => return (current.map(str::to_owned), Step::Failed(e.to_string())),
    };
    if let Err(e) = store.save_leaderboard_ref(&message_id, load).await {
        warn!(channel_id, message_id, error = %e, "failed to persist leaderboard reference");
    }
    (Some(message_id), Step::Done)
}
