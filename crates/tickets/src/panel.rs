//! Startup reconciliation of the "open a ticket" panel message.

use {
    helpdesk_platform::SupportPlatform,
    tracing::{info, warn},
};

use crate::{messages, store::TicketStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelOutcome {
    /// An existing panel was kept; `removed` duplicates were deleted.
    Adopted { message_id: String, removed: usize },
    Created { message_id: String },
    Failed { reason: String },
}

impl PanelOutcome {
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::Adopted { message_id, .. } | Self::Created { message_id } => Some(message_id),
            Self::Failed { .. } => None,
        }
    }
}

/// Make sure exactly one panel message is live in `channel_id`.
///
/// Scans the latest `scan_limit` messages for the panel title. The newest
/// match is kept and every older one deleted; with no match a fresh panel
/// is posted and reacted to. The surviving id is persisted either way.
pub async fn reconcile(
    platform: &dyn SupportPlatform,
    store: &dyn TicketStore,
    channel_id: &str,
    scan_limit: usize,
    emoji: &str,
) -> PanelOutcome {
    let mut panels = match platform.recent_messages(channel_id, scan_limit).await {
        Ok(messages) => messages
            .into_iter()
            .filter(|m| m.card_title.as_deref() == Some(messages::PANEL_TITLE))
            .collect::<Vec<_>>(),
        Err(e) => {
            warn!(channel_id, error = %e, "could not scan panel channel");
            Vec::new()
        },
    };

    if !panels.is_empty() {
        panels.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let keep = panels.remove(0);
        let mut removed = 0;
        for stale in &panels {
            match platform.delete_message(channel_id, &stale.id).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(channel_id, message_id = %stale.id, error = %e, "failed to delete old panel message")
                },
            }
        }
        if removed > 0 {
            info!(channel_id, removed, "deleted duplicate panel messages");
        }
        persist(store, &keep.id).await;
        return PanelOutcome::Adopted {
            message_id: keep.id,
            removed,
        };
    }

    let message_id = match platform
        .send_message(channel_id, &messages::panel(emoji))
        .await
    {
        Ok(id) => id,
        Err(e) => {
            warn!(channel_id, error = %e, "failed to post panel message");
            return PanelOutcome::Failed {
                reason: e.to_string(),
            };
        },
    };
    if let Err(e) = platform.add_reaction(channel_id, &message_id, emoji).await {
        warn!(channel_id, message_id, error = %e, "failed to react to panel message");
    }
    persist(store, &message_id).await;
    info!(channel_id, message_id, "new panel message created");
    PanelOutcome::Created { message_id }
}

async fn persist(store: &dyn TicketStore, message_id: &str) {
    if let Err(e) = store.save_panel_ref(Some(message_id)).await {
        warn!(message_id, error = %e, "failed to persist panel reference");
    }
}
