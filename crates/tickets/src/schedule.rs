//! Deferred, cancellable deletion of ticket channels.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    helpdesk_platform::SupportPlatform,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

/// Channels waiting for their grace delay to elapse before deletion.
///
/// The map lock is a `std::sync::Mutex`; it is never held across `.await`.
#[derive(Clone, Default)]
pub struct DeferredDeletions {
    pending: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl DeferredDeletions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete `space_id` after `delay`. Returns `false` if a deletion for
    /// this channel is already pending.
    pub fn schedule(
        &self,
        platform: Arc<dyn SupportPlatform>,
        space_id: &str,
        delay: Duration,
    ) -> bool {
        let token = CancellationToken::new();
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            if pending.contains_key(space_id) {
                return false;
            }
            pending.insert(space_id.to_owned(), token.clone());
        }

        let pending = Arc::clone(&self.pending);
        let space_id = space_id.to_owned();
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    debug!(channel_id = %space_id, "channel deletion cancelled");
                    return;
                },
                () = tokio::time::sleep(delay) => {},
            }
            match platform.delete_space(&space_id).await {
                Ok(()) => info!(channel_id = %space_id, "ticket channel deleted"),
                Err(e) if e.is_gone() => debug!(channel_id = %space_id, "ticket channel already gone"),
                Err(e) => {
                    warn!(channel_id = %space_id, error = %e, "failed to delete ticket channel")
                },
            }
            // A cancelled token was already removed by `cancel`.
            if !token.is_cancelled() {
                pending
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&space_id);
            }
        });
        true
    }

    /// Cancel a pending deletion, e.g. because the channel is already gone.
    pub fn cancel(&self, space_id: &str) -> bool {
        let token = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(space_id);
        match token {
            Some(token) => {
                token.cancel();
                true
            },
            None => false,
        }
    }

    pub fn is_pending(&self, space_id: &str) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(space_id)
    }
}
