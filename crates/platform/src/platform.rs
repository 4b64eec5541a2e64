use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
};

use crate::{
    Result,
    message::{HistoryMessage, OutgoingMessage},
};

/// Live availability of a member as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Online,
    Idle,
    DoNotDisturb,
    Offline,
}

impl Presence {
    /// Members that are connected in any form can take tickets; only fully
    /// offline (or invisible) members are skipped.
    #[must_use]
    pub fn is_available(self) -> bool {
        !matches!(self, Self::Offline)
    }
}

/// A holder of the staff role together with their current presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffMember {
    pub id: String,
    pub tag: String,
    pub presence: Presence,
}

/// Identity of a user as shown on cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformUser {
    pub id: String,
    /// Short name, used for channel names.
    pub name: String,
    /// Display tag, used in footers and transcripts.
    pub tag: String,
    pub avatar_url: Option<String>,
}

/// Everything the ticket engine needs from the host chat platform.
///
/// All identifiers are opaque strings. Implementations report failures
/// through [`crate::Error`]; the engine decides which failures are fatal.
#[async_trait]
pub trait SupportPlatform: Send + Sync {
    /// Members holding the staff role, in a stable order, with presence.
    async fn staff_pool(&self) -> Result<Vec<StaffMember>>;

    /// Create a channel only `members` (and the bot) can see and write in.
    async fn create_private_space(
        &self,
        name: &str,
        parent: Option<&str>,
        members: &[&str],
    ) -> Result<String>;

    /// Remove `user_id`'s permission to send messages in `space_id`.
    async fn revoke_send(&self, space_id: &str, user_id: &str) -> Result<()>;

    async fn delete_space(&self, space_id: &str) -> Result<()>;

    /// Post a message and return its id.
    async fn send_message(&self, channel_id: &str, message: &OutgoingMessage) -> Result<String>;

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        message: &OutgoingMessage,
    ) -> Result<()>;

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()>;

    async fn add_reaction(&self, channel_id: &str, message_id: &str, emoji: &str) -> Result<()>;

    /// Up to `limit` most recent messages, newest first.
    async fn recent_messages(&self, channel_id: &str, limit: usize) -> Result<Vec<HistoryMessage>>;

    /// Deliver a private message to a user.
    async fn send_direct(&self, user_id: &str, message: &OutgoingMessage) -> Result<()>;

    async fn user_profile(&self, user_id: &str) -> Result<PlatformUser>;

    /// Set the bot's visible status line.
    async fn set_activity(&self, text: &str) -> Result<()>;

    /// Inline reference to a user inside message text.
    fn mention(&self, user_id: &str) -> String {
        format!("<@{user_id}>")
    }
}
