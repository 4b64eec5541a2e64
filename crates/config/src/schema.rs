//! Config schema types (platform credentials, managed surfaces, storage, ticket tunables).
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpdeskConfig {
    pub discord: DiscordConfig,
    pub surfaces: SurfacesConfig,
    pub storage: StorageConfig,
    pub tickets: TicketsConfig,
}

/// Credentials and the guild/role the bot serves.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token from the developer portal. Serialized as a placeholder.
    #[serde(serialize_with = "serialize_redacted")]
    pub token: Secret<String>,

    /// Guild (server) the bot manages tickets in.
    pub guild_id: Option<String>,

    /// Role whose members can be assigned tickets.
    pub staff_role_id: Option<String>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &REDACTED)
            .field("guild_id", &self.guild_id)
            .field("staff_role_id", &self.staff_role_id)
            .finish()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            guild_id: None,
            staff_role_id: None,
        }
    }
}

impl DiscordConfig {
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

const REDACTED: &str = "[REDACTED]";

fn serialize_redacted<S: serde::Serializer>(
    _secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(REDACTED)
}

/// Channels and categories the bot writes to. Every entry is optional; a
/// missing surface disables the step that needs it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfacesConfig {
    /// Category new ticket channels are created under.
    pub ticket_category_id: Option<String>,
    /// Channel holding the "open a ticket" panel.
    pub panel_channel_id: Option<String>,
    /// Channel holding the staff leaderboard.
    pub leaderboard_channel_id: Option<String>,
    /// Channel that receives submitted feedback.
    pub feedback_channel_id: Option<String>,
    /// Channel that receives archived transcripts.
    pub transcript_log_channel_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for `tickets.json`, `leaderboard.json`, `panel.json`, `feedback.json`.
    pub data_dir: PathBuf,
    /// Transcript directory; defaults to `<data_dir>/transcripts`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            transcript_dir: None,
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn transcript_dir(&self) -> PathBuf {
        self.transcript_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("transcripts"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketsConfig {
    /// Seconds to wait before deleting a finalized ticket channel.
    pub grace_delay_secs: u64,
    /// Most recent messages captured in a transcript.
    pub transcript_window: usize,
    /// Recent panel-channel messages scanned for duplicate panels at startup.
    pub panel_scan_limit: usize,
    /// Entries shown on the leaderboard.
    pub leaderboard_size: usize,
    /// Reaction that opens a ticket from the panel.
    pub panel_emoji: String,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            grace_delay_secs: 5,
            transcript_window: 100,
            panel_scan_limit: 10,
            leaderboard_size: 5,
            panel_emoji: "🎟️".into(),
        }
    }
}
