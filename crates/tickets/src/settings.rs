use std::{path::PathBuf, time::Duration};

use helpdesk_config::HelpdeskConfig;

/// Where the desk posts things and how it paces them.
///
/// Surface ids are optional; an operation whose surface is missing logs and
/// skips that step.
#[derive(Debug, Clone)]
pub struct DeskSettings {
    pub ticket_category: Option<String>,
    pub panel_channel: Option<String>,
    pub leaderboard_channel: Option<String>,
    pub feedback_channel: Option<String>,
    pub transcript_log_channel: Option<String>,
    pub transcript_dir: PathBuf,
    pub grace_delay: Duration,
    pub transcript_window: usize,
    pub panel_scan_limit: usize,
    pub leaderboard_size: usize,
    pub panel_emoji: String,
}

impl DeskSettings {
    #[must_use]
    pub fn from_config(config: &HelpdeskConfig) -> Self {
        let surfaces = &config.surfaces;
        let tickets = &config.tickets;
        Self {
            ticket_category: surfaces.ticket_category_id.clone(),
            panel_channel: surfaces.panel_channel_id.clone(),
            leaderboard_channel: surfaces.leaderboard_channel_id.clone(),
            feedback_channel: surfaces.feedback_channel_id.clone(),
            transcript_log_channel: surfaces.transcript_log_channel_id.clone(),
            transcript_dir: config.storage.transcript_dir(),
            grace_delay: Duration::from_secs(tickets.grace_delay_secs),
            transcript_window: tickets.transcript_window.clamp(1, 100),
            panel_scan_limit: tickets.panel_scan_limit.max(1),
            leaderboard_size: tickets.leaderboard_size,
            panel_emoji: tickets.panel_emoji.clone(),
        }
    }
}

impl Default for DeskSettings {
    fn default() -> Self {
        Self::from_config(&HelpdeskConfig::default())
    }
}
