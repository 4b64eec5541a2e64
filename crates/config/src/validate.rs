//! Configuration validation.
//!
//! Missing credentials are errors; missing surfaces are warnings because the
//! bot still runs and only the step that needs the surface is skipped.

use crate::schema::HelpdeskConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "surfaces.panel_channel_id"
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.into(),
            message: message.into(),
        });
    }
}

#[must_use]
pub fn validate(config: &HelpdeskConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if !config.discord.has_token() {
        result.push(
            Severity::Error,
            "discord.token",
            "bot token is not set (DISCORD_TOKEN)",
        );
    }
    check_id(&mut result, Severity::Error, "discord.guild_id", &config.discord.guild_id);
    check_id(
        &mut result,
        Severity::Warning,
        "discord.staff_role_id",
        &config.discord.staff_role_id,
    );

    let surfaces = &config.surfaces;
    for (path, value) in [
        ("surfaces.ticket_category_id", &surfaces.ticket_category_id),
        ("surfaces.panel_channel_id", &surfaces.panel_channel_id),
        ("surfaces.leaderboard_channel_id", &surfaces.leaderboard_channel_id),
        ("surfaces.feedback_channel_id", &surfaces.feedback_channel_id),
        ("surfaces.transcript_log_channel_id", &surfaces.transcript_log_channel_id),
    ] {
        check_id(&mut result, Severity::Warning, path, value);
    }

    let tickets = &config.tickets;
    if tickets.transcript_window == 0 || tickets.transcript_window > 100 {
        result.push(
            Severity::Warning,
            "tickets.transcript_window",
            format!(
                "{} is outside 1..=100 and will be clamped",
                tickets.transcript_window
            ),
        );
    }
    if tickets.leaderboard_size == 0 {
        result.push(
            Severity::Warning,
            "tickets.leaderboard_size",
            "leaderboard will only show the placeholder line",
        );
    }
    if tickets.panel_emoji.trim().is_empty() {
        result.push(Severity::Error, "tickets.panel_emoji", "panel emoji is empty");
    }
    result.push(
        Severity::Info,
        "storage.data_dir",
        format!("ticket state is kept in {}", config.storage.data_dir.display()),
    );
    result.push(
        Severity::Info,
        "storage.transcript_dir",
        format!("transcripts are written to {}", config.storage.transcript_dir().display()),
    );

    result
}

fn check_id(result: &mut ValidationResult, missing: Severity, path: &str, value: &Option<String>) {
    match value.as_deref().map(str::trim) {
        None | Some("") => result.push(missing, path, "not set"),
        Some(id) if id.parse::<u64>().is_err() => {
            result.push(Severity::Error, path, format!("`{id}` is not a numeric id"));
        },
        Some(_) => {},
    }
}
