//! Plain-text transcripts of ticket channels.

use std::path::PathBuf;

use {
    helpdesk_platform::{HistoryMessage, SupportPlatform},
    tokio::fs,
    tracing::{info, warn},
};

use crate::{Error, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Render messages oldest first as `[timestamp] author: content` lines.
///
/// Input may be in any order (platforms usually return newest first);
/// messages sharing a timestamp keep their relative chronological order.
pub fn render(messages: &[HistoryMessage]) -> String {
    let mut ordered: Vec<&HistoryMessage> = messages.iter().rev().collect();
    ordered.sort_by_key(|m| m.created_at);
    ordered
        .iter()
        .map(|m| {
            format!(
                "[{}] {}: {}",
                m.created_at.format(TIMESTAMP_FORMAT),
                m.author,
                m.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes one transcript file per archived channel.
#[derive(Debug, Clone)]
pub struct TranscriptArchiver {
    dir: PathBuf,
    window: usize,
}

impl TranscriptArchiver {
    pub fn new(dir: impl Into<PathBuf>, window: usize) -> Self {
        Self {
            dir: dir.into(),
            window,
        }
    }

    /// `<dir>/transcript-<channel_id>.txt`
    pub fn path_for(&self, channel_id: &str) -> Result<PathBuf> {
        let safe = !channel_id.is_empty()
            && channel_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(Error::invalid_id(channel_id));
        }
        Ok(self.dir.join(format!("transcript-{channel_id}.txt")))
    }

    /// Archive the latest messages of `channel_id`. Failures are logged and
    /// reported as `None`.
    pub async fn archive(
        &self,
        platform: &dyn SupportPlatform,
        channel_id: &str,
    ) -> Option<PathBuf> {
        match self.try_archive(platform, channel_id).await {
            Ok(path) => {
                info!(channel_id, path = %path.display(), "transcript saved");
                Some(path)
            },
            Err(e) => {
                warn!(channel_id, error = %e, "failed to generate transcript");
                None
            },
        }
    }

    async fn try_archive(
        &self,
        platform: &dyn SupportPlatform,
        channel_id: &str,
    ) -> Result<PathBuf> {
        let path = self.path_for(channel_id)?;
        let messages = platform.recent_messages(channel_id, self.window).await?;
        fs::create_dir_all(&self.dir).await?;
        fs::write(&path, render(&messages)).await?;
        Ok(path)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::{TimeZone, Utc},
    };

    fn msg(id: &str, secs: i64, author: &str, content: &str) -> HistoryMessage {
        HistoryMessage {
            id: id.into(),
            author: author.into(),
            content: content.into(),
            created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            card_title: None,
        }
    }

    #[test]
    fn renders_oldest_first() {
        // Newest first, the way platforms return history.
        let history = vec![
            msg("3", 20, "bob", "bye"),
            msg("2", 10, "staff", "how can I help?"),
            msg("1", 0, "bob", "hi"),
        ];
        let text = render(&history);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("bob: hi"));
        assert!(lines[1].ends_with("staff: how can I help?"));
        assert!(lines[2].ends_with("bob: bye"));
        assert!(lines[0].starts_with("[2023-11-14 22:13:20 UTC]"));
    }

    #[test]
    fn same_timestamp_keeps_chronology() {
        let history = vec![msg("2", 0, "b", "second"), msg("1", 0, "a", "first")];
        let text = render(&history);
        assert!(text.lines().next().unwrap().ends_with("a: first"));
    }

    #[test]
    fn empty_history_is_empty_text() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn rejects_path_like_ids() {
        let archiver = TranscriptArchiver::new("/tmp/t", 100);
        assert!(archiver.path_for("../etc").is_err());
        assert!(archiver.path_for("").is_err());
        assert_eq!(
            archiver.path_for("123").unwrap(),
            PathBuf::from("/tmp/t/transcript-123.txt")
        );
    }
}
