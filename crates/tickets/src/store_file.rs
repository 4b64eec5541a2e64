//! JSON file-backed ticket store with atomic writes.
//!
//! Layout under the data directory:
//! - `tickets.json`: `{ channelId: { userId, staffId, status } }`
//! - `leaderboard.json`: `{ staffTickets: { staffId: count }, messageId }`
//! - `panel.json`: `{ panelMessageId }`
//! - `feedback.json`: `[ { ticketId, userId, rating, comment } ]`

use std::path::{Path, PathBuf};

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    tokio::{fs, sync::Mutex},
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    store::TicketStore,
    types::{Assignments, FeedbackRecord, StaffLoad, StoreSnapshot, merge_load},
};

const TICKETS_FILE: &str = "tickets.json";
const LEADERBOARD_FILE: &str = "leaderboard.json";
const PANEL_FILE: &str = "panel.json";
const FEEDBACK_FILE: &str = "feedback.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardFile {
    #[serde(default)]
    staff_tickets: StaffLoad,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PanelFile {
    #[serde(default)]
    panel_message_id: Option<String>,
}

/// File-backed store, one JSON document per entity.
///
/// Each file is replaced atomically on its own; writes are serialised so
/// read-modify-write of `leaderboard.json` never loses an update.
pub struct FileStore {
    dir: PathBuf,
    writes: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            writes: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// `Ok(None)` when the file does not exist yet.
    async fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path(name);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        let data = fs::read_to_string(&path).await?;
        let value =
            serde_json::from_str(&data).map_err(|source| Error::Corrupt { path, source })?;
        Ok(Some(value))
    }

    async fn read_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        match self.read(name).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(file = name, "store file missing, starting empty");
                T::default()
            },
            Err(e) => {
                warn!(file = name, error = %e, "store file unreadable, starting empty");
                T::default()
            },
        }
    }

    /// Atomic write: write to temp, rename over target.
    async fn atomic_write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(value)?;
        let target = self.path(name);
        let tmp = target.with_extension("json.tmp");

        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &target).await?;
        Ok(())
    }

    /// Stored leaderboard document, or an empty one if it cannot be read.
    async fn leaderboard_file(&self) -> LeaderboardFile {
        self.read_or_default(LEADERBOARD_FILE).await
    }
}

#[async_trait]
impl TicketStore for FileStore {
    async fn load(&self) -> StoreSnapshot {
        let assignments: Assignments = self.read_or_default(TICKETS_FILE).await;
        let leaderboard = self.leaderboard_file().await;
        let panel: PanelFile = self.read_or_default(PANEL_FILE).await;

        debug!(
            dir = %self.dir.display(),
            open_tickets = assignments.len(),
            staff = leaderboard.staff_tickets.len(),
            "ticket store loaded"
        );

        StoreSnapshot {
            assignments,
            staff_load: leaderboard.staff_tickets,
            panel_message_id: panel.panel_message_id,
            leaderboard_message_id: leaderboard.message_id,
        }
    }

    async fn save(&self, assignments: &Assignments, staff_load: &StaffLoad) -> Result<()> {
        let _guard = self.writes.lock().await;
        self.atomic_write(TICKETS_FILE, assignments).await?;

        let mut leaderboard = self.leaderboard_file().await;
        leaderboard.staff_tickets = staff_load.clone();
        self.atomic_write(LEADERBOARD_FILE, &leaderboard).await
    }

    async fn save_panel_ref(&self, message_id: Option<&str>) -> Result<()> {
        let _guard = self.writes.lock().await;
        let panel = PanelFile {
            panel_message_id: message_id.map(str::to_owned),
        };
        self.atomic_write(PANEL_FILE, &panel).await
    }

    async fn save_leaderboard_ref(&self, message_id: &str, staff_load: &StaffLoad) -> Result<()> {
        let _guard = self.writes.lock().await;
        let mut leaderboard = self.leaderboard_file().await;
        merge_load(&mut leaderboard.staff_tickets, staff_load);
        leaderboard.message_id = Some(message_id.to_owned());
        self.atomic_write(LEADERBOARD_FILE, &leaderboard).await
    }

    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<()> {
        let _guard = self.writes.lock().await;
        let mut records = match self.read::<Vec<FeedbackRecord>>(FEEDBACK_FILE).await {
            Ok(records) => records.unwrap_or_default(),
            Err(Error::Corrupt { path, source }) => {
                // Keep the unreadable log aside instead of overwriting it.
                let aside = path.with_extension("json.corrupt");
                warn!(
                    error = %source,
                    moved_to = %aside.display(),
                    "feedback log unreadable, starting a new one"
                );
                fs::rename(&path, &aside).await?;
                Vec::new()
            },
            Err(e) => return Err(e),
        };
        records.push(record.clone());
        self.atomic_write(FEEDBACK_FILE, &records).await
    }

    async fn load_feedback(&self) -> Result<Vec<FeedbackRecord>> {
        Ok(self
            .read::<Vec<FeedbackRecord>>(FEEDBACK_FILE)
            .await?
            .unwrap_or_default())
    }
}
