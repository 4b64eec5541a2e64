//! Recording in-memory platform shared by the integration tests.
#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    chrono::{TimeZone, Utc},
    helpdesk_platform::{
        Error, HistoryMessage, OutgoingMessage, PlatformUser, Presence, Result, StaffMember,
        SupportPlatform,
    },
    helpdesk_tickets::{DeskSettings, InMemoryStore, TicketDesk},
};

/// Operations a test can make fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    StaffPool,
    CreateSpace,
    Revoke,
    Send,
    Edit,
    History,
    Direct,
    Profile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateSpace {
        id: String,
        name: String,
        parent: Option<String>,
        members: Vec<String>,
    },
    Revoke { space: String, user: String },
    DeleteSpace(String),
    Send { channel: String, message: OutgoingMessage },
    Edit { channel: String, message_id: String },
    DeleteMessage { channel: String, message_id: String },
    React { channel: String, message_id: String, emoji: String },
    Direct { user: String, message: OutgoingMessage },
    Activity(String),
}

#[derive(Default)]
pub struct MockPlatform {
    staff: Mutex<Vec<StaffMember>>,
    history: Mutex<HashMap<String, Vec<HistoryMessage>>>,
    failing: Mutex<HashSet<Op>>,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicU64,
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_staff(staff: &[(&str, Presence)]) -> Arc<Self> {
        let platform = Self::new();
        platform.set_staff(staff);
        platform
    }

    pub fn set_staff(&self, staff: &[(&str, Presence)]) {
        *self.staff.lock().unwrap_or_else(|e| e.into_inner()) = staff
            .iter()
            .map(|(id, presence)| StaffMember {
                id: (*id).to_string(),
                tag: format!("{id}#0001"),
                presence: *presence,
            })
            .collect();
    }

    /// Replace the history of `channel`, given oldest first.
    pub fn set_history(&self, channel: &str, oldest_first: Vec<HistoryMessage>) {
        let mut newest_first = oldest_first;
        newest_first.reverse();
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(channel.to_string(), newest_first);
    }

    pub fn fail(&self, op: Op) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn deleted_spaces(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DeleteSpace(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn directs_to(&self, user: &str) -> Vec<OutgoingMessage> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Direct { user: u, message } if u == user => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn sent_to(&self, channel: &str) -> Vec<OutgoingMessage> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { channel: ch, message } if ch == channel => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn last_activity(&self) -> Option<String> {
        self.calls().into_iter().rev().find_map(|c| match c {
            Call::Activity(text) => Some(text),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn check(&self, op: Op) -> Result<()> {
        if self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&op)
        {
            return Err(Error::request(format!("{op:?}"), "injected failure"));
        }
        Ok(())
    }

    fn mint(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl SupportPlatform for MockPlatform {
    async fn staff_pool(&self) -> Result<Vec<StaffMember>> {
        self.check(Op::StaffPool)?;
        Ok(self.staff.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn create_private_space(
        &self,
        name: &str,
        parent: Option<&str>,
        members: &[&str],
    ) -> Result<String> {
        self.check(Op::CreateSpace)?;
        let id = self.mint("ch");
        self.record(Call::CreateSpace {
            id: id.clone(),
            name: name.to_string(),
            parent: parent.map(str::to_string),
            members: members.iter().map(|m| (*m).to_string()).collect(),
        });
        Ok(id)
    }

    async fn revoke_send(&self, space_id: &str, user_id: &str) -> Result<()> {
        self.check(Op::Revoke)?;
        self.record(Call::Revoke {
            space: space_id.to_string(),
            user: user_id.to_string(),
        });
        Ok(())
    }

    async fn delete_space(&self, space_id: &str) -> Result<()> {
        self.record(Call::DeleteSpace(space_id.to_string()));
        Ok(())
    }

    async fn send_message(&self, channel_id: &str, message: &OutgoingMessage) -> Result<String> {
        self.check(Op::Send)?;
        self.record(Call::Send {
            channel: channel_id.to_string(),
            message: message.clone(),
        });
        Ok(self.mint("msg"))
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        _message: &OutgoingMessage,
    ) -> Result<()> {
        self.check(Op::Edit)?;
        self.record(Call::Edit {
            channel: channel_id.to_string(),
            message_id: message_id.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        self.record(Call::DeleteMessage {
            channel: channel_id.to_string(),
            message_id: message_id.to_string(),
        });
        Ok(())
    }

    async fn add_reaction(&self, channel_id: &str, message_id: &str, emoji: &str) -> Result<()> {
        self.record(Call::React {
            channel: channel_id.to_string(),
            message_id: message_id.to_string(),
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn recent_messages(&self, channel_id: &str, limit: usize) -> Result<Vec<HistoryMessage>> {
        self.check(Op::History)?;
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        Ok(history
            .get(channel_id)
            .map(|msgs| msgs.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn send_direct(&self, user_id: &str, message: &OutgoingMessage) -> Result<()> {
        self.check(Op::Direct)?;
        self.record(Call::Direct {
            user: user_id.to_string(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn user_profile(&self, user_id: &str) -> Result<PlatformUser> {
        self.check(Op::Profile)?;
        Ok(user(user_id))
    }

    async fn set_activity(&self, text: &str) -> Result<()> {
        self.record(Call::Activity(text.to_string()));
        Ok(())
    }
}

pub fn user(id: &str) -> PlatformUser {
    PlatformUser {
        id: id.to_string(),
        name: id.to_lowercase(),
        tag: format!("{id}#1234"),
        avatar_url: Some(format!("https://cdn.example/{id}.png")),
    }
}

/// A history message `secs` seconds after a fixed epoch.
pub fn history(id: &str, secs: i64, author: &str, content: &str) -> HistoryMessage {
    HistoryMessage {
        id: id.to_string(),
        author: author.to_string(),
        content: content.to_string(),
        created_at: Utc
            .timestamp_opt(1_700_000_000 + secs, 0)
            .single()
            .expect("valid timestamp"),
        card_title: None,
    }
}

pub fn settings(transcript_dir: &Path) -> DeskSettings {
    DeskSettings {
        ticket_category: Some("cat-1".into()),
        panel_channel: Some("panel".into()),
        leaderboard_channel: Some("board".into()),
        feedback_channel: Some("reviews".into()),
        transcript_log_channel: Some("archive".into()),
        transcript_dir: transcript_dir.to_path_buf(),
        grace_delay: Duration::from_millis(50),
        ..DeskSettings::default()
    }
}

pub struct Harness {
    pub platform: Arc<MockPlatform>,
    pub store: Arc<InMemoryStore>,
    pub desk: Arc<TicketDesk>,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(staff: &[(&str, Presence)]) -> Self {
        Self::with_store(staff, InMemoryStore::new())
    }

    pub fn with_store(staff: &[(&str, Presence)], store: InMemoryStore) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let platform = MockPlatform::with_staff(staff);
        let store = Arc::new(store);
        let desk = Arc::new(TicketDesk::new(
            platform.clone(),
            store.clone(),
            settings(dir.path()),
        ));
        Self {
            platform,
            store,
            desk,
            dir,
        }
    }

    /// Open a ticket and return its channel id.
    pub async fn open(&self, requester: &str) -> String {
        match self.desk.create_ticket(&user(requester)).await {
            helpdesk_tickets::CreateOutcome::Created { channel_id, .. } => channel_id,
            other => panic!("expected a ticket, got {other:?}"),
        }
    }
}

/// Long enough for a 50ms grace delay to elapse.
pub async fn wait_past_grace() {
    tokio::time::sleep(Duration::from_millis(250)).await;
}
