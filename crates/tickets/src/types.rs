use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Open tickets keyed by the ticket channel id.
pub type Assignments = BTreeMap<String, TicketAssignment>;

/// Cumulative tickets ever assigned, keyed by staff id.
///
/// Ordered by id so every iteration (and therefore every tie-break) is
/// deterministic.
pub type StaffLoad = BTreeMap<String, u64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Closing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketAssignment {
    pub user_id: String,
    pub staff_id: String,
    pub status: TicketStatus,
}

impl TicketAssignment {
    #[must_use]
    pub fn open(user_id: impl Into<String>, staff_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            staff_id: staff_id.into(),
            status: TicketStatus::Open,
        }
    }
}

/// One submitted rating. Appended to the feedback log, never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub ticket_id: String,
    pub user_id: String,
    /// Stored as entered; range is not enforced.
    #[serde(deserialize_with = "string_or_number")]
    pub rating: String,
    pub comment: String,
}

/// Everything the store hands back at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub assignments: Assignments,
    pub staff_load: StaffLoad,
    pub panel_message_id: Option<String>,
    pub leaderboard_message_id: Option<String>,
}

/// Fold `newer` into `stored`, keeping the higher count per staff member.
///
/// Load only ever grows, so a write carrying an older snapshot can never
/// lower a count that was persisted in the meantime.
pub fn merge_load(stored: &mut StaffLoad, newer: &StaffLoad) {
    for (staff_id, count) in newer {
        let entry = stored.entry(staff_id.clone()).or_insert(0);
        *entry = (*entry).max(*count);
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
