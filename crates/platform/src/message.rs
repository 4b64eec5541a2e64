use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// A message the engine wants shown on the platform. Adapters decide how a
/// card or control looks; the engine only decides what it says.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub card: Option<Card>,
    pub controls: Vec<Control>,
    /// Local file uploaded alongside the message.
    pub attachment: Option<PathBuf>,
}

impl OutgoingMessage {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn card(card: Card) -> Self {
        Self {
            card: Some(card),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn with_control(mut self, control: Control) -> Self {
        self.controls.push(control);
        self
    }

    #[must_use]
    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachment = Some(path.into());
        self
    }
}

/// Rich block rendered as an embed on Discord.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub description: String,
    pub colour: u32,
    pub fields: Vec<CardField>,
    pub footer: Option<String>,
    pub footer_icon: Option<String>,
    pub thumbnail: Option<String>,
    /// Stamp the card with the send time.
    pub timestamped: bool,
}

impl Card {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>, colour: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            colour,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(CardField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Interactive button. `id` comes back in the click event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub id: String,
    pub label: String,
    pub style: ControlStyle,
}

impl Control {
    #[must_use]
    pub fn primary(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            style: ControlStyle::Primary,
        }
    }

    #[must_use]
    pub fn secondary(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            style: ControlStyle::Secondary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStyle {
    Primary,
    Secondary,
}

/// One message read back from a channel's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub id: String,
    /// Display tag of the author (e.g. `name#0001` or `name`).
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Title of the first card attached to the message, if any.
    pub card_title: Option<String>,
}
