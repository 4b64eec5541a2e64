//! Engine messages to serenity builders.

use {
    helpdesk_platform::{Card, Control, ControlStyle, Error, OutgoingMessage, Result},
    serenity::all::{
        ButtonStyle, CreateActionRow, CreateAttachment, CreateButton, CreateEmbed,
        CreateEmbedFooter, CreateMessage, EditMessage, Timestamp,
    },
};

pub fn embed(card: &Card) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(&card.title)
        .description(&card.description)
        .colour(card.colour);
    for field in &card.fields {
        embed = embed.field(&field.name, &field.value, field.inline);
    }
    if let Some(text) = &card.footer {
        let mut footer = CreateEmbedFooter::new(text);
        if let Some(icon) = &card.footer_icon {
            footer = footer.icon_url(icon);
        }
        embed = embed.footer(footer);
    }
    if let Some(url) = &card.thumbnail {
        embed = embed.thumbnail(url);
    }
    if card.timestamped {
        embed = embed.timestamp(Timestamp::now());
    }
    embed
}

/// All controls on one row, in order.
pub fn components(controls: &[Control]) -> Vec<CreateActionRow> {
    if controls.is_empty() {
        return Vec::new();
    }
    let buttons = controls
        .iter()
        .map(|control| {
            let style = match control.style {
                ControlStyle::Primary => ButtonStyle::Primary,
                ControlStyle::Secondary => ButtonStyle::Secondary,
            };
            CreateButton::new(&control.id)
                .label(&control.label)
                .style(style)
        })
        .collect();
    vec![CreateActionRow::Buttons(buttons)]
}

/// Build a new message. Reads the attachment from disk, if there is one.
pub async fn create_message(message: &OutgoingMessage) -> Result<CreateMessage> {
    let mut builder = CreateMessage::new();
    if let Some(content) = &message.content {
        builder = builder.content(content);
    }
    if let Some(card) = &message.card {
        builder = builder.embed(embed(card));
    }
    if !message.controls.is_empty() {
        builder = builder.components(components(&message.controls));
    }
    if let Some(path) = &message.attachment {
        let file = CreateAttachment::path(path)
            .await
            .map_err(|e| Error::request(format!("read attachment {}", path.display()), e))?;
        builder = builder.add_file(file);
    }
    Ok(builder)
}

/// Replace content, card and controls of an existing message. Attachments
/// are never edited.
pub fn edit_message(message: &OutgoingMessage) -> EditMessage {
    let mut builder = EditMessage::new().components(components(&message.controls));
    if let Some(content) = &message.content {
        builder = builder.content(content);
    }
    if let Some(card) = &message.card {
        builder = builder.embed(embed(card));
    }
    builder
}
