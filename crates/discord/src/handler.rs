//! Discord event handler for serenity.
//!
//! Maps gateway events onto [`TicketDesk`] operations. The desk is built on
//! the first `ready` event, once an HTTP client and cache exist.

use std::sync::{Arc, OnceLock};

use {
    helpdesk_tickets::{
        CloseOutcome, DeskSettings, TicketDesk, TicketStore,
        messages::{
            CLOSE_TICKET, COMMENTS_FIELD, FEEDBACK_FAILED, FEEDBACK_FORM, FEEDBACK_THANKS,
            PROVIDE_FEEDBACK, RATING_FIELD, SKIP_ACK, SKIP_FEEDBACK,
        },
    },
    serenity::{
        all::{
            ActionRow, ActionRowComponent, ComponentInteraction, Context, CreateActionRow,
            CreateInputText, CreateInteractionResponse, CreateInteractionResponseFollowup,
            CreateInteractionResponseMessage, CreateModal, EventHandler, GatewayIntents,
            GuildChannel, GuildId, InputTextStyle, Interaction, Message, ModalInteraction,
            Reaction, ReactionType, Ready, RoleId,
        },
        async_trait,
    },
    tracing::{debug, info, warn},
};

use crate::platform::{DiscordPlatform, platform_user};

const FEEDBACK_TITLE: &str = "Ticket Feedback";
const RATING_LABEL: &str = "Rate your experience (1-5)";
const COMMENTS_LABEL: &str = "Additional comments (optional)";
const ALREADY_CLOSED: &str = "This ticket is already closed.";

/// Handler for Discord gateway events.
pub struct TicketHandler {
    guild_id: GuildId,
    staff_role: Option<RoleId>,
    settings: DeskSettings,
    store: Arc<dyn TicketStore>,
    desk: OnceLock<Arc<TicketDesk>>,
}

impl TicketHandler {
    pub fn new(
        guild_id: GuildId,
        staff_role: Option<RoleId>,
        settings: DeskSettings,
        store: Arc<dyn TicketStore>,
    ) -> Self {
        Self {
            guild_id,
            staff_role,
            settings,
            store,
            desk: OnceLock::new(),
        }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::GUILD_PRESENCES
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
            | GatewayIntents::MESSAGE_CONTENT
    }

    fn desk(&self) -> Option<&Arc<TicketDesk>> {
        let desk = self.desk.get();
        if desk.is_none() {
            debug!("event received before the desk was ready");
        }
        desk
    }

    fn is_panel_reaction(&self, reaction: &Reaction) -> bool {
        let in_panel = self
            .settings
            .panel_channel
            .as_deref()
            .is_some_and(|panel| panel == reaction.channel_id.to_string());
        in_panel
            && reaction.guild_id == Some(self.guild_id)
            && match &reaction.emoji {
                ReactionType::Unicode(emoji) => same_emoji(emoji, &self.settings.panel_emoji),
                _ => false,
            }
    }

    async fn on_button(&self, ctx: &Context, desk: &TicketDesk, button: ComponentInteraction) {
        let channel_id = button.channel_id.to_string();
        let actor_id = button.user.id.to_string();

        match button.data.custom_id.as_str() {
            CLOSE_TICKET => {
                acknowledge(ctx, &button).await;
                if desk.close_ticket(&channel_id).await == CloseOutcome::UnknownTicket {
                    followup(ctx, &button, ALREADY_CLOSED).await;
                }
            },
            PROVIDE_FEEDBACK => {
                let form = CreateInteractionResponse::Modal(feedback_form());
                if let Err(e) = button.create_response(&ctx.http, form).await {
                    warn!(channel_id, error = %e, "failed to open feedback form");
                }
            },
            SKIP_FEEDBACK => {
                let reply = CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content(SKIP_ACK)
                        .ephemeral(true),
                );
                if let Err(e) = button.create_response(&ctx.http, reply).await {
                    warn!(channel_id, error = %e, "failed to acknowledge skip");
                }
                desk.skip_feedback(&channel_id, &actor_id).await;
            },
            other => debug!(custom_id = other, "ignoring unknown button"),
        }
    }

    async fn on_feedback_form(&self, ctx: &Context, desk: &TicketDesk, form: ModalInteraction) {
        if form.data.custom_id != FEEDBACK_FORM {
            debug!(custom_id = %form.data.custom_id, "ignoring unknown form");
            return;
        }
        let channel_id = form.channel_id.to_string();
        let submitter_id = form.user.id.to_string();
        let rating = form_value(&form.data.components, RATING_FIELD).unwrap_or_default();
        let comment = form_value(&form.data.components, COMMENTS_FIELD);

        if let Err(e) = form.defer_ephemeral(&ctx.http).await {
            warn!(channel_id, error = %e, "failed to defer feedback response");
        }

        let notice = match desk
            .submit_feedback(&channel_id, &submitter_id, &rating, comment.as_deref())
            .await
        {
            Ok(_) => FEEDBACK_THANKS,
            Err(e) => {
                warn!(channel_id, error = %e, "failed to record feedback");
                FEEDBACK_FAILED
            },
        };
        let reply = CreateInteractionResponseFollowup::new()
            .content(notice)
            .ephemeral(true);
        if let Err(e) = form.create_followup(&ctx.http, reply).await {
            warn!(channel_id, error = %e, "failed to send feedback notice");
        }
    }
}

#[async_trait]
impl EventHandler for TicketHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
        if self.desk.get().is_some() {
            debug!("gateway session resumed, keeping existing desk");
            return;
        }

        let platform = Arc::new(DiscordPlatform::new(&ctx, self.guild_id, self.staff_role));
        let desk = Arc::new(TicketDesk::new(
            platform,
            Arc::clone(&self.store),
            self.settings.clone(),
        ));
        if self.desk.set(Arc::clone(&desk)).is_err() {
            return;
        }
        desk.start().await;
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        if !self.is_panel_reaction(&reaction) {
            return;
        }
        let Some(desk) = self.desk() else {
            return;
        };
        let user = match reaction.user(&ctx.http).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "could not resolve reacting user");
                return;
            },
        };
        if user.bot {
            return;
        }

        desk.create_ticket(&platform_user(&user)).await;

        if let Err(e) = reaction.delete(&ctx.http).await {
            warn!(user_id = %user.id, error = %e, "failed to remove panel reaction");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Some(desk) = self.desk() else {
            return;
        };
        match interaction {
            Interaction::Component(button) => self.on_button(&ctx, desk, button).await,
            Interaction::Modal(form) => self.on_feedback_form(&ctx, desk, form).await,
            _ => {},
        }
    }

    async fn channel_delete(
        &self,
        _ctx: Context,
        channel: GuildChannel,
        _messages: Option<Vec<Message>>,
    ) {
        if let Some(desk) = self.desk()
            && desk.space_removed(&channel.id.to_string()).await
        {
            info!(channel_id = %channel.id, "ticket channel removed externally");
        }
    }
}

fn feedback_form() -> CreateModal {
    let rating = CreateInputText::new(InputTextStyle::Short, RATING_LABEL, RATING_FIELD)
        .placeholder("5")
        .required(true);
    let comments =
        CreateInputText::new(InputTextStyle::Paragraph, COMMENTS_LABEL, COMMENTS_FIELD)
            .required(false);
    CreateModal::new(FEEDBACK_FORM, FEEDBACK_TITLE).components(vec![
        CreateActionRow::InputText(rating),
        CreateActionRow::InputText(comments),
    ])
}

fn form_value(rows: &[ActionRow], field: &str) -> Option<String> {
    rows.iter()
        .flat_map(|row| &row.components)
        .find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == field => {
                input.value.clone()
            },
            _ => None,
        })
}

/// Compare emoji ignoring the variation selector clients may drop.
fn same_emoji(a: &str, b: &str) -> bool {
    let strip = |s: &str| s.chars().filter(|c| *c != '\u{FE0F}').collect::<String>();
    strip(a) == strip(b)
}

async fn acknowledge(ctx: &Context, button: &ComponentInteraction) {
    if let Err(e) = button
        .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
        .await
    {
        warn!(channel_id = %button.channel_id, error = %e, "failed to acknowledge button");
    }
}

async fn followup(ctx: &Context, button: &ComponentInteraction, text: &str) {
    let reply = CreateInteractionResponseFollowup::new()
        .content(text)
        .ephemeral(true);
    if let Err(e) = button.create_followup(&ctx.http, reply).await {
        warn!(channel_id = %button.channel_id, error = %e, "failed to send followup");
    }
}
