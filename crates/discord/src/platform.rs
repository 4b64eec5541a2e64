use std::sync::Arc;

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    helpdesk_platform::{
        Error, HistoryMessage, OutgoingMessage, PlatformUser, Presence, Result, StaffMember,
        SupportPlatform,
    },
    serenity::all::{
        ActivityData, Cache, ChannelType, Context, CreateChannel, GetMessages, GuildId, Http,
        Member, Message, OnlineStatus, PermissionOverwrite, PermissionOverwriteType,
        Permissions, ReactionType, RoleId, ShardMessenger, Timestamp, User, UserId,
    },
    tracing::debug,
};

use crate::{ids, render};

/// Discord REST calls are capped at 100 messages per page.
const MAX_HISTORY: usize = 100;
const MEMBER_PAGE: usize = 1000;

/// [`SupportPlatform`] over serenity, bound to one guild.
#[derive(Clone)]
pub struct DiscordPlatform {
    http: Arc<Http>,
    cache: Arc<Cache>,
    shard: ShardMessenger,
    guild_id: GuildId,
    staff_role: Option<RoleId>,
}

impl DiscordPlatform {
    pub fn new(ctx: &Context, guild_id: GuildId, staff_role: Option<RoleId>) -> Self {
        Self {
            http: Arc::clone(&ctx.http),
            cache: Arc::clone(&ctx.cache),
            shard: ctx.shard.clone(),
            guild_id,
            staff_role,
        }
    }

    fn presence_of(&self, user: &User) -> Presence {
        self.cache
            .guild(self.guild_id)
            .and_then(|guild| guild.presences.get(&user.id).map(|p| p.status))
            .map_or(Presence::Offline, presence)
    }
}

fn presence(status: OnlineStatus) -> Presence {
    match status {
        OnlineStatus::Online => Presence::Online,
        OnlineStatus::Idle => Presence::Idle,
        OnlineStatus::DoNotDisturb => Presence::DoNotDisturb,
        _ => Presence::Offline,
    }
}

pub(crate) fn platform_user(user: &User) -> PlatformUser {
    PlatformUser {
        id: user.id.to_string(),
        name: user.name.clone(),
        tag: user.tag(),
        avatar_url: Some(user.face()),
    }
}

/// Millisecond-precise message time, so messages sent within the same second
/// still sort chronologically.
fn message_time(timestamp: &Timestamp) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&timestamp.to_string())
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| DateTime::from_timestamp(timestamp.unix_timestamp(), 0))
        .unwrap_or_default()
}

fn history_message(message: &Message) -> HistoryMessage {
    HistoryMessage {
        id: message.id.to_string(),
        author: message.author.tag(),
        content: message.content.clone(),
        created_at: message_time(&message.timestamp),
        card_title: message.embeds.first().and_then(|e| e.title.clone()),
    }
}

/// Map a serenity failure, keeping "it was deleted" apart from other errors.
fn request_error(action: &str, e: serenity::Error) -> Error {
    let not_found = match &e {
        serenity::Error::Http(http) => http.status_code().is_some_and(|s| s.as_u16() == 404),
        _ => false,
    };
    if not_found {
        Error::gone(action)
    } else {
        Error::request(action, e)
    }
}

/// Walk a cursor-paged listing until a short page comes back.
async fn fetch_all<T, K, F, Fut>(
    page_size: usize,
    cursor: impl Fn(&T) -> K,
    mut fetch: F,
) -> Result<Vec<T>>
where
    F: FnMut(Option<K>) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut all = Vec::new();
    let mut after = None;
    loop {
        let page = fetch(after.take()).await?;
        let done = page.len() < page_size;
        after = page.last().map(&cursor);
        all.extend(page);
        if done || after.is_none() {
            return Ok(all);
        }
    }
}

fn member_access(user: UserId) -> PermissionOverwrite {
    PermissionOverwrite {
        allow: Permissions::VIEW_CHANNEL
            | Permissions::SEND_MESSAGES
            | Permissions::READ_MESSAGE_HISTORY
            | Permissions::ATTACH_FILES,
        deny: Permissions::empty(),
        kind: PermissionOverwriteType::Member(user),
    }
}

#[async_trait]
impl SupportPlatform for DiscordPlatform {
    async fn staff_pool(&self) -> Result<Vec<StaffMember>> {
        let role = self.staff_role.ok_or(Error::NoStaffRole)?;
        let members = fetch_all(MEMBER_PAGE, |m: &Member| m.user.id, |after| async move {
            self.guild_id
                .members(&self.http, Some(MEMBER_PAGE as u64), after)
                .await
                .map_err(|e| request_error("list guild members", e))
        })
        .await?;

        let mut staff: Vec<StaffMember> = members
            .iter()
            .filter(|m| !m.user.bot && m.roles.contains(&role))
            .map(|m| StaffMember {
                id: m.user.id.to_string(),
                tag: m.user.tag(),
                presence: self.presence_of(&m.user),
            })
            .collect();
        staff.sort_by_key(|s| s.id.parse::<u64>().unwrap_or(u64::MAX));
        debug!(count = staff.len(), "staff pool fetched");
        Ok(staff)
    }

    async fn create_private_space(
        &self,
        name: &str,
        parent: Option<&str>,
        members: &[&str],
    ) -> Result<String> {
        let mut overwrites = vec![
            PermissionOverwrite {
                allow: Permissions::empty(),
                deny: Permissions::VIEW_CHANNEL,
                kind: PermissionOverwriteType::Role(self.guild_id.everyone_role()),
            },
            member_access(self.cache.current_user().id),
        ];
        for member in members {
            overwrites.push(member_access(ids::user(member)?));
        }

        let mut builder = CreateChannel::new(name)
            .kind(ChannelType::Text)
            .permissions(overwrites);
        if let Some(parent) = parent {
            builder = builder.category(ids::channel(parent)?);
        }
        let channel = self
            .guild_id
            .create_channel(&self.http, builder)
            .await
            .map_err(|e| request_error("create ticket channel", e))?;
        Ok(channel.id.to_string())
    }

    async fn revoke_send(&self, space_id: &str, user_id: &str) -> Result<()> {
        let overwrite = PermissionOverwrite {
            allow: Permissions::VIEW_CHANNEL | Permissions::READ_MESSAGE_HISTORY,
            deny: Permissions::SEND_MESSAGES,
            kind: PermissionOverwriteType::Member(ids::user(user_id)?),
        };
        ids::channel(space_id)?
            .create_permission(&self.http, overwrite)
            .await
            .map_err(|e| request_error("revoke send permission", e))
    }

    async fn delete_space(&self, space_id: &str) -> Result<()> {
        ids::channel(space_id)?
            .delete(&self.http)
            .await
            .map_err(|e| request_error("delete channel", e))?;
        Ok(())
    }

    async fn send_message(&self, channel_id: &str, message: &OutgoingMessage) -> Result<String> {
        let builder = render::create_message(message).await?;
        let sent = ids::channel(channel_id)?
            .send_message(&self.http, builder)
            .await
            .map_err(|e| request_error("send message", e))?;
        Ok(sent.id.to_string())
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        message: &OutgoingMessage,
    ) -> Result<()> {
        ids::channel(channel_id)?
            .edit_message(
                &self.http,
                ids::message(message_id)?,
                render::edit_message(message),
            )
            .await
            .map_err(|e| request_error("edit message", e))?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        ids::channel(channel_id)?
            .delete_message(&self.http, ids::message(message_id)?)
            .await
            .map_err(|e| request_error("delete message", e))
    }

    async fn add_reaction(&self, channel_id: &str, message_id: &str, emoji: &str) -> Result<()> {
        ids::channel(channel_id)?
            .create_reaction(
                &self.http,
                ids::message(message_id)?,
                ReactionType::Unicode(emoji.to_owned()),
            )
            .await
            .map_err(|e| request_error("add reaction", e))
    }

    async fn recent_messages(&self, channel_id: &str, limit: usize) -> Result<Vec<HistoryMessage>> {
        let limit = u8::try_from(limit.clamp(1, MAX_HISTORY)).unwrap_or(u8::MAX);
        let messages = ids::channel(channel_id)?
            .messages(&self.http, GetMessages::new().limit(limit))
            .await
            .map_err(|e| request_error("fetch channel history", e))?;
        Ok(messages.iter().map(history_message).collect())
    }

    async fn send_direct(&self, user_id: &str, message: &OutgoingMessage) -> Result<()> {
        let dm = ids::user(user_id)?
            .create_dm_channel(&self.http)
            .await
            .map_err(|e| request_error("open direct message channel", e))?;
        let builder = render::create_message(message).await?;
        dm.id
            .send_message(&self.http, builder)
            .await
            .map_err(|e| request_error("send direct message", e))?;
        Ok(())
    }

    async fn user_profile(&self, user_id: &str) -> Result<PlatformUser> {
        let user = ids::user(user_id)?
            .to_user(&self.http)
            .await
            .map_err(|e| request_error("fetch user", e))?;
        Ok(platform_user(&user))
    }

    async fn set_activity(&self, text: &str) -> Result<()> {
        self.shard.set_activity(Some(ActivityData::watching(text)));
        Ok(())
    }
}
