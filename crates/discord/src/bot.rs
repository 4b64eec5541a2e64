use std::sync::Arc;

use {
    anyhow::Context as _,
    helpdesk_config::HelpdeskConfig,
    helpdesk_tickets::{DeskSettings, FileStore},
    secrecy::ExposeSecret,
    serenity::Client,
    tracing::info,
};

use crate::{handler::TicketHandler, ids};

/// Connect to the gateway and serve tickets until Ctrl-C.
pub async fn run(config: &HelpdeskConfig) -> anyhow::Result<()> {
    let guild_raw = config
        .discord
        .guild_id
        .as_deref()
        .context("discord.guild_id is not configured")?;
    let guild_id = ids::guild(guild_raw)?;
    let staff_role = config
        .discord
        .staff_role_id
        .as_deref()
        .map(ids::role)
        .transpose()?;

    let store = Arc::new(FileStore::new(&config.storage.data_dir));
    let handler = TicketHandler::new(
        guild_id,
        staff_role,
        DeskSettings::from_config(config),
        store,
    );

    let mut client = Client::builder(config.discord.token.expose_secret(), TicketHandler::intents())
        .event_handler(handler)
        .await
        .context("failed to build discord client")?;

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested, closing gateway connections");
            shard_manager.shutdown_all().await;
        }
    });

    info!(%guild_id, data_dir = %config.storage.data_dir.display(), "connecting to discord");
    client.start().await.context("discord client stopped with an error")?;
    Ok(())
}
