//! Discord front end for the ticket desk.
//!
//! [`platform::DiscordPlatform`] implements the engine's platform contract
//! over serenity's HTTP client and cache, and [`handler::TicketHandler`]
//! turns gateway events (panel reactions, buttons, the feedback form,
//! channel deletions) into desk operations.

pub mod bot;
pub mod handler;
pub mod ids;
pub mod platform;
pub mod render;

pub use {bot::run, handler::TicketHandler, platform::DiscordPlatform};
