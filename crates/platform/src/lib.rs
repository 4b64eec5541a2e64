//! Capability contract between the ticket engine and a chat platform.
//!
//! The engine only ever talks to a [`SupportPlatform`]; the Discord crate
//! implements it with serenity and tests implement it in memory.

pub mod error;
pub mod message;
pub mod platform;

pub use {
    error::{Error, Result},
    message::{Card, CardField, Control, ControlStyle, HistoryMessage, OutgoingMessage},
    platform::{PlatformUser, Presence, StaffMember, SupportPlatform},
};
