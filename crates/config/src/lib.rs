//! Configuration loading, validation, and env substitution.
//!
//! Config files: `helpdesk.toml`, `helpdesk.yaml`, or `helpdesk.json`
//! Searched in `./` then `~/.config/helpdesk/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in all
//! string values. The bot's historical environment variables
//! (`DISCORD_TOKEN`, `PANEL_CHANNEL_ID`, ...) override file values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{DiscordConfig, HelpdeskConfig, StorageConfig, SurfacesConfig, TicketsConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
