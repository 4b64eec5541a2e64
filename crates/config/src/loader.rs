use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::HelpdeskConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "helpdesk.toml",
    "helpdesk.yaml",
    "helpdesk.yml",
    "helpdesk.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<HelpdeskConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Resolve the effective configuration.
///
/// An explicit path must load; discovered files fall back to defaults on
/// parse errors. Environment overrides are applied last in both cases.
pub fn discover_and_load(explicit: Option<&Path>) -> Result<HelpdeskConfig> {
    let mut config = match explicit {
        Some(path) => load_config(path)?,
        None => match find_config_file() {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                load_config(&path).unwrap_or_else(|e| {
                    warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                    HelpdeskConfig::default()
                })
            },
            None => {
                debug!("no config file found, using defaults");
                HelpdeskConfig::default()
            },
        },
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Overlay the bot's environment variables onto `config`.
pub fn apply_env_overrides(config: &mut HelpdeskConfig) {
    apply_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_overrides_with(config: &mut HelpdeskConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(token) = get("DISCORD_TOKEN") {
        config.discord.token = Secret::new(token);
    }
    let ids: [(&str, &mut Option<String>); 7] = [
        ("GUILD_ID", &mut config.discord.guild_id),
        ("STAFF_ROLE_ID", &mut config.discord.staff_role_id),
        ("TICKET_CATEGORY_ID", &mut config.surfaces.ticket_category_id),
        ("PANEL_CHANNEL_ID", &mut config.surfaces.panel_channel_id),
        ("LEADERBOARD_CHANNEL_ID", &mut config.surfaces.leaderboard_channel_id),
        ("FEEDBACK_CHANNEL_ID", &mut config.surfaces.feedback_channel_id),
        ("TRANSCRIPT_LOG_CHANNEL_ID", &mut config.surfaces.transcript_log_channel_id),
    ];
    for (name, slot) in ids {
        if let Some(value) = get(name) {
            *slot = Some(value);
        }
    }
    if let Some(dir) = get("HELPDESK_DATA_DIR") {
        config.storage.data_dir = PathBuf::from(dir);
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/helpdesk/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "helpdesk").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<HelpdeskConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, "TOML", e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, "YAML", e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, "JSON", e)),
        _ => Err(Error::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: ext.to_owned(),
        }),
    }
}
