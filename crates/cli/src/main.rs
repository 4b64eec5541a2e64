mod config_commands;
mod leaderboard_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    helpdesk_config::HelpdeskConfig,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "helpdesk", about = "Helpdesk: Discord support-ticket bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./helpdesk.toml and friends).
    #[arg(long, global = true, env = "HELPDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for ticket state (overrides config value).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and serve tickets (default when no subcommand is provided).
    Run,
    /// Validate the configuration and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the staff leaderboard from the local data directory.
    Leaderboard {
        /// Number of entries to show (defaults to the configured size).
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<HelpdeskConfig> {
    let mut config = helpdesk_config::discover_and_load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = load_config(&cli)?;

    match cli.command {
        None | Some(Commands::Run) => {
            info!(version = env!("CARGO_PKG_VERSION"), "helpdesk starting");
            let report = helpdesk_config::validate(&config);
            if report.has_errors() {
                config_commands::print(&report, cli.config.as_deref(), false);
                anyhow::bail!("configuration has errors, run `helpdesk check` for details");
            }
            helpdesk_discord::run(&config).await
        },
        Some(Commands::Check { verbose }) => {
            config_commands::check(&config, cli.config.as_deref(), verbose)
        },
        Some(Commands::Leaderboard { limit }) => {
            let limit = limit.unwrap_or(config.tickets.leaderboard_size);
            leaderboard_commands::print(&config, limit).await
        },
    }
}
