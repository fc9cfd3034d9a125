//! Roster CLI
//!
//! Command-line interface for Roster - local-first user directory management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use roster_core::{Config, SyncEngine};

mod avatar;
mod commands;
mod editor;
mod output;

use commands::user::UserFields;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Roster - Local-first user directory management")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a config file (overrides the default location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List users
    #[command(alias = "ls")]
    List {
        /// Filter by name, username or email
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show a single user
    Show {
        /// User ID
        id: u64,
    },
    /// Create a new user
    #[command(alias = "add")]
    Create {
        #[command(flatten)]
        fields: UserFields,
    },
    /// Edit a user
    Edit {
        /// User ID
        id: u64,
        #[command(flatten)]
        fields: UserFields,
    },
    /// Delete a user
    #[command(alias = "rm")]
    Delete {
        /// User ID
        id: u64,
    },
    /// Manage user avatars
    Avatar {
        #[command(subcommand)]
        command: AvatarCommands,
    },
    /// Re-fetch the user list from the remote
    Refresh,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show cache status
    Status,
}

#[derive(Subcommand)]
enum AvatarCommands {
    /// Set a user's avatar from an image file
    Set {
        /// User ID
        id: u64,
        /// Path to the image file
        file: PathBuf,
    },
    /// Remove a user's avatar
    #[command(alias = "rm")]
    Remove {
        /// User ID
        id: u64,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, api_base_url, request_timeout_secs)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    init_logging();

    // Config commands don't need the engine
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())?;

    // Status only reads the stores, no remote involved
    if matches!(&cli.command, Commands::Status) {
        return commands::status::show(&config, &output);
    }

    let mut engine = SyncEngine::open(&config)?;

    match cli.command {
        Commands::List { search } => commands::user::list(&mut engine, search, &output).await,
        Commands::Show { id } => commands::user::show(&mut engine, id, &output).await,
        Commands::Create { fields } => commands::user::create(&mut engine, fields, &output).await,
        Commands::Edit { id, fields } => {
            commands::user::edit(&mut engine, id, fields, &output).await
        }
        Commands::Delete { id } => commands::user::delete(&mut engine, id, &output).await,
        Commands::Avatar { command } => match command {
            AvatarCommands::Set { id, file } => {
                commands::avatar::set(&mut engine, id, &file, &output).await
            }
            AvatarCommands::Remove { id } => {
                commands::avatar::remove(&mut engine, id, &output).await
            }
        },
        Commands::Refresh => commands::user::refresh(&mut engine, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Status => unreachable!(),        // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Log to stderr; RUST_LOG overrides the default level
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("roster_core=warn,roster_cli=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
