pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;

#[derive(Parser)]
#[command(name = "edcctl")]
#[command(about = "edcctl - Command-line client for the EDC Console API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "EDC_API_URL",
        default_value = "http://localhost:5000",
        help = "Console API base URL"
    )]
    pub server: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and credential management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Connector registrations")]
    Connector {
        #[command(subcommand)]
        cmd: commands::connector::ConnectorCommands,
    },

    #[command(about = "Dataspace settings")]
    Settings {
        #[command(subcommand)]
        cmd: commands::settings::SettingsCommands,
    },

    #[command(about = "Show dashboard statistics")]
    Stats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Per-invocation settings shared by all commands
pub struct CliContext {
    pub server: String,
    pub output_format: OutputFormat,
}

impl CliContext {
    /// Client bound to whichever credential store currently holds a login
    pub fn client(&self) -> anyhow::Result<ApiClient> {
        Ok(ApiClient::new(&self.server, config::active_store()?)?)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = CliContext {
        output_format: OutputFormat::from_cli(&cli),
        server: cli.server,
    };

    let result = match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &ctx).await,
        Commands::Connector { cmd } => commands::connector::handle(cmd, &ctx).await,
        Commands::Settings { cmd } => commands::settings::handle(cmd, &ctx).await,
        Commands::Stats => commands::stats::handle(&ctx).await,
    };

    result.map_err(|e| {
        let reauth = e
            .downcast_ref::<crate::client::ClientError>()
            .filter(|client_error| client_error.is_reauthentication_required())
            .map(|client_error| client_error.to_string());
        match reauth {
            Some(reason) => anyhow::anyhow!("{}. Run 'edcctl auth login' to sign in again", reason),
            None => e,
        }
    })
}
