use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::*;
use crate::cli::CliContext;
use crate::store::{ConnectorPatch, ConnectorStatus, NewConnector};

#[derive(Subcommand)]
pub enum ConnectorCommands {
    #[command(about = "List registered connectors")]
    List,

    #[command(about = "Show one connector")]
    Get {
        #[arg(help = "Connector ID")]
        id: Uuid,
    },

    #[command(about = "Register a connector")]
    Create {
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Connector version, e.g. 0.6.0")]
        version: String,
        #[arg(long, help = "Business partner number")]
        bpn: String,
        #[arg(long, help = "Management endpoint URL")]
        endpoint: String,
    },

    #[command(about = "Change connector fields")]
    Update {
        #[arg(help = "Connector ID")]
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        bpn: Option<String>,
        #[arg(long)]
        endpoint: Option<String>,
    },

    #[command(about = "Delete a connector")]
    Delete {
        #[arg(help = "Connector ID")]
        id: Uuid,
    },

    #[command(about = "Set connector status (connected, disconnected, error)")]
    Status {
        #[arg(help = "Connector ID")]
        id: Uuid,
        #[arg(help = "New status")]
        status: ConnectorStatus,
    },
}

pub async fn handle(cmd: ConnectorCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let output_format = &ctx.output_format;
    let client = ctx.client()?;

    match cmd {
        ConnectorCommands::List => {
            let connectors = client.list_connectors().await?;
            output_connectors(output_format, &connectors)
        }
        ConnectorCommands::Get { id } => {
            let connector = client.get_connector(id).await?;
            output_record(output_format, &connector)
        }
        ConnectorCommands::Create { name, version, bpn, endpoint } => {
            let connector = client
                .create_connector(&NewConnector { name, version, bpn, endpoint })
                .await?;
            output_success(
                output_format,
                &format!("Connector '{}' created with id {}", connector.name, connector.id),
                Some(json!({ "connector": connector })),
            )
        }
        ConnectorCommands::Update { id, name, version, bpn, endpoint } => {
            let patch = ConnectorPatch { name, version, bpn, endpoint };
            if patch.name.is_none() && patch.version.is_none() && patch.bpn.is_none() && patch.endpoint.is_none() {
                anyhow::bail!("nothing to update; pass at least one of --name, --version, --bpn, --endpoint");
            }

            let connector = client.update_connector(id, &patch).await?;
            output_success(
                output_format,
                &format!("Connector '{}' updated", connector.name),
                Some(json!({ "connector": connector })),
            )
        }
        ConnectorCommands::Delete { id } => {
            client.delete_connector(id).await?;
            output_success(output_format, &format!("Connector {} deleted", id), Some(json!({ "id": id })))
        }
        ConnectorCommands::Status { id, status } => {
            let connector = client.set_connector_status(id, status).await?;
            output_success(
                output_format,
                &format!("Connector '{}' is now {:?}", connector.name, connector.status),
                Some(json!({ "connector": connector })),
            )
        }
    }
}
