use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::CliContext;
use crate::store::SettingsInput;

#[derive(Subcommand)]
pub enum SettingsCommands {
    #[command(about = "Show dataspace settings")]
    Get,

    #[command(about = "Update dataspace settings; omitted values are kept")]
    Set {
        #[arg(long)]
        wallet_url: Option<String>,
        #[arg(long)]
        portal_url: Option<String>,
        #[arg(long)]
        central_idp_url: Option<String>,
    },
}

pub async fn handle(cmd: SettingsCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let output_format = &ctx.output_format;
    let client = ctx.client()?;

    match cmd {
        SettingsCommands::Get => {
            let settings = client.dataspace_settings().await?;
            output_record(output_format, &settings)
        }
        SettingsCommands::Set { wallet_url, portal_url, central_idp_url } => {
            // the server replaces all URLs, so start from what is there
            let current = client.dataspace_settings().await?;
            let input = SettingsInput {
                wallet_url: wallet_url.or(current.wallet_url),
                portal_url: portal_url.or(current.portal_url),
                central_idp_url: central_idp_url.or(current.central_idp_url),
            };

            let settings = client.update_dataspace_settings(&input).await?;
            output_success(output_format, "Dataspace settings saved", Some(json!({ "settings": settings })))
        }
    }
}
