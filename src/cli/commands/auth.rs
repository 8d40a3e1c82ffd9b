use std::io::{BufRead, Write};
use std::sync::Arc;

use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{active_store, login_store};
use crate::cli::utils::*;
use crate::cli::{CliContext, OutputFormat};
use crate::client::{ApiClient, MemoryCredentialStore};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login with username and password")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, env = "EDCCTL_PASSWORD", hide_env_values = true, help = "Password (will prompt if not provided)")]
        password: Option<String>,
        #[arg(long, help = "Keep the credential across sessions")]
        remember: bool,
    },

    #[command(about = "Print the identity-provider URL for a browser login")]
    Authorize,

    #[command(about = "Logout from server")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Refresh authentication token")]
    Refresh,

    #[command(about = "Show current user information")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let output_format = &ctx.output_format;

    match cmd {
        AuthCommands::Login { username, password, remember } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password(&username)?,
            };

            let client = ApiClient::new(&ctx.server, login_store(remember)?)?;
            let credential = client.login(&username, &password, remember).await?;

            output_success(
                output_format,
                &format!("Logged in as {}", credential.user.username),
                Some(json!({
                    "user": credential.user,
                    "expires_at": credential.expires_at,
                    "remembered": remember
                })),
            )
        }
        AuthCommands::Authorize => {
            // the credential comes back to the browser, not to this process
            let client = ApiClient::new(&ctx.server, Arc::new(MemoryCredentialStore::new()))?;
            let request = client.begin_authorization().await?;

            match output_format {
                OutputFormat::Json => output_record(output_format, &request),
                OutputFormat::Text => {
                    println!("Open this URL in a browser to sign in (valid for {}s):", request.expires_in);
                    println!("{}", request.authorization_url);
                    Ok(())
                }
            }
        }
        AuthCommands::Logout => {
            ctx.client()?.logout().await?;
            output_success(output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let store = active_store()?;
            let now = Utc::now();

            match store.load()? {
                None => output_success(output_format, "Not logged in", Some(json!({ "authenticated": false }))),
                Some(credential) => {
                    let state = if !credential.is_expired(now) {
                        "valid"
                    } else if credential.can_refresh(now) {
                        "expired (refreshable)"
                    } else {
                        "expired"
                    };
                    output_success(
                        output_format,
                        &format!(
                            "{} as {}, credential {} until {}",
                            if credential.is_expired(now) { "Was logged in" } else { "Logged in" },
                            credential.user.username,
                            state,
                            credential.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
                        ),
                        Some(json!({
                            "authenticated": !credential.is_expired(now),
                            "state": state,
                            "user": credential.user,
                            "expires_at": credential.expires_at,
                            "refresh_expires_at": credential.refresh_expires_at
                        })),
                    )
                }
            }
        }
        AuthCommands::Refresh => {
            let credential = ctx.client()?.refresh().await?;
            output_success(
                output_format,
                &format!("Credential refreshed, valid until {}", credential.expires_at.format("%Y-%m-%d %H:%M:%S UTC")),
                Some(json!({ "expires_at": credential.expires_at })),
            )
        }
        AuthCommands::Whoami => {
            let info = ctx.client()?.me().await?;
            output_record(output_format, &info.user)
        }
    }
}

/// Read a password from stdin. There is no terminal echo control here;
/// prefer EDCCTL_PASSWORD in scripts.
fn prompt_password(username: &str) -> anyhow::Result<String> {
    eprint!("Password for {}: ", username);
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("password is required");
    }
    Ok(password)
}
