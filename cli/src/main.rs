//! `lexis-admin`: call the Lexis admin API from the shell.
//!
//! The session lives in a JSON file (see `--session-file`) so that a token
//! refreshed by one invocation is used by the next.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lexis_admin_client::{
    AdminClient, ApiRequest, ApiResponse, ClientConfig, FileCredentialStore, describe_metrics,
};
use lexis_admin_core::{CredentialStore, Session};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "lexis-admin")]
#[command(about = "Lexis admin API client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Session file path
    #[arg(
        long,
        global = true,
        env = "LEXIS_SESSION_FILE",
        default_value = ".lexis-admin/session.json"
    )]
    session_file: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a session obtained from sign-in
    Login {
        /// Access token
        #[arg(long)]
        access_token: String,

        /// Refresh token
        #[arg(long)]
        refresh_token: String,
    },
    /// Remove the saved session
    Logout,
    /// GET an endpoint
    Get {
        /// Path under the API prefix
        path: String,
    },
    /// DELETE an endpoint
    Delete {
        /// Path under the API prefix
        path: String,
    },
    /// POST a JSON body
    Post {
        /// Path under the API prefix
        path: String,

        /// JSON request body
        #[arg(long)]
        data: String,
    },
    /// PUT a JSON body
    Put {
        /// Path under the API prefix
        path: String,

        /// JSON request body
        #[arg(long)]
        data: String,
    },
    /// PATCH a JSON body
    Patch {
        /// Path under the API prefix
        path: String,

        /// JSON request body
        #[arg(long)]
        data: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let store = FileCredentialStore::open(&cli.session_file);

    let request = match cli.command {
        Commands::Login {
            access_token,
            refresh_token,
        } => {
            store.update_session(Session::new(access_token, refresh_token)?);
            tracing::info!(path = %store.path().display(), "session saved");
            return Ok(());
        }
        Commands::Logout => {
            store.clear_session();
            tracing::info!(path = %store.path().display(), "session removed");
            return Ok(());
        }
        Commands::Get { path } => ApiRequest::get(path),
        Commands::Delete { path } => ApiRequest::delete(path),
        Commands::Post { path, data } => ApiRequest::post(path).json(&parse_body(&data)?)?,
        Commands::Put { path, data } => ApiRequest::put(path).json(&parse_body(&data)?)?,
        Commands::Patch { path, data } => ApiRequest::patch(path).json(&parse_body(&data)?)?,
    };

    let config = ClientConfig::from_env().context("failed to load client configuration")?;
    describe_metrics();

    let client = AdminClient::new(config, store)?;
    let method = request.method().clone();
    let path = request.path().to_string();

    let response = client
        .send(request)
        .await
        .with_context(|| format!("{method} {path} failed"))?;

    if let Some(output) = render(&response)? {
        println!("{output}");
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "lexis_admin_cli=debug,lexis_admin_client=debug"
    } else {
        "lexis_admin_cli=info,lexis_admin_client=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn parse_body(data: &str) -> Result<Value> {
    serde_json::from_str(data).context("--data must be valid JSON")
}

/// Envelope `data` as pretty JSON; raw text if the body is not an envelope.
fn render(response: &ApiResponse) -> Result<Option<String>> {
    if response.bytes().is_empty() {
        return Ok(None);
    }

    match response.envelope::<Value>() {
        Ok(envelope) => Ok(Some(serde_json::to_string_pretty(&envelope.data)?)),
        Err(_) => Ok(Some(response.text())),
    }
}
