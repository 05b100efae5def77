//! Command line companion for the miniapps user SDK.
//!
//! Thin binary entry point: argument parsing lives in `cli`, the actual
//! work in the `miniapps-user-client` and `miniapps-user-watch` crates.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use miniapps_user_client::{Client, ClientConfig, RequestOptions};
use miniapps_user_watch::{watch_user_profile, WatchOptions};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing();

    let mut config = ClientConfig::new(args.token.clone());
    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    let client = Client::new(config).context("failed to construct the profile client")?;

    let mut request = RequestOptions::default()
        .with_timeout(Duration::from_millis(args.timeout_ms));
    for (name, value) in &args.headers {
        request = request.with_header(name.clone(), value.clone());
    }

    match args.command {
        Commands::Fetch { user_id } => fetch_once(&client, &user_id, request).await,
        Commands::Watch {
            user_id,
            interval_ms,
        } => {
            let options = WatchOptions {
                enabled: true,
                refetch_interval: interval_ms.map(Duration::from_millis),
                request,
            };
            watch_until_interrupted(client, user_id, options).await
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn fetch_once(client: &Client, user_id: &str, request: RequestOptions) -> Result<()> {
    let response = client
        .fetch_user_profile(user_id, request)
        .await
        .map_err(|err| anyhow::anyhow!("profile fetch failed: {err}"))?;

    if let Some(message) = &response.message {
        info!(%message, "server message");
    }
    println!("{}", serde_json::to_string_pretty(&response.profile)?);
    Ok(())
}

async fn watch_until_interrupted(
    client: Client,
    user_id: String,
    options: WatchOptions,
) -> Result<()> {
    let watch = watch_user_profile(Arc::new(client), user_id, options, |state| {
        if state.loading {
            info!("fetching profile");
        } else if let Some(error) = &state.error {
            warn!(%error, "profile fetch failed");
        } else if let Some(profile) = &state.data {
            match serde_json::to_string(profile) {
                Ok(json) => println!("{json}"),
                Err(err) => warn!(%err, "profile is not serializable"),
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    drop(watch);
    Ok(())
}
