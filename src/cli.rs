//! CLI argument surface.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "miniapps-user",
    about = "Fetch and watch miniapps user profiles",
    version
)]
pub struct Cli {
    /// Bearer token used to authenticate requests.
    #[arg(
        long,
        short = 't',
        env = "MINIAPPS_USER_TOKEN",
        hide_env_values = true
    )]
    pub token: String,

    /// API endpoint override.
    #[arg(long, env = "MINIAPPS_USER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Per-request timeout in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Extra header in `name: value` form; repeatable. Overrides the
    /// default headers on name collision.
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch a profile once and print it as JSON.
    Fetch {
        /// User id to fetch.
        user_id: String,
    },
    /// Keep a profile subscription alive and print every update.
    Watch {
        /// User id to watch.
        user_id: String,
        /// Auto-refetch cadence in milliseconds.
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `name: value`, got {raw:?}"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}
