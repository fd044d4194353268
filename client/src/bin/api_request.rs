//! Send one request through the client and print the response.
//!
//! Usage: `api-request GET /products --param limit=5 --config api-client.yaml`

#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]
#![allow(clippy::print_stdout)]

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use generic_api_client::config::ClientConfig;
use generic_api_client::{BearerAuth, Client, Middleware, TraceRequests};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

/// Send a JSON or form request and print the status and body.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// HTTP method, e.g. GET or POST.
    method: String,

    /// Absolute URL, or a path appended to the configured base URL.
    url: String,

    /// Request parameter as `key=value`. Repeatable.
    #[arg(short, long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Send parameters form-encoded instead of as JSON.
    #[arg(long)]
    form: bool,

    /// Bearer token for the `Authorization` header.
    #[arg(long, env = "API_CLIENT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// YAML configuration file.
    #[arg(long, default_value = "api-client.yaml")]
    config: String,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load and validate configuration first (fail-fast)
    let config = ClientConfig::load_from(&cli.config).map_err(|e| anyhow!("{e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.level)
                .with_context(|| format!("invalid log level '{}'", config.logging.level))?,
        )
        .init();

    let method = Method::from_bytes(cli.method.to_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{}'", cli.method))?;

    let mut middleware: Vec<Arc<dyn Middleware>> = Vec::new();
    if let Some(token) = &cli.token {
        middleware.push(Arc::new(BearerAuth::new(token)?));
    }
    middleware.push(Arc::new(TraceRequests));
    let client = Client::from_config(&config)?.with_added_middleware(middleware);

    let params: Map<String, Value> = cli
        .params
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();

    let response = if cli.form {
        client.form(method, &cli.url, &params).await?
    } else {
        client.json(method, &cli.url, &params).await?
    };

    println!("{} {}", response.status().as_u16(), response.reason());
    match response.json() {
        Some(json) => println!("{}", serde_json::to_string_pretty(json)?),
        None => println!("{}", response.text()),
    }

    Ok(())
}
