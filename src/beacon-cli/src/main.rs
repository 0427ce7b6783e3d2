//! Beacon CLI — sends a single analytics event to a collector, for smoke
//! testing an endpoint and for scripting one-off events.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use beacon_core::tracker::{capture_errors, Tracker};
use beacon_core::{Properties, TrackerConfig};
use beacon_sdk::{AnalyticsClient, StaticEnvironment};

#[derive(Parser, Debug)]
#[command(name = "beacon")]
#[command(about = "Send a test analytics event to a collector")]
#[command(version)]
struct Cli {
    /// Service name stamped on the event (overrides config)
    #[arg(long, env = "BEACON__SERVICE_NAME")]
    service: Option<String>,

    /// Collector endpoint (overrides config)
    #[arg(long, env = "BEACON__ENDPOINT")]
    endpoint: Option<String>,

    /// Event type to send
    #[arg(long, default_value = "cli_test")]
    event: String,

    /// Route path reported with the event
    #[arg(long, default_value = "/")]
    path: String,

    /// Referrer reported with the event
    #[arg(long)]
    referrer: Option<String>,

    /// User-agent string reported with the event
    #[arg(long)]
    user_agent: Option<String>,

    /// Extra property as key=value; repeatable. Schema keys override,
    /// anything else is carried as metadata.
    #[arg(long = "prop", value_parser = parse_property)]
    properties: Vec<(String, serde_json::Value)>,
}

/// Parse `key=value`, keeping the value as JSON when it parses as JSON and
/// as a plain string otherwise.
fn parse_property(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beacon_cli=info,beacon_sdk=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Layered config first, CLI flags on top.
    let mut config = match TrackerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            let service = cli
                .service
                .clone()
                .with_context(|| format!("no usable configuration ({e}); pass --service"))?;
            TrackerConfig::new(service)
        }
    };
    if let Some(service) = cli.service {
        config.service_name = service;
    }
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    config.validate()?;

    info!(
        service = %config.service_name,
        endpoint = %config.endpoint,
        event = %cli.event,
        "sending event"
    );

    let mut environment = StaticEnvironment::new().with_path(&cli.path);
    if let Some(referrer) = &cli.referrer {
        environment = environment.with_referrer(referrer);
    }
    if let Some(user_agent) = &cli.user_agent {
        environment = environment.with_user_agent(user_agent);
    }

    let errors = capture_errors();
    let client = AnalyticsClient::builder(config)
        .environment(Arc::new(environment))
        .error_sink(errors.clone())
        .build()?;

    let properties: Properties = cli.properties.into_iter().collect();
    client.track(&cli.event, properties);
    client.drain().await;

    // Delivery is fire-and-forget in library use; here we surface the
    // outcome so the command is useful for smoke tests.
    for error in errors.errors() {
        anyhow::bail!("event not delivered: {error}");
    }
    info!("event delivered");
    Ok(())
}
