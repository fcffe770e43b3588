use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photo_proxy::{config::Config, services::PhotoProxyService, web::WebServer};

#[derive(Parser)]
#[command(name = "photo-proxy")]
#[command(version = "0.1.0")]
#[command(about = "A media proxy service for travel place photos")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("photo_proxy={},tower_http=trace", cli.log_level)
    } else {
        format!("photo_proxy={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Photo Proxy Service v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration from the specified file
    std::env::set_var("CONFIG_FILE", &cli.config);
    let mut config = Config::load()?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    let service = PhotoProxyService::from_config(&config);
    let enabled = service.list_enabled_providers();
    if enabled.is_empty() {
        info!("No photo providers enabled; check credentials and enable flags");
    } else {
        info!("Enabled providers: {}", enabled.join(", "));
    }

    service.spawn_cache_sweeper(std::time::Duration::from_secs(
        config.cache.sweep_interval_secs,
    ));

    let web_server = WebServer::new(&config, service)?;
    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    Ok(())
}
