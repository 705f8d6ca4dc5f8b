//! OAuth discovery and token exchange server
//!
//! Serves the well-known discovery documents, the browser completion endpoint
//! and the programmatic token endpoint for one deployment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ekaya_mcp_oauth::{
    HttpTokenExchanger, MemorySessionStore, OAuthConfig, OAuthState, StaticProjectLookup,
    oauth_router,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ekaya-oauth-server")]
#[command(about = "Multi-tenant OAuth discovery and PKCE token exchange")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "EKAYA_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides bind_address from the configuration
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = match &cli.config {
        Some(path) => OAuthConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => OAuthConfig::from_env().context("loading configuration from environment")?,
    };
    config.validate().context("invalid configuration")?;

    let bind: SocketAddr = match cli.bind {
        Some(addr) => addr,
        None => config
            .bind_address
            .parse()
            .with_context(|| format!("invalid bind_address '{}'", config.bind_address))?,
    };

    let registry = Arc::new(config.registry());
    let exchanger = HttpTokenExchanger::new(
        registry.clone(),
        Duration::from_secs(config.exchange_timeout_secs),
    )
    .context("building token exchanger")?;
    let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(
        config.pending_session_ttl_secs,
    )));
    let projects = StaticProjectLookup::new(config.project_pages()?);

    info!(
        auth_servers = registry.len(),
        default_auth_server = %config.auth_server_url,
        base_url = %config.base_url,
        "starting OAuth server"
    );

    spawn_session_cleanup(sessions.clone(), config.pending_session_ttl_secs);

    let state = OAuthState::new(config, Arc::new(exchanger), sessions, Arc::new(projects));
    let app = oauth_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!(address = %bind, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn spawn_session_cleanup(sessions: Arc<MemorySessionStore>, ttl_secs: u64) {
    let period = Duration::from_secs(ttl_secs.max(60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            sessions.cleanup_expired().await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
