use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use presencia::config::Config;
use presencia::history::Store;
use presencia::server::{self, AppState};

/// Access-control check-in/check-out history and analytics API.
#[derive(Parser, Debug)]
#[command(name = "presencia", version, about)]
struct Args {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "PRESENCIA_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "PRESENCIA_PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("presencia=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let store = Store::new(&config.database).await?;
    tracing::info!(
        pool_size = config.database.pool_size,
        max_dwell_seconds = config.max_dwell_seconds,
        "connected to event store"
    );

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let state = AppState {
        store: Arc::new(store),
        max_dwell_seconds: config.max_dwell_seconds,
    };

    server::serve(addr, state).await
}
