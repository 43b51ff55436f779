//! statlens management console.
//!
//! Loads `statlens.yaml` (or the path given as the first argument), seeds the
//! configured counters, and serves the registries over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use statlens_core::error::{Result, StatsError};
use statlens_mgmt::{config, console, telemetry, ConsolePublisher, StatisticsCatalog};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "statlens.yaml".into());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.console.listen.parse().map_err(|e| {
        StatsError::BadConfig(format!("console.listen must be a valid SocketAddr: {e}"))
    })?;

    let publisher = ConsolePublisher::new();
    let catalog = Arc::new(StatisticsCatalog::from_config(&cfg, Arc::new(publisher.clone()))?);
    StatisticsCatalog::install_global(Arc::clone(&catalog))?;
    if let Some(period) = cfg.catalog.refresh_interval() {
        catalog.spawn_average_refresh(period);
    }

    tracing::info!(%listen, config = %path, "statlens console starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| StatsError::Internal(format!("bind {listen} failed: {e}")))?;

    let served = console::serve(listener, publisher).await;
    catalog.shutdown();
    served
}
