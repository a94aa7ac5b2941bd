//! tessera-server entry point.
//!
//! Binds the listening socket and serves requests until the process is
//! terminated.

use std::sync::Arc;

use tessera_server::config::ServerConfig;
use tessera_server::domain::{CAPACITY, EventBus, PoolRegistry};
use tessera_server::logging;
use tessera_server::server::Acceptor;
use tessera_server::service::{TesseraService, spawn_reporter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    logging::init(config.log_format, "info");
    tracing::info!(addr = %config.listen_addr, capacity = CAPACITY, "starting tessera-server");

    // Build domain layer
    let registry = Arc::new(PoolRegistry::new());
    let event_bus = EventBus::new(config.event_bus_capacity);
    let _reporter = spawn_reporter(&event_bus, config.log_format);

    // Build service layer
    let service = Arc::new(TesseraService::new(registry, event_bus));

    // Start server
    let acceptor = Acceptor::bind(config.listen_addr, service).await?;
    tracing::info!(addr = %acceptor.local_addr()?, "server listening");

    acceptor.run().await;

    Ok(())
}
