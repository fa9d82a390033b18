use printdrop_api::{setup, telemetry};
use printdrop_core::ServerConfig;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    // Settings, stage directories, services, routes
    let app = setup::initialize_app(config.clone()).await?;

    // Start the server; returns after shutdown has drained
    setup::server::start_server(&config, app).await?;

    Ok(())
}
