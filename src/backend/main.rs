/**
 * docbridge Server Entry Point
 *
 * Starts the Axum HTTP server that the Docs engine calls back into, on top
 * of the in-process host.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use docbridge::backend::engine::EngineClient;
    use docbridge::backend::host::MemoryHost;
    use docbridge::backend::server::config::{load_config, load_database};
    use docbridge::backend::server::create_app;

    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    tracing::info!("[STARTUP] Server initialization started");

    let config = load_config()?;
    let pool = load_database(&config.database_url).await?;

    // A missing engine is not fatal at startup; callbacks fail until it is up
    let engine = EngineClient::new(config.service.engine.clone(), config.service.token_leeway)?;
    match engine.check().await {
        Ok(version) => tracing::info!("[Engine] Docs engine version {}", version),
        Err(e) => tracing::warn!("[Engine] Docs engine check failed: {}", e),
    }

    let app = create_app(config.service, pool, MemoryHost::new())?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin docbridge-server --features ssr");
    std::process::exit(1);
}
