//! Connectivity check for a docbridge deployment
//!
//! Loads the same configuration as the server, then checks the database and
//! the Docs engine one by one and prints what it finds.
//!
//! `--clear-history` also drops every stored version history record.

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use docbridge::backend::engine::EngineClient;
    use docbridge::backend::server::config::{load_config, load_database};
    use docbridge::backend::versions::VersionLedger;

    dotenv::dotenv().ok();
    let clear_history = std::env::args().any(|arg| arg == "--clear-history");

    let config = load_config()?;
    let service = &config.service;

    println!("🔍 CHECKING DOCBRIDGE CONNECTIONS");
    println!("=================================");
    println!("Instance:     {}", service.instance_id);
    println!("DATABASE_URL: {}", config.database_url);
    println!("Engine:       {}", service.engine.request_url());
    println!("Storage URL:  {}", service.storage_url);
    println!("Engine JWT:   {}", if service.engine.jwt_secret.is_some() { "on" } else { "off" });

    let mut healthy = true;

    println!("\n🧪 Testing database...");
    match load_database(&config.database_url).await {
        Ok(pool) => {
            match sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM editing_keys")
                .fetch_one(&pool)
                .await
            {
                Ok((count,)) => println!("✅ Database ready, {} editing keys stored", count),
                Err(e) => {
                    healthy = false;
                    println!("❌ Registry query failed: {}", e);
                }
            }
            if clear_history {
                match VersionLedger::new(pool).clear_history().await {
                    Ok(removed) => println!("🧹 Cleared {} version history records", removed),
                    Err(e) => {
                        healthy = false;
                        println!("❌ Clearing version history failed: {}", e);
                    }
                }
            }
        }
        Err(e) => {
            healthy = false;
            println!("❌ Database connection failed: {}", e);
            println!("💡 Check DATABASE_URL and that the directory is writable");
        }
    }

    println!("\n🧪 Testing Docs engine...");
    let engine = EngineClient::new(service.engine.clone(), service.token_leeway)?;
    match engine.check().await {
        Ok(version) => println!("✅ Engine reachable, version {}", version),
        Err(e) => {
            healthy = false;
            println!("❌ Engine check failed: {}", e);
            println!("💡 Possible issues:");
            println!("   - Wrong DOCBRIDGE_ENGINE_URL or DOCBRIDGE_ENGINE_INTERNAL_URL");
            println!("   - DOCBRIDGE_ENGINE_SECRET differs from the engine's secret");
            println!("   - Self-signed certificate with DOCBRIDGE_ENGINE_VERIFY_PEER=true");
        }
    }

    println!("\n🎯 SUMMARY: {}", if healthy { "all checks passed" } else { "some checks failed" });
    if !healthy {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("The connection check requires the 'ssr' feature to be enabled.");
    std::process::exit(1);
}
