//! Database test fixtures
//!
//! Every test gets a private in-memory SQLite database with the schema
//! applied, so tests never share registry or ledger rows.

use docbridge::backend::keylock::KeyLockRegistry;
use docbridge::backend::server::config::open_memory_database;
use docbridge::backend::versions::VersionLedger;
use sqlx::SqlitePool;

/// Fresh migrated in-memory pool
pub async fn test_pool() -> SqlitePool {
    open_memory_database()
        .await
        .expect("Failed to open in-memory database")
}

/// Registry and ledger over one fresh pool
pub async fn test_stores(instance_id: &str) -> (SqlitePool, KeyLockRegistry, VersionLedger) {
    let pool = test_pool().await;
    let registry = KeyLockRegistry::new(pool.clone(), instance_id);
    let ledger = VersionLedger::new(pool.clone());
    (pool, registry, ledger)
}
