/**
 * Remote Instance Health Cache
 *
 * Availability of federated instances, cached in process and in the
 * `remote_instances` table so other workers and restarts reuse it. Both
 * positive and negative results are cached for the configured TTL; a dead
 * remote is therefore asked again at most once per TTL.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sqlx::SqlitePool;

#[derive(Debug, Clone, Copy)]
struct Entry {
    alive: bool,
    expire: i64,
}

/// Two-level cache of remote availability
#[derive(Clone, Debug)]
pub struct HealthCache {
    pool: SqlitePool,
    ttl: Duration,
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl HealthCache {
    pub fn new(pool: SqlitePool, ttl: Duration) -> Self {
        Self {
            pool,
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn memory_get(&self, remote: &str, now: i64) -> Option<bool> {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .get(remote)
            .filter(|entry| entry.expire > now)
            .map(|entry| entry.alive)
    }

    fn memory_put(&self, remote: &str, entry: Entry) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(remote.to_string(), entry);
    }

    /// Cached availability, if a fresh result exists
    pub async fn get(&self, remote: &str) -> Result<Option<bool>, sqlx::Error> {
        let now = Self::now();
        if let Some(alive) = self.memory_get(remote, now) {
            return Ok(Some(alive));
        }

        let row: Option<(bool, i64)> =
            sqlx::query_as("SELECT alive, expire FROM remote_instances WHERE remote = ?1")
                .bind(remote)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((alive, expire)) if expire > now => {
                self.memory_put(remote, Entry { alive, expire });
                Ok(Some(alive))
            }
            _ => Ok(None),
        }
    }

    /// Record a fresh result
    pub async fn set(&self, remote: &str, alive: bool) -> Result<(), sqlx::Error> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX / 2);
        let entry = Entry {
            alive,
            expire: Self::now().saturating_add(ttl),
        };
        self.memory_put(remote, entry);

        sqlx::query(
            r#"
            INSERT INTO remote_instances (remote, alive, expire)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (remote) DO UPDATE SET
                alive = excluded.alive,
                expire = excluded.expire
            "#,
        )
        .bind(remote)
        .bind(entry.alive)
        .bind(entry.expire)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
