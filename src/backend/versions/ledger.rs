/**
 * Version Ledger
 *
 * Per-version metadata the host's own version store does not keep: the
 * engine's change history JSON, the changes archive the engine produced for
 * the save, and the author of the save.
 *
 * # Lineage Check
 *
 * The stored history carries `prev`, the version id that preceded the saved
 * version when it was written. Reads pass the id the host currently lists
 * before that version; if they differ the lineage was rewritten (a version
 * was deleted or restored behind our back), so the history and changes are
 * purged and the read reports nothing.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::backend::host::FileId;

/// Who made a saved version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionAuthor {
    pub id: String,
    pub name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct VersionRow {
    history: Option<String>,
    changes: Option<Vec<u8>>,
    author: Option<String>,
}

/// Durable store of version history, changes and authors
#[derive(Clone, Debug)]
pub struct VersionLedger {
    pool: SqlitePool,
}

impl VersionLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn row(&self, owner_id: &str, file_id: FileId, version_id: &str) -> Result<Option<VersionRow>, sqlx::Error> {
        sqlx::query_as::<_, VersionRow>(
            r#"
            SELECT history, changes, author
            FROM version_history
            WHERE owner_id = ?1 AND file_id = ?2 AND version_id = ?3
            "#,
        )
        .bind(owner_id)
        .bind(file_id)
        .bind(version_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Record the engine history of a saved version
    ///
    /// `history` is the object the engine sent (`changes`, `serverVersion`);
    /// `prev` is stored alongside it. Writing the same version again
    /// replaces the earlier record.
    pub async fn save_history(
        &self,
        owner_id: &str,
        file_id: FileId,
        version_id: &str,
        history: &Value,
        changes: Option<&[u8]>,
        prev: &str,
    ) -> Result<(), sqlx::Error> {
        let mut stored = match history {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        stored.insert("prev".to_string(), Value::String(prev.to_string()));
        let stored = Value::Object(stored).to_string();

        sqlx::query(
            r#"
            INSERT INTO version_history (owner_id, file_id, version_id, history, changes)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (owner_id, file_id, version_id) DO UPDATE SET
                history = excluded.history,
                changes = excluded.changes
            "#,
        )
        .bind(owner_id)
        .bind(file_id)
        .bind(version_id)
        .bind(stored)
        .bind(changes)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            "[Versions] Stored history of version {} of file {} (prev {})",
            version_id,
            file_id,
            prev
        );
        Ok(())
    }

    /// History of a version whose predecessor is `expected_prev`
    ///
    /// A record written against another predecessor is stale: its history
    /// and changes are removed and `None` is returned.
    pub async fn get_history(
        &self,
        owner_id: &str,
        file_id: FileId,
        version_id: &str,
        expected_prev: &str,
    ) -> Result<Option<Value>, sqlx::Error> {
        let Some(history) = self
            .row(owner_id, file_id, version_id)
            .await?
            .and_then(|row| row.history)
        else {
            return Ok(None);
        };

        let parsed: Option<Value> = serde_json::from_str(&history).ok();
        let prev = parsed
            .as_ref()
            .and_then(|value| value.get("prev"))
            .and_then(Value::as_str);

        if prev != Some(expected_prev) {
            tracing::warn!(
                "[Versions] Stale history for version {} of file {}: prev {:?}, expected {}",
                version_id,
                file_id,
                prev,
                expected_prev
            );
            self.clear_version_history(owner_id, file_id, version_id).await?;
            return Ok(None);
        }
        Ok(parsed)
    }

    /// Changes archive stored with a version
    pub async fn get_changes(
        &self,
        owner_id: &str,
        file_id: FileId,
        version_id: &str,
    ) -> Result<Option<Vec<u8>>, sqlx::Error> {
        Ok(self
            .row(owner_id, file_id, version_id)
            .await?
            .and_then(|row| row.changes))
    }

    /// Whether a changes archive is stored with a version
    pub async fn has_changes(&self, owner_id: &str, file_id: FileId, version_id: &str) -> Result<bool, sqlx::Error> {
        let stored: Option<(bool,)> = sqlx::query_as(
            r#"
            SELECT changes IS NOT NULL
            FROM version_history
            WHERE owner_id = ?1 AND file_id = ?2 AND version_id = ?3
            "#,
        )
        .bind(owner_id)
        .bind(file_id)
        .bind(version_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stored.is_some_and(|(present,)| present))
    }

    async fn clear_version_history(&self, owner_id: &str, file_id: FileId, version_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE version_history SET history = NULL, changes = NULL
            WHERE owner_id = ?1 AND file_id = ?2 AND version_id = ?3
            "#,
        )
        .bind(owner_id)
        .bind(file_id)
        .bind(version_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn save_author(
        &self,
        owner_id: &str,
        file_id: FileId,
        version_id: &str,
        author: &VersionAuthor,
    ) -> Result<(), sqlx::Error> {
        let author = serde_json::to_string(author).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        sqlx::query(
            r#"
            INSERT INTO version_history (owner_id, file_id, version_id, author)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (owner_id, file_id, version_id) DO UPDATE SET author = excluded.author
            "#,
        )
        .bind(owner_id)
        .bind(file_id)
        .bind(version_id)
        .bind(author)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_author(
        &self,
        owner_id: &str,
        file_id: FileId,
        version_id: &str,
    ) -> Result<Option<VersionAuthor>, sqlx::Error> {
        Ok(self
            .row(owner_id, file_id, version_id)
            .await?
            .and_then(|row| row.author)
            .and_then(|author| serde_json::from_str(&author).ok()))
    }

    /// Forget everything stored for one version
    pub async fn delete_version(&self, owner_id: &str, file_id: FileId, version_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM version_history WHERE owner_id = ?1 AND file_id = ?2 AND version_id = ?3")
            .bind(owner_id)
            .bind(file_id)
            .bind(version_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Forget everything stored for a file, for every owner
    pub async fn delete_file(&self, file_id: FileId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM version_history WHERE file_id = ?1")
            .bind(file_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Bulk-delete the whole ledger
    pub async fn clear_history(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM version_history").execute(&self.pool).await?;
        tracing::info!("[Versions] Cleared {} history records", result.rows_affected());
        Ok(result.rows_affected())
    }

    /// Number of versions of a file with recorded history
    pub async fn history_count(&self, file_id: FileId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM version_history WHERE file_id = ?1 AND history IS NOT NULL")
                .bind(file_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
