/**
 * Editing Key and Lock Registry
 *
 * This module persists the per-file editing session state the Docs engine
 * relies on: the editing key, whether the engine currently owns the file
 * (`locked`), and whether the last save was a forcesave.
 *
 * # Concurrency
 *
 * Every worker shares the same table. Key minting is a single
 * insert-or-fill statement keyed on the primary key followed by a re-read,
 * so callers racing on an unseen file all end up with the row that won.
 * The remaining fields are plain last-writer-wins updates.
 */

use sqlx::SqlitePool;

use crate::backend::host::FileId;

/// Stored editing state of one file
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct KeyLockState {
    pub file_id: FileId,
    /// Empty when no key has been minted since the last reset
    pub editing_key: String,
    pub locked: bool,
    pub forcesave: bool,
}

/// Durable file id → editing session state map
#[derive(Clone, Debug)]
pub struct KeyLockRegistry {
    pool: SqlitePool,
    instance_id: String,
}

impl KeyLockRegistry {
    pub fn new(pool: SqlitePool, instance_id: impl Into<String>) -> Self {
        Self {
            pool,
            instance_id: instance_id.into(),
        }
    }

    /// Full state row, if one exists
    pub async fn state(&self, file_id: FileId) -> Result<Option<KeyLockState>, sqlx::Error> {
        sqlx::query_as::<_, KeyLockState>(
            r#"
            SELECT file_id, editing_key, locked, forcesave
            FROM editing_keys
            WHERE file_id = ?1
            "#,
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Current editing key, if one has been minted
    pub async fn get_key(&self, file_id: FileId) -> Result<Option<String>, sqlx::Error> {
        Ok(self
            .state(file_id)
            .await?
            .map(|state| state.editing_key)
            .filter(|key| !key.is_empty()))
    }

    /// Return the file's editing key, minting `{instance}_{guid}` if absent
    pub async fn get_or_create_key(&self, file_id: FileId) -> Result<String, sqlx::Error> {
        if let Some(key) = self.get_key(file_id).await? {
            return Ok(key);
        }

        let candidate = format!("{}_{}", self.instance_id, uuid::Uuid::new_v4().simple());
        sqlx::query(
            r#"
            INSERT INTO editing_keys (file_id, editing_key)
            VALUES (?1, ?2)
            ON CONFLICT (file_id) DO UPDATE SET
                editing_key = excluded.editing_key
            WHERE editing_keys.editing_key = ''
            "#,
        )
        .bind(file_id)
        .bind(&candidate)
        .execute(&self.pool)
        .await?;

        let key = self
            .get_key(file_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        if key == candidate {
            tracing::debug!("[KeyLock] Minted editing key for file {}", file_id);
        }
        Ok(key)
    }

    /// Forget the file's editing state
    ///
    /// Without `force` a locked entry is kept, so an in-flight save does not
    /// lose its key to an unrelated content-change notification. Returns
    /// whether a row was removed.
    pub async fn delete_key(&self, file_id: FileId, force: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM editing_keys
            WHERE file_id = ?1 AND (locked = 0 OR ?2)
            "#,
        )
        .bind(file_id)
        .bind(force)
        .execute(&self.pool)
        .await?;

        let removed = result.rows_affected() > 0;
        if !removed && !force && self.is_locked(file_id).await? {
            tracing::debug!("[KeyLock] Kept key of locked file {}", file_id);
        }
        Ok(removed)
    }

    pub async fn set_lock(&self, file_id: FileId, locked: bool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO editing_keys (file_id, locked)
            VALUES (?1, ?2)
            ON CONFLICT (file_id) DO UPDATE SET locked = excluded.locked
            "#,
        )
        .bind(file_id)
        .bind(locked)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn is_locked(&self, file_id: FileId) -> Result<bool, sqlx::Error> {
        Ok(self.state(file_id).await?.map(|state| state.locked).unwrap_or(false))
    }

    pub async fn set_forcesave(&self, file_id: FileId, forcesave: bool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO editing_keys (file_id, forcesave)
            VALUES (?1, ?2)
            ON CONFLICT (file_id) DO UPDATE SET forcesave = excluded.forcesave
            "#,
        )
        .bind(file_id)
        .bind(forcesave)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Whether the most recent save of the file was a forcesave
    pub async fn was_forcesave(&self, file_id: FileId) -> Result<bool, sqlx::Error> {
        Ok(self
            .state(file_id)
            .await?
            .map(|state| state.forcesave)
            .unwrap_or(false))
    }
}
