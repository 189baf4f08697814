//! Share Permissions Module
//!
//! Restricted editing modes granted on individual shares (review, comment,
//! form filling, spreadsheet filter changes) and the store that keeps them.
//! The launcher turns them into the permission block of the editor config.

use serde::Serialize;
use sqlx::SqlitePool;

bitflags::bitflags! {
    /// Extra modes granted on a share
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ExtraPermissions: u32 {
        /// Track-changes editing on a read-only share
        const REVIEW = 1 << 0;
        /// Commenting on a read-only share
        const COMMENT = 1 << 1;
        /// Form filling on a read-only share
        const FILL_FORMS = 1 << 2;
        /// Changing spreadsheet filters for everyone
        const MODIFY_FILTER = 1 << 3;
    }
}

/// Permission block handed to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorPermissions {
    pub edit: bool,
    pub review: bool,
    pub comment: bool,
    pub fill_forms: bool,
    pub modify_filter: bool,
}

impl EditorPermissions {
    /// Permissions of a user opening their own or a directly shared file
    pub fn full(can_edit: bool) -> Self {
        Self {
            edit: can_edit,
            review: can_edit,
            comment: can_edit,
            fill_forms: can_edit,
            modify_filter: can_edit,
        }
    }

    /// Permissions of a visitor arriving through a public share
    pub fn for_share(can_edit: bool, extra: ExtraPermissions) -> Self {
        if can_edit {
            return Self {
                modify_filter: extra.contains(ExtraPermissions::MODIFY_FILTER),
                ..Self::full(true)
            };
        }
        Self {
            edit: false,
            review: extra.contains(ExtraPermissions::REVIEW),
            comment: extra.contains(ExtraPermissions::COMMENT),
            fill_forms: extra.contains(ExtraPermissions::FILL_FORMS),
            modify_filter: false,
        }
    }

    /// Whether the engine should open the document in edit mode
    pub fn is_editing(&self) -> bool {
        self.edit || self.review || self.comment || self.fill_forms
    }
}

/// `share_permissions` table operations
#[derive(Clone, Debug)]
pub struct PermissionStore {
    pool: SqlitePool,
}

impl PermissionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Extra permissions of a share; empty when none were granted
    pub async fn get(&self, share_id: &str) -> Result<ExtraPermissions, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT permissions FROM share_permissions WHERE share_id = ?1")
            .bind(share_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row
            .map(|(bits,)| ExtraPermissions::from_bits_truncate(bits as u32))
            .unwrap_or_default())
    }

    pub async fn set(&self, share_id: &str, permissions: ExtraPermissions) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO share_permissions (share_id, permissions)
            VALUES (?1, ?2)
            ON CONFLICT (share_id) DO UPDATE SET permissions = excluded.permissions
            "#,
        )
        .bind(share_id)
        .bind(i64::from(permissions.bits()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, share_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM share_permissions WHERE share_id = ?1")
            .bind(share_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
