//! Field-level permission repository
//!
//! Single-row upserts keyed by `(role_id, table_name, field_name)`. The
//! overlay is deny-by-default: `permissions_for` only returns explicit
//! rows, and callers fall back to `FieldAccess::default()` for the rest.

use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{RbacError, RbacResult};
use crate::models::{FieldAccess, FieldPermission};

const FIELD_PERMISSION_COLUMNS: &str =
    "id, role_id, table_name, field_name, can_read, can_write, created_at, updated_at";

/// All live columns of one table, for the admin UI's gap listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumns {
    pub table_name: String,
    pub columns: Vec<String>,
}

/// Field permission repository
#[derive(Clone)]
pub struct FieldPermissionRepository {
    pool: PgPool,
}

impl FieldPermissionRepository {
    /// Create a new field permission repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert the read/write flags for one `(role, table, field)` triple
    pub async fn set(
        &self,
        role_id: Uuid,
        table_name: &str,
        field_name: &str,
        access: FieldAccess,
    ) -> RbacResult<FieldPermission> {
        let result = sqlx::query_as::<_, FieldPermission>(&format!(
            r#"
            INSERT INTO field_permissions (role_id, table_name, field_name, can_read, can_write)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (role_id, table_name, field_name)
            DO UPDATE SET can_read = $4, can_write = $5, updated_at = NOW()
            RETURNING {FIELD_PERMISSION_COLUMNS}
            "#
        ))
        .bind(role_id)
        .bind(table_name)
        .bind(field_name)
        .bind(access.can_read)
        .bind(access.can_write)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(RbacError::NotFound(format!("Role {}", role_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Explicit field flags of one role on one table, keyed by field name
    pub async fn permissions_for(
        &self,
        role_id: Uuid,
        table_name: &str,
    ) -> RbacResult<HashMap<String, FieldAccess>> {
        let rows: Vec<(String, bool, bool)> = sqlx::query_as(
            r#"
            SELECT field_name, can_read, can_write
            FROM field_permissions
            WHERE role_id = $1 AND table_name = $2
            "#,
        )
        .bind(role_id)
        .bind(table_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(field, can_read, can_write)| {
                (
                    field,
                    FieldAccess {
                        can_read,
                        can_write,
                    },
                )
            })
            .collect())
    }

    /// Every explicit field permission row of one role
    pub async fn list_for_role(&self, role_id: Uuid) -> RbacResult<Vec<FieldPermission>> {
        let rows = sqlx::query_as::<_, FieldPermission>(&format!(
            r#"
            SELECT {FIELD_PERMISSION_COLUMNS}
            FROM field_permissions
            WHERE role_id = $1
            ORDER BY table_name, field_name
            "#
        ))
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// All columns of all non-system tables in the live schema
    ///
    /// The admin UI lists these so deny-by-default gaps are visible: a
    /// column without an explicit row is unreadable and unwritable.
    pub async fn live_columns(&self) -> RbacResult<Vec<TableColumns>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT table_name::text, column_name::text
            FROM information_schema.columns
            WHERE table_schema = 'public'
              AND table_name NOT LIKE E'\\_%'
            ORDER BY table_name, ordinal_position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut tables: Vec<TableColumns> = Vec::new();
        for (table_name, column_name) in rows {
            match tables.last_mut() {
                Some(last) if last.table_name == table_name => last.columns.push(column_name),
                _ => tables.push(TableColumns {
                    table_name,
                    columns: vec![column_name],
                }),
            }
        }

        Ok(tables)
    }
}
