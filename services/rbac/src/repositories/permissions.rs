//! Permission repository for database operations
//!
//! Read-side queries over the permission catalog. The write side (upsert,
//! deactivation, purge) lives with the synchronizer, which owns the
//! transactions those mutations run in.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::RbacResult;
use crate::models::Permission;

pub(crate) const PERMISSION_COLUMNS: &str = "id, name, display_name, description, resource, \
     action, uri, method, symbolic_name, is_api_route, is_active, deactivated_at, \
     created_at, updated_at";

/// Permission repository
#[derive(Clone)]
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    /// Create a new permission repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get every permission row, active or not
    pub async fn list_all(&self) -> RbacResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions ORDER BY resource, action"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    /// Get active API permissions ordered by `(resource, action)`
    pub async fn list_active_api(&self) -> RbacResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(&format!(
            r#"
            SELECT {PERMISSION_COLUMNS}
            FROM permissions
            WHERE is_api_route AND is_active
            ORDER BY resource, action
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    /// Get the active API permissions of one resource
    pub async fn active_for_resource(&self, resource: &str) -> RbacResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(&format!(
            r#"
            SELECT {PERMISSION_COLUMNS}
            FROM permissions
            WHERE is_api_route AND is_active AND resource = $1
            ORDER BY action
            "#
        ))
        .bind(resource)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    /// Find a permission by its unique name
    pub async fn find_by_name(&self, name: &str) -> RbacResult<Option<Permission>> {
        let permission = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(permission)
    }

    /// Find a permission by ID
    pub async fn find_by_id(&self, id: Uuid) -> RbacResult<Option<Permission>> {
        let permission = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(permission)
    }

}
