//! Role-permission matrix repository
//!
//! The grant matrix uses one representation everywhere: an explicit
//! `granted` boolean on the `role_permission` join row. A row with
//! `granted=false` records a revocation; absence of a row means the pair
//! was never granted. Both grant and revoke are idempotent.

use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{HashMap, HashSet};
use tracing::info;
use uuid::Uuid;

use crate::error::{RbacError, RbacResult};

/// Role-permission matrix repository
#[derive(Clone)]
pub struct RolePermissionRepository {
    pool: PgPool,
}

impl RolePermissionRepository {
    /// Create a new role-permission repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grant a permission to a role; a no-op if already granted
    pub async fn grant(&self, role_id: Uuid, permission_id: Uuid) -> RbacResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO role_permission (role_id, permission_id, granted)
            VALUES ($1, $2, TRUE)
            ON CONFLICT (role_id, permission_id)
            DO UPDATE SET granted = TRUE, updated_at = NOW()
            "#,
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(RbacError::NotFound("Role or permission".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Revoke a permission from a role; a no-op if not granted
    ///
    /// Revoking a never-granted pair creates no row: only pairs that were
    /// granted at some point carry an explicit denial record.
    pub async fn revoke(&self, role_id: Uuid, permission_id: Uuid) -> RbacResult<()> {
        sqlx::query(
            r#"
            UPDATE role_permission
            SET granted = FALSE, updated_at = NOW()
            WHERE role_id = $1 AND permission_id = $2 AND granted
            "#,
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Check whether a role currently holds a permission
    pub async fn is_granted(&self, role_id: Uuid, permission_id: Uuid) -> RbacResult<bool> {
        let granted: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM role_permission
                WHERE role_id = $1 AND permission_id = $2 AND granted
            )
            "#,
        )
        .bind(role_id)
        .bind(permission_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(granted)
    }

    /// Bulk-update one role's grants in a single transaction
    ///
    /// With `grant_all` the listed ids are granted additively: existing
    /// grants outside the list are untouched. Without it, exactly the
    /// listed ids are revoked. Any failure rolls the whole call back.
    pub async fn bulk_set_for_role(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
        grant_all: bool,
    ) -> RbacResult<usize> {
        self.ensure_role_exists(role_id).await?;
        self.ensure_permissions_exist(permission_ids).await?;

        let mut tx = self.pool.begin().await.map_err(RbacError::Transaction)?;

        Self::apply_to_role(&mut tx, role_id, permission_ids, grant_all)
            .await
            .map_err(RbacError::Transaction)?;

        tx.commit().await.map_err(RbacError::Transaction)?;

        info!(
            "Bulk {} {} permissions for role {}",
            if grant_all { "granted" } else { "revoked" },
            permission_ids.len(),
            role_id
        );

        Ok(permission_ids.len())
    }

    /// Bulk-update every role against one resource's active permissions
    ///
    /// Resolves the resource's active API permissions, then applies the
    /// additive-grant / exact-revoke semantics to each role in turn inside
    /// one transaction. Returns the number of roles updated.
    pub async fn bulk_set_for_resource(
        &self,
        resource: &str,
        grant_all: bool,
    ) -> RbacResult<usize> {
        let permission_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM permissions
            WHERE is_api_route AND is_active AND resource = $1
            "#,
        )
        .bind(resource)
        .fetch_all(&self.pool)
        .await?;

        if permission_ids.is_empty() {
            return Err(RbacError::NotFound(format!(
                "Active permissions for resource '{}'",
                resource
            )));
        }

        let role_ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM roles")
            .fetch_all(&self.pool)
            .await?;

        let mut tx = self.pool.begin().await.map_err(RbacError::Transaction)?;

        for role_id in &role_ids {
            Self::apply_to_role(&mut tx, *role_id, &permission_ids, grant_all)
                .await
                .map_err(RbacError::Transaction)?;
        }

        tx.commit().await.map_err(RbacError::Transaction)?;

        info!(
            "Bulk {} resource '{}' across {} roles",
            if grant_all { "granted" } else { "revoked" },
            resource,
            role_ids.len()
        );

        Ok(role_ids.len())
    }

    /// Full grant matrix restricted to active API permissions
    ///
    /// One query for the whole grid, so the admin UI renders without a
    /// query per cell.
    pub async fn matrix(&self) -> RbacResult<HashMap<Uuid, HashSet<Uuid>>> {
        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT rp.role_id, rp.permission_id
            FROM role_permission rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.granted AND p.is_api_route AND p.is_active
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut matrix: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        for (role_id, permission_id) in rows {
            matrix.entry(role_id).or_default().insert(permission_id);
        }

        Ok(matrix)
    }

    /// Apply additive-grant or exact-revoke to one role inside a transaction
    async fn apply_to_role(
        tx: &mut Transaction<'_, Postgres>,
        role_id: Uuid,
        permission_ids: &[Uuid],
        grant_all: bool,
    ) -> Result<(), sqlx::Error> {
        if grant_all {
            sqlx::query(
                r#"
                INSERT INTO role_permission (role_id, permission_id, granted)
                SELECT $1, id, TRUE FROM permissions WHERE id = ANY($2)
                ON CONFLICT (role_id, permission_id)
                DO UPDATE SET granted = TRUE, updated_at = NOW()
                "#,
            )
            .bind(role_id)
            .bind(permission_ids)
            .execute(&mut **tx)
            .await?;
        } else {
            sqlx::query(
                r#"
                UPDATE role_permission
                SET granted = FALSE, updated_at = NOW()
                WHERE role_id = $1 AND permission_id = ANY($2) AND granted
                "#,
            )
            .bind(role_id)
            .bind(permission_ids)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn ensure_role_exists(&self, role_id: Uuid) -> RbacResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM roles WHERE id = $1)")
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?;

        if exists {
            Ok(())
        } else {
            Err(RbacError::NotFound(format!("Role {}", role_id)))
        }
    }

    async fn ensure_permissions_exist(&self, permission_ids: &[Uuid]) -> RbacResult<()> {
        if permission_ids.is_empty() {
            return Err(RbacError::Validation(
                "permissionIds must not be empty".to_string(),
            ));
        }

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT id) FROM permissions WHERE id = ANY($1)")
                .bind(permission_ids)
                .fetch_one(&self.pool)
                .await?;

        let distinct: HashSet<Uuid> = permission_ids.iter().copied().collect();
        if count as usize == distinct.len() {
            Ok(())
        } else {
            Err(RbacError::NotFound("One or more permissions".to_string()))
        }
    }
}
