//! User repository for database operations
//!
//! Covers role membership, direct permission grants, and effective
//! permission resolution. Direct grants combine with role grants via
//! additive union; a direct grant can add access but never deny what a
//! role already grants.

use sqlx::PgPool;
use std::collections::BTreeSet;
use tracing::info;
use uuid::Uuid;

use crate::error::{RbacError, RbacResult};
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user; the password hash is stored as-is
    pub async fn create(&self, new_user: &NewUser) -> RbacResult<User> {
        info!("Creating user: {}", new_user.email);

        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                RbacError::Validation(format!("User '{}' already exists", new_user.email)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Get all users ordered by email
    pub async fn list(&self) -> RbacResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY email"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> RbacResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Assign a role to a user; a no-op if already assigned
    pub async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> RbacResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, role_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(RbacError::NotFound("User or role".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a role from a user
    pub async fn remove_role(&self, user_id: Uuid, role_id: Uuid) -> RbacResult<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Grant a permission directly to a user, bypassing roles
    pub async fn grant_direct(&self, user_id: Uuid, permission_id: Uuid) -> RbacResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, permission_id, granted)
            VALUES ($1, $2, TRUE)
            ON CONFLICT (user_id, permission_id)
            DO UPDATE SET granted = TRUE, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(RbacError::NotFound("User or permission".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Revoke a direct permission grant
    pub async fn revoke_direct(&self, user_id: Uuid, permission_id: Uuid) -> RbacResult<()> {
        sqlx::query(
            r#"
            UPDATE user_permissions
            SET granted = FALSE, updated_at = NOW()
            WHERE user_id = $1 AND permission_id = $2 AND granted
            "#,
        )
        .bind(user_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The user's effective permission names: the union of role grants and
    /// direct grants, restricted to active API permissions
    pub async fn effective_permission_names(&self, user_id: Uuid) -> RbacResult<BTreeSet<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT p.name
            FROM permissions p
            JOIN role_permission rp ON rp.permission_id = p.id AND rp.granted
            JOIN user_roles ur ON ur.role_id = rp.role_id
            WHERE ur.user_id = $1 AND p.is_api_route AND p.is_active
            UNION
            SELECT p.name
            FROM permissions p
            JOIN user_permissions up ON up.permission_id = p.id AND up.granted
            WHERE up.user_id = $1 AND p.is_api_route AND p.is_active
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names.into_iter().collect())
    }

    /// Check whether a user holds a permission, by name
    pub async fn user_can(&self, user_id: Uuid, permission_name: &str) -> RbacResult<bool> {
        let allowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM permissions p
                LEFT JOIN user_permissions up
                    ON up.permission_id = p.id AND up.user_id = $1 AND up.granted
                LEFT JOIN role_permission rp
                    ON rp.permission_id = p.id AND rp.granted
                LEFT JOIN user_roles ur
                    ON ur.role_id = rp.role_id AND ur.user_id = $1
                WHERE p.name = $2
                  AND p.is_api_route
                  AND p.is_active
                  AND (up.user_id IS NOT NULL OR ur.user_id IS NOT NULL)
            )
            "#,
        )
        .bind(user_id)
        .bind(permission_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(allowed)
    }
}
