//! Role repository for database operations

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{RbacError, RbacResult};
use crate::models::{NewRole, Role};

const ROLE_COLUMNS: &str = "id, name, display_name, description, created_at, updated_at";

/// Role repository
#[derive(Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    /// Create a new role repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new role
    pub async fn create(&self, new_role: &NewRole) -> RbacResult<Role> {
        info!("Creating role: {}", new_role.name);

        let result = sqlx::query_as::<_, Role>(&format!(
            r#"
            INSERT INTO roles (name, display_name, description)
            VALUES ($1, $2, $3)
            RETURNING {ROLE_COLUMNS}
            "#
        ))
        .bind(&new_role.name)
        .bind(&new_role.display_name)
        .bind(&new_role.description)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(role) => Ok(role),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                RbacError::Validation(format!("Role '{}' already exists", new_role.name)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Get all roles ordered by name
    pub async fn list(&self) -> RbacResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    /// Find a role by ID
    pub async fn find_by_id(&self, id: Uuid) -> RbacResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    /// Find a role by its unique name
    pub async fn find_by_name(&self, name: &str) -> RbacResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }
}
