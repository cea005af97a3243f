//! Permission catalog: grouped read model, cache, and export
//!
//! The catalog owns its cache explicitly. The synchronizer calls
//! `invalidate_cache` after every successful sync; nothing else writes the
//! cached entry, and the service runs fine with no cache configured.

use chrono::{DateTime, Utc};
use common::cache::RedisPool;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::classifier::Action;
use crate::error::RbacResult;
use crate::inflect::{pluralize, singularize, snake_case, title_case};
use crate::models::{Permission, Role};
use crate::repositories::permissions::PERMISSION_COLUMNS;

const CATALOG_CACHE_KEY: &str = "rbac:catalog:grouped";
const CATALOG_CACHE_TTL_SECS: u64 = 300;

/// One resource with its active permissions, in presentation order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    pub resource: String,
    pub display_name: String,
    pub permissions: Vec<Permission>,
}

/// Snapshot of the whole catalog for export/reporting
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub exported_at: DateTime<Utc>,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
    pub groups: Vec<ResourceGroup>,
}

/// Redis-backed cache for the grouped catalog
#[derive(Clone)]
pub struct CatalogCache {
    redis: RedisPool,
}

impl CatalogCache {
    pub fn new(redis: RedisPool) -> Self {
        Self { redis }
    }

    /// Fetch the cached grouping; any cache failure reads as a miss
    async fn get(&self) -> Option<Vec<ResourceGroup>> {
        match self.redis.get(CATALOG_CACHE_KEY).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(groups) => Some(groups),
                Err(e) => {
                    warn!("Discarding undecodable catalog cache entry: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Catalog cache read failed: {}", e);
                None
            }
        }
    }

    async fn put(&self, groups: &[ResourceGroup]) {
        let json = match serde_json::to_string(groups) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize catalog for caching: {}", e);
                return;
            }
        };

        if let Err(e) = self
            .redis
            .set(CATALOG_CACHE_KEY, &json, Some(CATALOG_CACHE_TTL_SECS))
            .await
        {
            warn!("Catalog cache write failed: {}", e);
        }
    }

    /// Drop the cached grouping; called after every successful sync
    pub async fn invalidate(&self) {
        if let Err(e) = self.redis.delete(CATALOG_CACHE_KEY).await {
            warn!("Catalog cache invalidation failed: {}", e);
        }
    }
}

/// Permission catalog
#[derive(Clone)]
pub struct PermissionCatalog {
    pool: PgPool,
    cache: Option<Arc<CatalogCache>>,
}

impl PermissionCatalog {
    /// Create a catalog without a cache
    pub fn new(pool: PgPool) -> Self {
        Self { pool, cache: None }
    }

    /// Attach the explicit cache component
    pub fn with_cache(mut self, cache: CatalogCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Active API permissions grouped by resource, in presentation order
    pub async fn grouped_by_resource(&self) -> RbacResult<Vec<ResourceGroup>> {
        if let Some(cache) = &self.cache {
            if let Some(groups) = cache.get().await {
                debug!("Serving grouped catalog from cache");
                return Ok(groups);
            }
        }

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

        let groups = regroup(permissions);

        if let Some(cache) = &self.cache {
            cache.put(&groups).await;
        }

        Ok(groups)
    }

    /// Invalidate the cached grouping, if a cache is configured
    pub async fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate().await;
        }
    }

    /// Export the whole catalog: roles, permissions, and the grouped view
    pub async fn export(&self) -> RbacResult<ExportBundle> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, display_name, description, created_at, updated_at FROM roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let permissions = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions ORDER BY resource, action"
        ))
        .fetch_all(&self.pool)
        .await?;

        let groups = self.grouped_by_resource().await?;

        Ok(ExportBundle {
            exported_at: Utc::now(),
            roles,
            permissions,
            groups,
        })
    }
}

/// Group permissions by resource and re-sort each group by action priority
///
/// Expects input ordered by `(resource, action)`; groups are formed from
/// consecutive runs, then each group is stably re-sorted into the fixed
/// action order. Unrecognized actions keep their relative order at the end.
pub fn regroup(permissions: Vec<Permission>) -> Vec<ResourceGroup> {
    let mut groups: Vec<ResourceGroup> = Vec::new();

    for permission in permissions {
        match groups.last_mut() {
            Some(group) if group.resource == permission.resource => {
                group.permissions.push(permission);
            }
            _ => {
                let display_name =
                    title_case(&pluralize(&singularize(&snake_case(&permission.resource))));
                groups.push(ResourceGroup {
                    resource: permission.resource.clone(),
                    display_name,
                    permissions: vec![permission],
                });
            }
        }
    }

    for group in &mut groups {
        group
            .permissions
            .sort_by_key(|p| Action::priority_of(&p.action));
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn permission(resource: &str, action: &str) -> Permission {
        let now = Utc::now();
        Permission {
            id: Uuid::new_v4(),
            name: format!("{}.{}", resource, action),
            display_name: String::new(),
            description: None,
            resource: resource.to_string(),
            action: action.to_string(),
            uri: None,
            method: None,
            symbolic_name: None,
            is_api_route: true,
            is_active: true,
            deactivated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_regroup_splits_by_resource() {
        let groups = regroup(vec![
            permission("media", "index"),
            permission("users", "index"),
            permission("users", "show"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].resource, "media");
        assert_eq!(groups[0].display_name, "Media");
        assert_eq!(groups[1].resource, "users");
        assert_eq!(groups[1].display_name, "Users");
        assert_eq!(groups[1].permissions.len(), 2);
    }

    #[test]
    fn test_regroup_applies_action_priority() {
        // Alphabetical input order, as it comes back from the database
        let groups = regroup(vec![
            permission("users", "batch"),
            permission("users", "destroy"),
            permission("users", "index"),
            permission("users", "search"),
            permission("users", "show"),
            permission("users", "store"),
            permission("users", "update"),
        ]);

        let actions: Vec<&str> = groups[0]
            .permissions
            .iter()
            .map(|p| p.action.as_str())
            .collect();
        assert_eq!(
            actions,
            vec!["index", "show", "store", "update", "destroy", "search", "batch"]
        );
    }

    #[test]
    fn test_regroup_puts_unknown_actions_last_in_stable_order() {
        let groups = regroup(vec![
            permission("users", "approve"),
            permission("users", "index"),
            permission("users", "reject"),
        ]);

        let actions: Vec<&str> = groups[0]
            .permissions
            .iter()
            .map(|p| p.action.as_str())
            .collect();
        assert_eq!(actions, vec!["index", "approve", "reject"]);
    }

    #[test]
    fn test_regroup_empty_input() {
        assert!(regroup(vec![]).is_empty());
    }
}
