//! Permission synchronizer: reconciles the route manifest with the catalog
//!
//! Planning is pure: the manifest is classified into `PermissionSeed`s with
//! every derived field computed up front. Applying a plan is one atomic
//! transaction; a failure rolls back every write in the call, so partial
//! sync state is never observable. Permissions are deactivated, never
//! deleted, when their route disappears.

use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use crate::catalog::PermissionCatalog;
use crate::classifier::{ClassifiedRoute, ClassifierConfig, classify};
use crate::error::{RbacError, RbacResult};
use crate::inflect::{pluralize, singularize, snake_case, title_case};
use crate::manifest::RouteManifest;

/// Fully derived permission record, ready to upsert by `name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSeed {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub resource: String,
    pub action: String,
    pub uri: String,
    pub method: String,
    pub symbolic_name: Option<String>,
}

impl PermissionSeed {
    /// Derive every permission field from a classified route
    pub fn from_route(route: &ClassifiedRoute) -> Self {
        let resource_token = snake_case(&route.resource);
        let singular = singularize(&resource_token);
        let name = format!("{}.{}", singular, snake_case(route.action.as_str()));

        // Re-pluralize the singular form so already-plural resource
        // segments do not double up
        let subject = title_case(&pluralize(&singular));
        let display_name = match route.action.verb_phrase() {
            "Unknown" => format!("{} {}", title_case(route.action.as_str()), subject),
            phrase => format!("{} {}", phrase, subject),
        };

        let description = format!("Auto-generated from route {} /{}", route.method, route.uri);

        Self {
            name,
            display_name,
            description,
            resource: route.resource.clone(),
            action: route.action.as_str().to_string(),
            uri: route.uri.clone(),
            method: route.method.clone(),
            symbolic_name: route.symbolic_name.clone(),
        }
    }
}

/// Outcome of a sync or cleanup run
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Classified routes processed in this run
    pub synced_count: u64,
    /// Permissions left inactive because no live route backs them
    pub deactivated_count: u64,
}

/// Classify every manifest record into permission seeds; skipped routes
/// produce nothing
pub fn plan(manifest: &RouteManifest, config: &ClassifierConfig) -> Vec<PermissionSeed> {
    manifest
        .records()
        .filter_map(|record| classify(record.uri, record.method, record.name, config))
        .map(|route| PermissionSeed::from_route(&route))
        .collect()
}

/// Permission synchronizer
#[derive(Clone)]
pub struct PermissionSynchronizer {
    pool: PgPool,
    config: ClassifierConfig,
    catalog: PermissionCatalog,
}

impl PermissionSynchronizer {
    /// Create a new synchronizer
    pub fn new(pool: PgPool, config: ClassifierConfig, catalog: PermissionCatalog) -> Self {
        Self {
            pool,
            config,
            catalog,
        }
    }

    /// Upsert a permission for every classified route, in one transaction
    ///
    /// Existing rows keyed by `name` are refreshed in place, so renamed
    /// display text never creates duplicates. Returns the number of routes
    /// processed.
    pub async fn sync(&self, manifest: &RouteManifest) -> RbacResult<SyncReport> {
        let seeds = plan(manifest, &self.config);

        let mut tx = self.pool.begin().await.map_err(RbacError::Transaction)?;

        for seed in &seeds {
            upsert_seed(&mut tx, seed)
                .await
                .map_err(RbacError::Transaction)?;
        }

        tx.commit().await.map_err(RbacError::Transaction)?;

        self.catalog.invalidate_cache().await;
        info!("Synced {} routes into the permission catalog", seeds.len());

        Ok(SyncReport {
            synced_count: seeds.len() as u64,
            deactivated_count: 0,
        })
    }

    /// Deactivate every API permission, then re-sync the live routes
    ///
    /// Permissions whose routes were removed stay `is_active=false` and are
    /// counted, not deleted: historical role grants keep their target rows
    /// for audit and reporting.
    pub async fn cleanup(&self, manifest: &RouteManifest) -> RbacResult<SyncReport> {
        let seeds = plan(manifest, &self.config);

        let mut tx = self.pool.begin().await.map_err(RbacError::Transaction)?;

        sqlx::query(
            r#"
            UPDATE permissions
            SET is_active = FALSE, deactivated_at = NOW(), updated_at = NOW()
            WHERE is_api_route AND is_active
            "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(RbacError::Transaction)?;

        for seed in &seeds {
            upsert_seed(&mut tx, seed)
                .await
                .map_err(RbacError::Transaction)?;
        }

        let deactivated: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM permissions WHERE is_api_route AND NOT is_active")
                .fetch_one(&mut *tx)
                .await
                .map_err(RbacError::Transaction)?;

        tx.commit().await.map_err(RbacError::Transaction)?;

        self.catalog.invalidate_cache().await;
        info!(
            "Cleanup synced {} routes, {} permissions remain inactive",
            seeds.len(),
            deactivated
        );

        Ok(SyncReport {
            synced_count: seeds.len() as u64,
            deactivated_count: deactivated as u64,
        })
    }

    /// Delete inactive permissions deactivated longer ago than the retention
    /// window; their grant rows cascade. Nothing purges automatically.
    pub async fn purge_inactive(&self, retention_days: i32) -> RbacResult<u64> {
        if retention_days < 0 {
            return Err(RbacError::Validation(
                "retentionDays must not be negative".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            DELETE FROM permissions
            WHERE NOT is_active
              AND deactivated_at IS NOT NULL
              AND deactivated_at < NOW() - make_interval(days => $1)
            "#,
        )
        .bind(retention_days)
        .execute(&self.pool)
        .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            self.catalog.invalidate_cache().await;
            info!("Purged {} stale permissions", purged);
        }

        Ok(purged)
    }
}

/// Upsert one seed keyed by its unique name, reactivating it if needed
async fn upsert_seed(
    tx: &mut Transaction<'_, Postgres>,
    seed: &PermissionSeed,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO permissions
            (name, display_name, description, resource, action, uri, method,
             symbolic_name, is_api_route, is_active, deactivated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, TRUE, NULL)
        ON CONFLICT (name) DO UPDATE SET
            display_name = EXCLUDED.display_name,
            description = EXCLUDED.description,
            resource = EXCLUDED.resource,
            action = EXCLUDED.action,
            uri = EXCLUDED.uri,
            method = EXCLUDED.method,
            symbolic_name = EXCLUDED.symbolic_name,
            is_api_route = TRUE,
            is_active = TRUE,
            deactivated_at = NULL,
            updated_at = NOW()
        "#,
    )
    .bind(&seed.name)
    .bind(&seed.display_name)
    .bind(&seed.description)
    .bind(&seed.resource)
    .bind(&seed.action)
    .bind(&seed.uri)
    .bind(&seed.method)
    .bind(&seed.symbolic_name)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
