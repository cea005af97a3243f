use anyhow::Result;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use common::cache::{RedisConfig, RedisPool};
use common::database::{DatabaseConfig, init_pool};

use rbac::catalog::{CatalogCache, PermissionCatalog};
use rbac::classifier::ClassifierConfig;
use rbac::config::RbacConfig;
use rbac::manifest::RouteManifest;
use rbac::repositories::{
    FieldPermissionRepository, PermissionRepository, RolePermissionRepository, RoleRepository,
    UserRepository,
};
use rbac::routes::create_router;
use rbac::state::AppState;
use rbac::sync::PermissionSynchronizer;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting RBAC service");

    let config = RbacConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    // The catalog cache is optional; the service runs without Redis
    let redis_config = RedisConfig::from_env()?;
    let catalog = match RedisPool::new(&redis_config) {
        Ok(redis) => PermissionCatalog::new(pool.clone()).with_cache(CatalogCache::new(redis)),
        Err(e) => {
            warn!("Running without catalog cache: {}", e);
            PermissionCatalog::new(pool.clone())
        }
    };

    // Load the route inventory
    let manifest = RouteManifest::from_file(&config.manifest_path)?;
    info!(
        "Loaded route manifest v{} with {} routes",
        manifest.version,
        manifest.routes.len()
    );

    let classifier_config = ClassifierConfig {
        api_prefix: config.api_prefix.clone(),
    };
    let synchronizer =
        PermissionSynchronizer::new(pool.clone(), classifier_config, catalog.clone());

    let app_state = AppState {
        db_pool: pool.clone(),
        manifest: Arc::new(manifest),
        synchronizer,
        catalog,
        roles: RoleRepository::new(pool.clone()),
        permissions: PermissionRepository::new(pool.clone()),
        grants: RolePermissionRepository::new(pool.clone()),
        field_permissions: FieldPermissionRepository::new(pool.clone()),
        users: UserRepository::new(pool),
    };

    // Start the web server
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("RBAC service listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
