//! Application state shared across handlers

use sqlx::PgPool;
use std::sync::Arc;

use crate::catalog::PermissionCatalog;
use crate::manifest::RouteManifest;
use crate::repositories::{
    FieldPermissionRepository, PermissionRepository, RolePermissionRepository, RoleRepository,
    UserRepository,
};
use crate::sync::PermissionSynchronizer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub manifest: Arc<RouteManifest>,
    pub synchronizer: PermissionSynchronizer,
    pub catalog: PermissionCatalog,
    pub roles: RoleRepository,
    pub permissions: PermissionRepository,
    pub grants: RolePermissionRepository,
    pub field_permissions: FieldPermissionRepository,
    pub users: UserRepository,
}
