//! Admin surface routes for the RBAC service

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    error::RbacError,
    models::{FieldAccess, NewRole},
    validation::{validate_resource, validate_role_name, validate_sql_identifier},
};

/// Create the router for the RBAC admin surface
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/permissions/sync", post(sync_routes))
        .route("/permissions/cleanup", post(cleanup_routes))
        .route("/permissions/purge", post(purge_permissions))
        .route("/permissions/grouped", get(grouped_permissions))
        .route("/permissions/export", get(export_catalog))
        .route("/permissions", get(list_permissions))
        .route("/permissions/:id", get(get_permission))
        .route("/permissions/resource/:resource", get(resource_permissions))
        .route("/roles", post(create_role).get(list_roles))
        .route("/roles/:id", get(get_role))
        .route("/role-permissions", post(set_role_permission))
        .route("/role-permissions/bulk", post(bulk_update_role))
        .route("/role-permissions/resource", post(bulk_update_resource))
        .route("/role-permissions/matrix", get(permission_matrix))
        .route("/field-permissions", post(set_field_permission))
        .route("/field-permissions/columns", get(list_columns))
        .route(
            "/field-permissions/:role_id/:table",
            get(get_field_permissions),
        )
        .route("/users", get(list_users))
        .route("/users/:id/roles", post(assign_user_role))
        .route("/users/:id/roles/:role_id", delete(remove_user_role))
        .route(
            "/users/:id/permissions",
            get(user_permissions).post(set_direct_permission),
        )
        .with_state(state)
}

/// Standard mutation outcome payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRolePermissionRequest {
    pub role_id: Uuid,
    pub permission_id: Uuid,
    pub granted: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRoleRequest {
    pub role_id: Uuid,
    pub permission_ids: Vec<Uuid>,
    pub grant_all: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResourceRequest {
    pub resource: String,
    pub grant_all: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeRequest {
    pub retention_days: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFieldPermissionRequest {
    pub role_id: Uuid,
    pub table_name: String,
    pub field_name: String,
    pub can_read: bool,
    pub can_write: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub role_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDirectPermissionRequest {
    pub permission_id: Uuid,
    pub granted: bool,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "rbac-service"
    }))
}

/// Synchronize the route manifest into the permission catalog
pub async fn sync_routes(State(state): State<AppState>) -> Result<impl IntoResponse, RbacError> {
    let report = state.synchronizer.sync(&state.manifest).await?;

    Ok(Json(json!({ "syncedCount": report.synced_count })))
}

/// Deactivate stale permissions and re-sync the live routes
pub async fn cleanup_routes(State(state): State<AppState>) -> Result<impl IntoResponse, RbacError> {
    let report = state.synchronizer.cleanup(&state.manifest).await?;

    Ok(Json(report))
}

/// Purge inactive permissions older than the retention window
pub async fn purge_permissions(
    State(state): State<AppState>,
    Json(payload): Json<PurgeRequest>,
) -> Result<impl IntoResponse, RbacError> {
    let purged = state
        .synchronizer
        .purge_inactive(payload.retention_days)
        .await?;

    Ok(Json(json!({ "purgedCount": purged })))
}

/// Active permissions grouped by resource
pub async fn grouped_permissions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, RbacError> {
    let groups = state.catalog.grouped_by_resource().await?;

    Ok(Json(groups))
}

/// Export roles, permissions, and the grouped view in one bundle
pub async fn export_catalog(State(state): State<AppState>) -> Result<impl IntoResponse, RbacError> {
    let bundle = state.catalog.export().await?;

    Ok(Json(bundle))
}

/// Every permission row, active or not
pub async fn list_permissions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, RbacError> {
    let permissions = state.permissions.list_all().await?;

    Ok(Json(permissions))
}

/// Get a permission by ID
pub async fn get_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, RbacError> {
    let permission = state
        .permissions
        .find_by_id(id)
        .await?
        .ok_or_else(|| RbacError::NotFound(format!("Permission {}", id)))?;

    Ok(Json(permission))
}

/// Active permissions of one resource
pub async fn resource_permissions(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<impl IntoResponse, RbacError> {
    validate_resource(&resource).map_err(RbacError::Validation)?;

    let permissions = state.permissions.active_for_resource(&resource).await?;

    Ok(Json(permissions))
}

/// Create a new role
pub async fn create_role(
    State(state): State<AppState>,
    Json(payload): Json<NewRole>,
) -> Result<impl IntoResponse, RbacError> {
    validate_role_name(&payload.name).map_err(RbacError::Validation)?;

    if payload.display_name.trim().is_empty() {
        return Err(RbacError::Validation(
            "displayName is required".to_string(),
        ));
    }

    let role = state.roles.create(&payload).await?;

    Ok((axum::http::StatusCode::CREATED, Json(role)))
}

/// Get a role by ID
pub async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, RbacError> {
    let role = state
        .roles
        .find_by_id(id)
        .await?
        .ok_or_else(|| RbacError::NotFound(format!("Role {}", id)))?;

    Ok(Json(role))
}

/// Get all roles
pub async fn list_roles(State(state): State<AppState>) -> Result<impl IntoResponse, RbacError> {
    let roles = state.roles.list().await?;

    Ok(Json(roles))
}

/// Grant or revoke a single permission for a role
pub async fn set_role_permission(
    State(state): State<AppState>,
    Json(payload): Json<SetRolePermissionRequest>,
) -> Result<impl IntoResponse, RbacError> {
    if payload.granted {
        state
            .grants
            .grant(payload.role_id, payload.permission_id)
            .await?;
    } else {
        state
            .grants
            .revoke(payload.role_id, payload.permission_id)
            .await?;
    }

    Ok(Json(StatusResponse {
        success: true,
        message: if payload.granted {
            "Permission granted".to_string()
        } else {
            "Permission revoked".to_string()
        },
    }))
}

/// Bulk grant or revoke a list of permissions for one role
pub async fn bulk_update_role(
    State(state): State<AppState>,
    Json(payload): Json<BulkRoleRequest>,
) -> Result<impl IntoResponse, RbacError> {
    let updated = state
        .grants
        .bulk_set_for_role(payload.role_id, &payload.permission_ids, payload.grant_all)
        .await?;

    Ok(Json(StatusResponse {
        success: true,
        message: format!(
            "{} permissions {}",
            updated,
            if payload.grant_all { "granted" } else { "revoked" }
        ),
    }))
}

/// Bulk grant or revoke one resource's permissions across every role
pub async fn bulk_update_resource(
    State(state): State<AppState>,
    Json(payload): Json<BulkResourceRequest>,
) -> Result<impl IntoResponse, RbacError> {
    validate_resource(&payload.resource).map_err(RbacError::Validation)?;

    let roles_updated = state
        .grants
        .bulk_set_for_resource(&payload.resource, payload.grant_all)
        .await?;

    Ok(Json(StatusResponse {
        success: true,
        message: format!("{} roles updated", roles_updated),
    }))
}

/// The full grant matrix, one query for the whole grid
pub async fn permission_matrix(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, RbacError> {
    let matrix = state.grants.matrix().await?;

    Ok(Json(matrix))
}

/// Upsert one field-level permission row
pub async fn set_field_permission(
    State(state): State<AppState>,
    Json(payload): Json<SetFieldPermissionRequest>,
) -> Result<impl IntoResponse, RbacError> {
    validate_sql_identifier(&payload.table_name)
        .map_err(|msg| RbacError::Validation(format!("tableName: {}", msg)))?;
    validate_sql_identifier(&payload.field_name)
        .map_err(|msg| RbacError::Validation(format!("fieldName: {}", msg)))?;

    state
        .field_permissions
        .set(
            payload.role_id,
            &payload.table_name,
            &payload.field_name,
            FieldAccess {
                can_read: payload.can_read,
                can_write: payload.can_write,
            },
        )
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// Explicit field flags of one role on one table
pub async fn get_field_permissions(
    State(state): State<AppState>,
    Path((role_id, table)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, RbacError> {
    validate_sql_identifier(&table)
        .map_err(|msg| RbacError::Validation(format!("table: {}", msg)))?;

    let permissions = state
        .field_permissions
        .permissions_for(role_id, &table)
        .await?;

    Ok(Json(permissions))
}

/// All live columns of all non-system tables
pub async fn list_columns(State(state): State<AppState>) -> Result<impl IntoResponse, RbacError> {
    let tables = state.field_permissions.live_columns().await?;

    Ok(Json(tables))
}

/// Assign a role to a user
pub async fn assign_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AssignRoleRequest>,
) -> Result<impl IntoResponse, RbacError> {
    state.users.assign_role(user_id, payload.role_id).await?;

    Ok(Json(StatusResponse {
        success: true,
        message: "Role assigned".to_string(),
    }))
}

/// Get all users
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, RbacError> {
    let users = state.users.list().await?;

    Ok(Json(users))
}

/// Remove a role from a user
pub async fn remove_user_role(
    State(state): State<AppState>,
    Path((user_id, role_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, RbacError> {
    state.users.remove_role(user_id, role_id).await?;

    Ok(Json(StatusResponse {
        success: true,
        message: "Role removed".to_string(),
    }))
}

/// Grant or revoke a permission directly on a user, bypassing roles
pub async fn set_direct_permission(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SetDirectPermissionRequest>,
) -> Result<impl IntoResponse, RbacError> {
    if payload.granted {
        state
            .users
            .grant_direct(user_id, payload.permission_id)
            .await?;
    } else {
        state
            .users
            .revoke_direct(user_id, payload.permission_id)
            .await?;
    }

    Ok(Json(StatusResponse {
        success: true,
        message: if payload.granted {
            "Permission granted".to_string()
        } else {
            "Permission revoked".to_string()
        },
    }))
}

/// The user's effective permission names, role grants unioned with direct grants
pub async fn user_permissions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, RbacError> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| RbacError::NotFound(format!("User {}", user_id)))?;

    let names = state.users.effective_permission_names(user_id).await?;

    Ok(Json(names))
}
