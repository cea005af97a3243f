//! Field-level permission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-role, per-table, per-field read/write flags
///
/// Unique on `(role_id, table_name, field_name)`. Orthogonal to route
/// permissions: governs column visibility, not endpoint access.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FieldPermission {
    pub id: Uuid,
    pub role_id: Uuid,
    pub table_name: String,
    pub field_name: String,
    pub can_read: bool,
    pub can_write: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read/write flags for one field; the default is deny on both sides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAccess {
    pub can_read: bool,
    pub can_write: bool,
}
