//! Permission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named `(resource, action)` capability, optionally backed by a live route
///
/// `name` is derived deterministically from `(resource, action)` and is the
/// natural key for upsert. `is_active=false` marks a permission whose route
/// no longer exists; the row is kept for audit and existing role grants.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub resource: String,
    pub action: String,
    pub uri: Option<String>,
    pub method: Option<String>,
    pub symbolic_name: Option<String>,
    pub is_api_route: bool,
    pub is_active: bool,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
