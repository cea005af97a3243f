//! Field-level overlay helpers for the serialization boundary
//!
//! The overlay is deny-by-default: a field with no explicit row can be
//! neither read nor written. These helpers are pure so the serialization
//! layer can apply them without touching the database again.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::{RbacError, RbacResult};
use crate::models::FieldAccess;

/// Access for one field; missing rows fall back to the deny default
pub fn access_for(permissions: &HashMap<String, FieldAccess>, field: &str) -> FieldAccess {
    permissions.get(field).copied().unwrap_or_default()
}

/// Remove every field the role may not read from a serialized record
pub fn redact_unreadable(record: &mut Map<String, Value>, permissions: &HashMap<String, FieldAccess>) {
    record.retain(|field, _| access_for(permissions, field).can_read);
}

/// Reject an incoming record touching any field the role may not write
///
/// The validation error names every offending field, sorted, so one round
/// trip surfaces the full list.
pub fn check_writable(
    record: &Map<String, Value>,
    permissions: &HashMap<String, FieldAccess>,
) -> RbacResult<()> {
    let mut denied: Vec<String> = record
        .keys()
        .filter(|field| !access_for(permissions, field).can_write)
        .cloned()
        .collect();

    if denied.is_empty() {
        Ok(())
    } else {
        denied.sort();
        Err(RbacError::Validation(format!(
            "Fields not writable: {}",
            denied.join(", ")
        )))
    }
}
