//! Custom error types for the RBAC service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the RBAC service
///
/// Name-collision conflicts during sync are resolved internally by upsert
/// and never surface here.
#[derive(Error, Debug)]
pub enum RbacError {
    /// Malformed or missing request fields
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unknown role, permission, or resource
    #[error("{0} not found")]
    NotFound(String),

    /// Bad or unsupported route manifest
    #[error("Route manifest error: {0}")]
    Manifest(String),

    /// A multi-row mutation failed; all writes in the call were rolled back
    #[error("Transaction aborted: {0}")]
    Transaction(#[source] sqlx::Error),

    /// Single-statement database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Infrastructure-level database failure
    #[error("Database error: {0}")]
    Infrastructure(#[from] common::error::DatabaseError),
}

impl IntoResponse for RbacError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            RbacError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RbacError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            RbacError::Manifest(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Route manifest error: {}", msg),
            ),
            RbacError::Transaction(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Transaction aborted: {}", e),
            ),
            RbacError::Database(_) | RbacError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for RBAC results
pub type RbacResult<T> = Result<T, RbacError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let response = RbacError::Validation("roleId is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = RbacError::NotFound("Role".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_transaction_maps_to_500() {
        let response = RbacError::Transaction(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
