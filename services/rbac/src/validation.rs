//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate a role name (snake_case identifier)
pub fn validate_role_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Role name is required".to_string());
    }

    if name.len() > 64 {
        return Err("Role name must be at most 64 characters long".to_string());
    }

    static ROLE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = ROLE_NAME_REGEX.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9_]*$").expect("Failed to compile role name regex")
    });

    if !regex.is_match(name) {
        return Err(
            "Role name must start with a letter and contain only lowercase letters, numbers, and underscores"
                .to_string(),
        );
    }

    Ok(())
}

/// Validate a SQL identifier (table or column name) coming from a request
pub fn validate_sql_identifier(identifier: &str) -> Result<(), String> {
    if identifier.is_empty() {
        return Err("Identifier is required".to_string());
    }

    if identifier.len() > 63 {
        return Err("Identifier must be at most 63 characters long".to_string());
    }

    static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = IDENTIFIER_REGEX.get_or_init(|| {
        Regex::new(r"^[a-z_][a-z0-9_]*$").expect("Failed to compile identifier regex")
    });

    if !regex.is_match(identifier) {
        return Err(
            "Identifier must contain only lowercase letters, numbers, and underscores".to_string(),
        );
    }

    Ok(())
}

/// Validate a resource token used in bulk grant/revoke requests
pub fn validate_resource(resource: &str) -> Result<(), String> {
    if resource.is_empty() {
        return Err("Resource is required".to_string());
    }

    static RESOURCE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = RESOURCE_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").expect("Failed to compile resource regex")
    });

    if !regex.is_match(resource) {
        return Err("Invalid resource name".to_string());
    }

    Ok(())
}
