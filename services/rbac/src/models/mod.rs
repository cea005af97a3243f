//! Data models for the RBAC service

pub mod field_permission;
pub mod permission;
pub mod role;
pub mod user;

pub use field_permission::{FieldAccess, FieldPermission};
pub use permission::Permission;
pub use role::{NewRole, Role};
pub use user::{NewUser, User};
