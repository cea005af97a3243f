//! Repositories for database operations

pub mod field_permissions;
pub mod grants;
pub mod permissions;
pub mod roles;
pub mod users;

pub use field_permissions::FieldPermissionRepository;
pub use grants::RolePermissionRepository;
pub use permissions::PermissionRepository;
pub use roles::RoleRepository;
pub use users::UserRepository;
