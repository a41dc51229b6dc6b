//! # Directory RBAC Authz
//!
//! Integration layer hosts embed: one [`AccessControl`] built from the role
//! configuration, backed by any [`shared::Directory`] adapter.

mod access_control;

pub use access_control::{
    AccessControl, BatchEntry, CheckOutcome, DEFAULT_CHECK_TIMEOUT, DEFAULT_MAX_CONCURRENT_CHECKS,
};

// Re-export dependencies
pub use audit::{AuditEntry, AuditEventType, AuditStats};
pub use rbac::{build_role_manager, CatalogRoleManager, PermissiveRoleManager, RoleManager};
pub use shared::{ActionFlag, AuthzError, DirectoryRights, EngineKind, ErrorKind, RoleConfig};
