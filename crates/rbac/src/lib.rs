//! # Directory RBAC
//!
//! Role-based access control on top of directory ACLs.
//!
//! ## Components
//!
//! - `RoleCatalog` - Immutable role definitions and the action → roles index
//! - `RightsAggregator` - Effective rights from transitive membership and ACEs
//! - `AuthorizationEngine` - First-match role checks against effective rights
//! - `RoleAdministrator` - Role grants and revocations as allow entries
//! - `RoleManager` - The capability handlers call, permissive or catalog-backed

pub mod authorization;
pub mod rights_aggregator;
pub mod role_administrator;
pub mod role_catalog;
pub mod role_manager;

pub use authorization::AuthorizationEngine;
pub use rights_aggregator::{aggregate, RightsAggregator, RightsBreakdown};
pub use role_administrator::RoleAdministrator;
pub use role_catalog::RoleCatalog;
pub use role_manager::{build_role_manager, CatalogRoleManager, PermissiveRoleManager, RoleManager};
