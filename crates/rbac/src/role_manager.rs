//! RoleManager - The authorization capability consumed by handlers
//!
//! # Architecture
//!
//! ```text
//! RoleManager (trait)               <- what handlers call
//!        │
//!        ├── PermissiveRoleManager  <- always allows, administration is a no-op
//!        └── CatalogRoleManager     <- RoleCatalog + AuthorizationEngine + RoleAdministrator
//! ```
//!
//! The variant is chosen once at startup from [`RoleConfig::engine`] via
//! [`build_role_manager`]; call sites never change.

use crate::authorization::AuthorizationEngine;
use crate::role_administrator::RoleAdministrator;
use crate::role_catalog::RoleCatalog;
use shared::{ActionFlag, Directory, EngineKind, NotAllowedError, Result, RoleConfig};
use std::sync::Arc;
use tracing::info;

/// Authorization and role administration capability
pub trait RoleManager: Send + Sync {
    /// Which implementation this is
    fn kind(&self) -> EngineKind;

    /// Grant `role` to `principal` on `target`
    fn add_role(&self, principal: &str, role: &str, target: &str) -> Result<()>;

    /// Revoke `role` from `principal` on `target`
    fn remove_role(&self, principal: &str, role: &str, target: &str) -> Result<()>;

    /// Check if `principal` may perform `action` on `target`
    fn can_perform_action(&self, principal: &str, action: ActionFlag, target: &str) -> Result<bool>;

    /// Fails `NotAllowed` when [`can_perform_action`](Self::can_perform_action) is false
    fn can_perform_action_or_error(&self, principal: &str, action: ActionFlag, target: &str) -> Result<()> {
        if self.can_perform_action(principal, action, target)? {
            Ok(())
        } else {
            Err(NotAllowedError::new(principal, action, target).into())
        }
    }

    /// Check if `principal` holds the rights of `role` on `target`
    fn has_role(&self, principal: &str, role: &str, target: &str) -> Result<bool>;

    /// Configured role names
    fn get_roles(&self) -> Vec<String>;
}

/// Allows everything; administration calls succeed without effect
#[derive(Debug, Clone, Default)]
pub struct PermissiveRoleManager {
    role_names: Vec<String>,
}

impl PermissiveRoleManager {
    /// Create a new PermissiveRoleManager
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: role names to report from `get_roles`
    pub fn with_roles(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.role_names = names.into_iter().map(Into::into).collect();
        self
    }
}

impl RoleManager for PermissiveRoleManager {
    fn kind(&self) -> EngineKind {
        EngineKind::Permissive
    }

    fn add_role(&self, _principal: &str, _role: &str, _target: &str) -> Result<()> {
        Ok(())
    }

    fn remove_role(&self, _principal: &str, _role: &str, _target: &str) -> Result<()> {
        Ok(())
    }

    fn can_perform_action(&self, _principal: &str, _action: ActionFlag, _target: &str) -> Result<bool> {
        Ok(true)
    }

    fn has_role(&self, _principal: &str, _role: &str, _target: &str) -> Result<bool> {
        Ok(true)
    }

    fn get_roles(&self) -> Vec<String> {
        self.role_names.clone()
    }
}

/// Checks against the role catalog and the directory's ACLs
#[derive(Debug, Clone)]
pub struct CatalogRoleManager {
    engine: AuthorizationEngine,
    administrator: RoleAdministrator,
}

impl CatalogRoleManager {
    /// Create a new CatalogRoleManager over a fully built catalog
    pub fn new(catalog: RoleCatalog, directory: Arc<dyn Directory>) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            engine: AuthorizationEngine::new(catalog.clone(), directory.clone()),
            administrator: RoleAdministrator::new(catalog, directory),
        }
    }

    /// The underlying authorization engine
    pub fn engine(&self) -> &AuthorizationEngine {
        &self.engine
    }

    /// The underlying role catalog
    pub fn catalog(&self) -> &RoleCatalog {
        self.engine.catalog()
    }
}

impl RoleManager for CatalogRoleManager {
    fn kind(&self) -> EngineKind {
        EngineKind::Catalog
    }

    fn add_role(&self, principal: &str, role: &str, target: &str) -> Result<()> {
        self.administrator.add_role(principal, role, target)
    }

    fn remove_role(&self, principal: &str, role: &str, target: &str) -> Result<()> {
        self.administrator.remove_role(principal, role, target)
    }

    fn can_perform_action(&self, principal: &str, action: ActionFlag, target: &str) -> Result<bool> {
        self.engine.can_perform_action(principal, action, target)
    }

    fn can_perform_action_or_error(&self, principal: &str, action: ActionFlag, target: &str) -> Result<()> {
        self.engine.can_perform_action_or_error(principal, action, target)
    }

    fn has_role(&self, principal: &str, role: &str, target: &str) -> Result<bool> {
        self.engine.has_role(principal, role, target)
    }

    fn get_roles(&self) -> Vec<String> {
        self.administrator.get_roles()
    }
}

/// Build the configured capability.
///
/// The catalog is fully constructed before it is shared, so no caller can
/// observe a partially built one.
pub fn build_role_manager(config: &RoleConfig, directory: Arc<dyn Directory>) -> Result<Arc<dyn RoleManager>> {
    let manager: Arc<dyn RoleManager> = match config.engine {
        EngineKind::Permissive => Arc::new(PermissiveRoleManager::new().with_roles(config.role_names())),
        EngineKind::Catalog => {
            let catalog = RoleCatalog::from_config(config)?;
            Arc::new(CatalogRoleManager::new(catalog, directory))
        }
    };

    info!(engine = ?manager.kind(), roles = manager.get_roles().len(), "role manager ready");
    Ok(manager)
}
