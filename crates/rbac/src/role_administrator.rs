//! RoleAdministrator - Grants and revokes roles as concrete ACEs

use crate::rights_aggregator::{resolve_principal, resolve_target};
use crate::role_catalog::RoleCatalog;
use shared::{AccessDirection, AceRule, AuthzError, Directory, InheritanceFlag, Result, Role};
use std::sync::Arc;
use tracing::info;

/// Turns role grants into allow entries on the target's ACL
#[derive(Clone)]
pub struct RoleAdministrator {
    catalog: Arc<RoleCatalog>,
    directory: Arc<dyn Directory>,
}

impl RoleAdministrator {
    /// Create a new RoleAdministrator
    pub fn new(catalog: Arc<RoleCatalog>, directory: Arc<dyn Directory>) -> Self {
        Self { catalog, directory }
    }

    /// The allow entry that represents `role` for `sid`
    fn rule_for(role: &Role, sid: &str) -> AceRule {
        AceRule {
            identity_sid: sid.to_string(),
            rights: role.required_rights,
            direction: AccessDirection::Allow,
            inheritance_flag: InheritanceFlag::None,
        }
    }

    /// Grant `role` to `principal` on `target`.
    ///
    /// The role is resolved first; an unknown role touches nothing.
    pub fn add_role(&self, principal: &str, role: &str, target: &str) -> Result<()> {
        let role = self.catalog.require_role(role)?;
        let resolved = resolve_principal(self.directory.as_ref(), principal)?;
        let object = resolve_target(self.directory.as_ref(), target)?;

        self.directory.add_ace(&object, &Self::rule_for(role, &resolved.sid))?;

        info!(principal = %resolved.sid, role = %role.name, target = %object.id, "role granted");
        Ok(())
    }

    /// Revoke `role` from `principal` on `target`.
    ///
    /// Fails `DoesNotExist` when no matching explicit entry is present.
    pub fn remove_role(&self, principal: &str, role: &str, target: &str) -> Result<()> {
        let role = self.catalog.require_role(role)?;
        let resolved = resolve_principal(self.directory.as_ref(), principal)?;
        let object = resolve_target(self.directory.as_ref(), target)?;

        let removed = self
            .directory
            .remove_ace(&object, &Self::rule_for(role, &resolved.sid))?;
        if !removed {
            return Err(AuthzError::ace_not_found(format!(
                "{} for '{}' on '{}'",
                role.name, resolved.name, object.distinguished_name
            )));
        }

        info!(principal = %resolved.sid, role = %role.name, target = %object.id, "role revoked");
        Ok(())
    }

    /// All configured role names, in declaration order
    pub fn get_roles(&self) -> Vec<String> {
        self.catalog.role_names().into_iter().map(str::to_string).collect()
    }
}

impl std::fmt::Debug for RoleAdministrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleAdministrator")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}
