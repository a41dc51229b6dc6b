//! AuthorizationEngine - Role matching against effective rights

use crate::rights_aggregator::RightsAggregator;
use crate::role_catalog::RoleCatalog;
use shared::{ActionFlag, Directory, DirectoryRights, NotAllowedError, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// Answers "can this principal perform this action on this target".
///
/// Roles permitting the action are tried in catalog priority order and the
/// first one whose required rights are covered wins; nothing is aggregated
/// across roles.
#[derive(Debug, Clone)]
pub struct AuthorizationEngine {
    catalog: Arc<RoleCatalog>,
    aggregator: RightsAggregator,
}

impl AuthorizationEngine {
    /// Create a new AuthorizationEngine
    pub fn new(catalog: Arc<RoleCatalog>, directory: Arc<dyn Directory>) -> Self {
        Self {
            catalog,
            aggregator: RightsAggregator::new(directory),
        }
    }

    /// The catalog this engine checks against
    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    /// The aggregator this engine computes rights with
    pub fn aggregator(&self) -> &RightsAggregator {
        &self.aggregator
    }

    /// First role permitting `action` that `effective` rights qualify for
    pub fn first_satisfied(&self, action: ActionFlag, effective: DirectoryRights) -> Option<&str> {
        self.catalog
            .roles_allowing_action(action)
            .iter()
            .filter_map(|name| self.catalog.role(name))
            .find(|role| role.is_satisfied_by(effective))
            .map(|role| role.name.as_str())
    }

    /// Name of the role that would authorize the request, if any
    pub fn matching_role(&self, principal: &str, action: ActionFlag, target: &str) -> Result<Option<&str>> {
        let effective = self.aggregator.compute_effective_rights(principal, target)?;
        let matched = self.first_satisfied(action, effective);

        debug!(principal, target, %action, %effective, role = ?matched, "role match");
        Ok(matched)
    }

    /// Check if `principal` may perform `action` on `target`.
    ///
    /// Returns `Ok(false)` when no role qualifies; resolution and directory
    /// failures are errors.
    pub fn can_perform_action(&self, principal: &str, action: ActionFlag, target: &str) -> Result<bool> {
        Ok(self.matching_role(principal, action, target)?.is_some())
    }

    /// Like [`can_perform_action`](Self::can_perform_action) but fails `NotAllowed` on denial
    pub fn can_perform_action_or_error(&self, principal: &str, action: ActionFlag, target: &str) -> Result<()> {
        if self.can_perform_action(principal, action, target)? {
            return Ok(());
        }

        warn!(principal, target, %action, "action not allowed");
        Err(NotAllowedError::new(principal, action, target).into())
    }

    /// Check if `principal` holds the rights of `role` on `target`
    pub fn has_role(&self, principal: &str, role: &str, target: &str) -> Result<bool> {
        let role = self.catalog.require_role(role)?;
        let effective = self.aggregator.compute_effective_rights(principal, target)?;
        Ok(role.is_satisfied_by(effective))
    }
}
