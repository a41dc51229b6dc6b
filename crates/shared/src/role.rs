//! Role definition types

use crate::action::ActionFlag;
use crate::rights::DirectoryRights;
use serde::{Deserialize, Serialize};

/// A named bundle of required rights and permitted actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Unique role name (e.g., 'Reader', 'HelpDesk', 'DomainAdmin')
    pub name: String,

    /// Rights a principal must hold on the target for this role to apply
    pub required_rights: DirectoryRights,

    /// Actions this role permits
    pub allowed_actions: ActionFlag,

    /// Parent roles whose actions this role also permits
    #[serde(default)]
    pub extends_roles: Vec<String>,
}

impl Role {
    /// Create a role that requires nothing and permits nothing
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_rights: DirectoryRights::empty(),
            allowed_actions: ActionFlag::NONE,
            extends_roles: Vec::new(),
        }
    }

    /// Builder: set required rights
    pub fn with_rights(mut self, rights: DirectoryRights) -> Self {
        self.required_rights = rights;
        self
    }

    /// Builder: set allowed actions
    pub fn with_actions(mut self, actions: ActionFlag) -> Self {
        self.allowed_actions = actions;
        self
    }

    /// Builder: add a parent role
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends_roles.push(parent.into());
        self
    }

    /// Check if this role's own actions include `action`
    pub fn allows_action(&self, action: ActionFlag) -> bool {
        !action.is_empty() && self.allowed_actions.contains(action)
    }

    /// Check if `effective` rights are enough to hold this role
    pub fn is_satisfied_by(&self, effective: DirectoryRights) -> bool {
        effective.satisfies(self.required_rights)
    }
}
