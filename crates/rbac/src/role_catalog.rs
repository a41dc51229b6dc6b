//! RoleCatalog - Immutable role definitions and the action index

use shared::{
    require_input, ActionFlag, AuthzError, Result, Role, RoleConfig, RoleNotFoundError,
};
use std::collections::HashMap;
use tracing::info;

/// Role definitions plus a precomputed action → roles index.
///
/// Built once and never mutated, so a shared `Arc<RoleCatalog>` can be read
/// from any number of threads without locking.
#[derive(Debug, Clone, Default)]
pub struct RoleCatalog {
    /// All registered roles
    roles: HashMap<String, Role>,
    /// Role names in declaration order
    order: Vec<String>,
    /// Action → role names, declaration order first, then inherited grants
    action_index: HashMap<ActionFlag, Vec<String>>,
}

impl RoleCatalog {
    /// Build a catalog from roles in declaration order
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Result<Self> {
        let mut catalog = Self::default();

        for role in roles {
            require_input("role name", &role.name)?;
            if catalog.roles.contains_key(&role.name) {
                return Err(AuthzError::Config(format!("duplicate role name '{}'", role.name)));
            }
            catalog.order.push(role.name.clone());
            catalog.roles.insert(role.name.clone(), role);
        }

        catalog.validate_parents()?;
        catalog.index_actions();

        info!(roles = catalog.order.len(), "role catalog built");
        Ok(catalog)
    }

    /// Build a catalog from a configuration document
    pub fn from_config(config: &RoleConfig) -> Result<Self> {
        Self::new(config.to_roles()?)
    }

    fn validate_parents(&self) -> Result<()> {
        for name in &self.order {
            let role = &self.roles[name];
            if let Some(missing) = role.extends_roles.iter().find(|p| !self.roles.contains_key(*p)) {
                return Err(AuthzError::Config(format!(
                    "role '{}' extends unknown role '{}'",
                    name, missing
                )));
            }
        }
        Ok(())
    }

    fn index_actions(&mut self) {
        for action in ActionFlag::each() {
            let names: Vec<String> = self
                .order
                .iter()
                .filter(|name| self.roles[*name].allows_action(action))
                .cloned()
                .collect();
            self.action_index.insert(action, names);
        }

        // One level only: a child picks up its parents' own actions,
        // not what the parents inherit in turn.
        for name in &self.order {
            let role = &self.roles[name];
            for parent in &role.extends_roles {
                let Some(parent) = self.roles.get(parent) else {
                    continue;
                };
                for action in parent.allowed_actions.iter() {
                    let entry = self.action_index.entry(action).or_default();
                    if !entry.contains(name) {
                        entry.push(name.clone());
                    }
                }
            }
        }
    }

    /// Role names permitting `action`, in priority order.
    ///
    /// Sentinels and multi-bit combinations match nothing.
    pub fn roles_allowing_action(&self, action: ActionFlag) -> &[String] {
        self.action_index
            .get(&action)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Get a role by name
    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    /// Get a role by name or fail with the list of known roles
    pub fn require_role(&self, name: &str) -> Result<&Role> {
        require_input("role name", name)?;
        self.roles.get(name).ok_or_else(|| {
            RoleNotFoundError {
                role: name.to_string(),
                available_roles: self.order.clone(),
            }
            .into()
        })
    }

    /// Check if role exists
    pub fn contains(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    /// All role names in declaration order
    pub fn role_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
