//! Configuration types for the RBAC engine

use crate::action::ActionFlag;
use crate::error::{AuthzError, Result};
use crate::rights::DirectoryRights;
use crate::role::Role;
use bitflags::Flags;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A flag value as written in a configuration document.
///
/// Accepts a raw bit value (`48`), flag text (`"READ_PROPERTY | WRITE_PROPERTY"`
/// or `"0x30"`), or a list of flag names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagSpec {
    Bits(u32),
    Text(String),
    Names(Vec<String>),
}

impl Default for FlagSpec {
    fn default() -> Self {
        FlagSpec::Bits(0)
    }
}

impl From<u32> for FlagSpec {
    fn from(bits: u32) -> Self {
        FlagSpec::Bits(bits)
    }
}

impl FlagSpec {
    /// Parse into a flag type.
    ///
    /// With `strict`, numeric values carrying undefined bits are rejected.
    fn parse<F>(&self, role: &str, field: &str, strict: bool) -> Result<F>
    where
        F: Flags<Bits = u32>,
    {
        let invalid = |detail: String| {
            AuthzError::Config(format!("role '{}': invalid {}: {}", role, field, detail))
        };

        match self {
            FlagSpec::Bits(bits) if strict => {
                F::from_bits(*bits).ok_or_else(|| invalid(format!("undefined bits in {:#x}", bits)))
            }
            FlagSpec::Bits(bits) => Ok(F::from_bits_retain(*bits)),
            FlagSpec::Text(text) => {
                bitflags::parser::from_str::<F>(text).map_err(|e| invalid(e.to_string()))
            }
            FlagSpec::Names(names) => names.iter().try_fold(F::empty(), |acc, name| {
                F::from_name(name.trim())
                    .map(|flag| acc.union(flag))
                    .ok_or_else(|| invalid(format!("unknown flag '{}'", name)))
            }),
        }
    }
}

/// A role record as written in the configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    pub name: String,

    #[serde(default)]
    pub required_rights: FlagSpec,

    #[serde(default)]
    pub allowed_actions: FlagSpec,

    #[serde(default)]
    pub extends_roles: Vec<String>,
}

impl RoleRecord {
    /// Convert into a typed role
    pub fn to_role(&self) -> Result<Role> {
        let required_rights: DirectoryRights =
            self.required_rights.parse(&self.name, "requiredRights", false)?;
        let allowed_actions: ActionFlag =
            self.allowed_actions.parse(&self.name, "allowedActions", true)?;

        Ok(Role {
            name: self.name.clone(),
            required_rights,
            allowed_actions,
            extends_roles: self.extends_roles.clone(),
        })
    }
}

/// Which capability implementation the host runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Every check passes; administration is a no-op
    Permissive,
    /// Checks run against the role catalog and directory ACLs
    #[default]
    Catalog,
}

/// Top-level RBAC configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleConfig {
    #[serde(default)]
    pub engine: EngineKind,

    /// Roles in declaration (priority) order
    #[serde(default)]
    pub roles: Vec<RoleRecord>,

    /// Maximum retained audit entries
    pub audit_capacity: Option<usize>,

    /// Per-check bound on directory calls in batch authorization
    pub check_timeout_ms: Option<u64>,

    /// Most batch checks allowed on the blocking pool at once
    pub max_concurrent_checks: Option<usize>,
}

impl RoleConfig {
    /// Load configuration from a JSON or YAML file (chosen by extension)
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        if is_yaml {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Typed roles in declaration order
    pub fn to_roles(&self) -> Result<Vec<Role>> {
        self.roles.iter().map(RoleRecord::to_role).collect()
    }

    /// Get role names
    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_config_parse_numeric() {
        let json = r#"{
            "roles": [
                { "name": "Reader", "requiredRights": 16, "allowedActions": 1 },
                { "name": "Writer", "requiredRights": 48, "allowedActions": 5, "extendsRoles": ["Reader"] }
            ]
        }"#;

        let config = RoleConfig::from_json(json).unwrap();
        assert_eq!(config.engine, EngineKind::Catalog);
        assert_eq!(config.role_names(), vec!["Reader", "Writer"]);

        let roles = config.to_roles().unwrap();
        assert_eq!(roles[1].required_rights, DirectoryRights::READ_PROPERTY | DirectoryRights::WRITE_PROPERTY);
        assert_eq!(roles[1].allowed_actions, ActionFlag::GET | ActionFlag::MODIFY);
        assert_eq!(roles[1].extends_roles, vec!["Reader".to_string()]);
    }

    #[test]
    fn test_config_parse_yaml_names() {
        let yaml = r#"
engine: permissive
auditCapacity: 50
roles:
  - name: HelpDesk
    requiredRights: [READ_PROPERTY, WRITE_PROPERTY]
    allowedActions: "GET | MODIFY | ADD_TO_GROUP"
"#;

        let config = RoleConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.engine, EngineKind::Permissive);
        assert_eq!(config.audit_capacity, Some(50));
        assert_eq!(config.max_concurrent_checks, None);

        let role = config.roles[0].to_role().unwrap();
        assert!(role.allowed_actions.contains(ActionFlag::ADD_TO_GROUP));
        assert!(role.required_rights.contains(DirectoryRights::WRITE_PROPERTY));
    }

    #[test]
    fn test_unknown_flag_name_rejected() {
        let record = RoleRecord {
            name: "Broken".to_string(),
            required_rights: FlagSpec::Names(vec!["READ_EVERYTHING".to_string()]),
            allowed_actions: FlagSpec::Bits(1),
            extends_roles: Vec::new(),
        };

        let err = record.to_role().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
        assert!(err.to_string().contains("READ_EVERYTHING"));
    }

    #[test]
    fn test_undefined_action_bits_rejected() {
        let record = RoleRecord {
            name: "Broken".to_string(),
            required_rights: FlagSpec::Bits(0x10),
            allowed_actions: FlagSpec::Bits(1 << 20),
            extends_roles: Vec::new(),
        };

        assert_eq!(record.to_role().unwrap_err().kind(), ErrorKind::ConfigError);
    }

    #[test]
    fn test_undefined_rights_bits_retained() {
        let record = RoleRecord {
            name: "Raw".to_string(),
            required_rights: FlagSpec::Bits(0x200 | 0x10),
            allowed_actions: FlagSpec::Bits(1),
            extends_roles: Vec::new(),
        };

        assert_eq!(record.to_role().unwrap().required_rights.bits(), 0x210);
    }

    #[test]
    fn test_from_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "roles:\n  - name: Reader\n    requiredRights: 16\n    allowedActions: 1").unwrap();

        let config = RoleConfig::from_file(file.path()).unwrap();
        assert_eq!(config.role_names(), vec!["Reader"]);
    }

    #[test]
    fn test_from_file_missing() {
        let err = RoleConfig::from_file(Path::new("/nonexistent/roles.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }
}
