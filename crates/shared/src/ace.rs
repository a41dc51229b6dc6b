//! Access control entry types

use crate::rights::DirectoryRights;
use serde::{Deserialize, Serialize};

/// Whether an entry grants or withholds its rights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessDirection {
    Allow,
    Deny,
}

/// How an entry propagates to child objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InheritanceFlag {
    /// Applies to the object only
    #[default]
    None,
    /// Object and all descendants
    All,
    /// Descendants only
    Descendents,
    /// Object and immediate children
    SelfAndChildren,
    /// Immediate children only
    Children,
}

/// A single allow/deny rule on a target's ACL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlEntry {
    /// SID of the identity the rule applies to
    pub identity_sid: String,

    pub direction: AccessDirection,

    pub rights: DirectoryRights,

    #[serde(default)]
    pub inheritance_flag: InheritanceFlag,

    /// Set when the entry was inherited from a parent object
    #[serde(default)]
    pub is_inherited: bool,
}

impl AccessControlEntry {
    /// Create an explicit (non-inherited) allow entry
    pub fn allow(identity_sid: impl Into<String>, rights: DirectoryRights) -> Self {
        Self {
            identity_sid: identity_sid.into(),
            direction: AccessDirection::Allow,
            rights,
            inheritance_flag: InheritanceFlag::None,
            is_inherited: false,
        }
    }

    /// Create an explicit (non-inherited) deny entry
    pub fn deny(identity_sid: impl Into<String>, rights: DirectoryRights) -> Self {
        Self {
            direction: AccessDirection::Deny,
            ..Self::allow(identity_sid, rights)
        }
    }

    /// Builder: mark as inherited from a parent object
    pub fn inherited(mut self) -> Self {
        self.is_inherited = true;
        self
    }

    /// Builder: set inheritance flag
    pub fn with_inheritance(mut self, flag: InheritanceFlag) -> Self {
        self.inheritance_flag = flag;
        self
    }

    /// True when this entry carries the same rule, ignoring where it came from
    pub fn same_rule(&self, rule: &AceRule) -> bool {
        self.identity_sid == rule.identity_sid
            && self.rights == rule.rights
            && self.direction == rule.direction
            && self.inheritance_flag == rule.inheritance_flag
    }
}

/// The identifying tuple used to add or remove an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AceRule {
    pub identity_sid: String,
    pub rights: DirectoryRights,
    pub direction: AccessDirection,
    pub inheritance_flag: InheritanceFlag,
}

impl From<&AceRule> for AccessControlEntry {
    fn from(rule: &AceRule) -> Self {
        Self {
            identity_sid: rule.identity_sid.clone(),
            direction: rule.direction,
            rights: rule.rights,
            inheritance_flag: rule.inheritance_flag,
            is_inherited: false,
        }
    }
}
