//! Directory collaborator ports
//!
//! These traits describe what the engine needs from the backing directory,
//! not how it is reached. Adapters translate their own failures into
//! [`AuthzError`](crate::AuthzError) before returning.
//!
//! ```text
//! Engine (rbac)            │  Adapters
//! ─────────────────────────┼──────────────────────────
//! trait PrincipalResolver  │  InMemoryDirectory
//! trait MembershipResolver │  LDAP / AD bindings
//! trait AclReader          │
//! trait AclWriter          │
//! ```

use crate::ace::{AccessControlEntry, AceRule};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A principal after resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPrincipal {
    pub sid: String,
    pub name: String,
}

/// Kind of directory object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectKind {
    User,
    Group,
    OrganizationalUnit,
    Computer,
    Other(String),
}

impl ObjectKind {
    /// Whether the rights model covers this kind
    pub fn is_supported(&self) -> bool {
        !matches!(self, ObjectKind::Other(_))
    }
}

/// A target object after resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryObject {
    /// Stable identity used for ACL reads and writes
    pub id: String,
    pub distinguished_name: String,
    pub kind: ObjectKind,
}

/// Resolves name, DN, UPN, SID, or GUID forms to a principal
pub trait PrincipalResolver: Send + Sync {
    /// `Ok(None)` when the identity does not resolve
    fn resolve(&self, identity: &str) -> Result<Option<ResolvedPrincipal>>;
}

/// Resolves transitive group membership
pub trait MembershipResolver: Send + Sync {
    /// Every group SID the principal belongs to, nested groups included
    fn resolve_groups(&self, principal: &ResolvedPrincipal) -> Result<HashSet<String>>;
}

/// Read side of a target's ACL
pub trait AclReader: Send + Sync {
    /// `Ok(None)` when the target does not resolve
    fn resolve_target(&self, identity: &str) -> Result<Option<DirectoryObject>>;

    /// Entries on the target in ACL order
    fn read_aces(&self, target: &DirectoryObject, include_inherited: bool) -> Result<Vec<AccessControlEntry>>;
}

/// Write side of a target's ACL
pub trait AclWriter: Send + Sync {
    fn add_ace(&self, target: &DirectoryObject, rule: &AceRule) -> Result<()>;

    /// Returns `false` when no explicit entry matched `rule`
    fn remove_ace(&self, target: &DirectoryObject, rule: &AceRule) -> Result<bool>;
}

/// Everything the engine needs from one directory
pub trait Directory: PrincipalResolver + MembershipResolver + AclReader + AclWriter {}

impl<T> Directory for T where T: PrincipalResolver + MembershipResolver + AclReader + AclWriter {}
