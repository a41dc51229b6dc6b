//! RightsAggregator - Effective rights from group membership and ACLs

use shared::{
    require_input, AccessControlEntry, AccessDirection, AuthzError, Directory, DirectoryObject,
    DirectoryRights, ResolvedPrincipal, Result,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Allow and deny bits collected for one principal before deny-override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RightsBreakdown {
    pub allow: DirectoryRights,
    pub deny: DirectoryRights,
}

impl RightsBreakdown {
    /// Allow bits with overlapping deny bits cancelled
    pub fn effective(&self) -> DirectoryRights {
        DirectoryRights::resolve(self.allow, self.deny)
    }
}

/// Aggregate ACEs against a membership set.
///
/// Entries sharing an identity are OR-ed together per direction; only
/// identities in `groups` contribute.
pub fn aggregate(groups: &HashSet<String>, aces: &[AccessControlEntry]) -> RightsBreakdown {
    let mut allow_by_sid: HashMap<&str, DirectoryRights> = HashMap::new();
    let mut deny_by_sid: HashMap<&str, DirectoryRights> = HashMap::new();

    for ace in aces {
        let bucket = match ace.direction {
            AccessDirection::Allow => &mut allow_by_sid,
            AccessDirection::Deny => &mut deny_by_sid,
        };
        *bucket.entry(ace.identity_sid.as_str()).or_insert_with(DirectoryRights::empty) |= ace.rights;
    }

    let collect = |bucket: &HashMap<&str, DirectoryRights>| {
        groups
            .iter()
            .filter_map(|sid| bucket.get(sid.as_str()))
            .fold(DirectoryRights::empty(), |acc, rights| acc | *rights)
    };

    RightsBreakdown {
        allow: collect(&allow_by_sid),
        deny: collect(&deny_by_sid),
    }
}

/// Resolve a principal identity or fail `DoesNotExist`
pub(crate) fn resolve_principal(directory: &dyn Directory, identity: &str) -> Result<ResolvedPrincipal> {
    require_input("principal", identity)?;
    directory
        .resolve(identity)?
        .ok_or_else(|| AuthzError::principal_not_found(identity))
}

/// Resolve a target identity or fail `DoesNotExist` / `NotSupported`
pub(crate) fn resolve_target(directory: &dyn Directory, identity: &str) -> Result<DirectoryObject> {
    require_input("target", identity)?;
    let object = directory
        .resolve_target(identity)?
        .ok_or_else(|| AuthzError::target_not_found(identity))?;

    if !object.kind.is_supported() {
        return Err(AuthzError::NotSupported(format!(
            "object '{}' of kind {:?} is not covered by the rights model",
            object.distinguished_name, object.kind
        )));
    }
    Ok(object)
}

/// Computes a principal's effective rights on a target.
///
/// Every call re-reads membership and ACL state; nothing is cached.
#[derive(Clone)]
pub struct RightsAggregator {
    directory: Arc<dyn Directory>,
}

impl RightsAggregator {
    /// Create a new RightsAggregator
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    /// Effective rights of `principal` on `target`
    pub fn compute_effective_rights(&self, principal: &str, target: &str) -> Result<DirectoryRights> {
        Ok(self.breakdown(principal, target)?.effective())
    }

    /// Allow and deny bits of `principal` on `target`
    pub fn breakdown(&self, principal: &str, target: &str) -> Result<RightsBreakdown> {
        let resolved = resolve_principal(self.directory.as_ref(), principal)?;
        let object = resolve_target(self.directory.as_ref(), target)?;

        let groups = self.directory.resolve_groups(&resolved)?;
        let aces = self.directory.read_aces(&object, true)?;
        let breakdown = aggregate(&groups, &aces);

        debug!(
            principal = %resolved.sid,
            target = %object.id,
            groups = groups.len(),
            aces = aces.len(),
            allow = %breakdown.allow,
            deny = %breakdown.deny,
            effective = %breakdown.effective(),
            "computed effective rights"
        );
        Ok(breakdown)
    }
}

impl std::fmt::Debug for RightsAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RightsAggregator").finish_non_exhaustive()
    }
}
