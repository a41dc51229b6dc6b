//! In-Memory Directory
//!
//! Implements every collaborator port over a lock-protected snapshot.
//! Useful for testing, development, and fixture-driven hosts.

use serde::{Deserialize, Serialize};
use shared::{
    AccessControlEntry, AceRule, AclReader, AclWriter, AuthzError, DirectoryObject,
    MembershipResolver, ObjectKind, PrincipalResolver, ResolvedPrincipal, Result,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::debug;

/// A user, group, or computer account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalEntry {
    pub sid: String,
    pub name: String,
    pub upn: Option<String>,
    pub distinguished_name: Option<String>,
    pub guid: Option<String>,
    /// Direct group memberships (group SIDs)
    #[serde(default)]
    pub member_of: Vec<String>,
}

impl PrincipalEntry {
    pub fn new(sid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            name: name.into(),
            upn: None,
            distinguished_name: None,
            guid: None,
            member_of: Vec::new(),
        }
    }

    /// Builder: add a direct group membership
    pub fn member_of(mut self, group_sid: impl Into<String>) -> Self {
        self.member_of.push(group_sid.into());
        self
    }

    pub fn with_upn(mut self, upn: impl Into<String>) -> Self {
        self.upn = Some(upn.into());
        self
    }

    pub fn with_dn(mut self, dn: impl Into<String>) -> Self {
        self.distinguished_name = Some(dn.into());
        self
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    /// SID and GUID match exactly; name, UPN, and DN ignore case
    fn matches(&self, identity: &str) -> bool {
        self.sid == identity
            || self.guid.as_deref() == Some(identity)
            || self.name.eq_ignore_ascii_case(identity)
            || self.upn.as_deref().is_some_and(|u| u.eq_ignore_ascii_case(identity))
            || self
                .distinguished_name
                .as_deref()
                .is_some_and(|dn| dn.eq_ignore_ascii_case(identity))
    }
}

/// A directory object and its ACL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectEntry {
    #[serde(flatten)]
    pub object: DirectoryObject,
    #[serde(default)]
    pub aces: Vec<AccessControlEntry>,
}

impl ObjectEntry {
    pub fn new(id: impl Into<String>, dn: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            object: DirectoryObject {
                id: id.into(),
                distinguished_name: dn.into(),
                kind,
            },
            aces: Vec::new(),
        }
    }

    /// Builder: append an entry to the ACL
    pub fn with_ace(mut self, ace: AccessControlEntry) -> Self {
        self.aces.push(ace);
        self
    }
}

/// Serializable contents of a directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub principals: Vec<PrincipalEntry>,
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
}

#[derive(Debug, Default)]
struct State {
    principals: Vec<PrincipalEntry>,
    objects: HashMap<String, ObjectEntry>,
}

impl State {
    /// Replaces any principal with the same SID
    fn insert_principal(&mut self, principal: PrincipalEntry) {
        self.principals.retain(|p| p.sid != principal.sid);
        self.principals.push(principal);
    }
}

/// Thread-safe in-memory directory
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: RwLock<State>,
    offline: AtomicBool,
    latency_ms: AtomicU64,
    writes: AtomicUsize,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a snapshot
    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        let mut state = State::default();
        for principal in snapshot.principals {
            state.insert_principal(principal);
        }
        for object in snapshot.objects {
            state.objects.insert(object.object.id.clone(), object);
        }
        Self {
            state: RwLock::new(state),
            ..Self::default()
        }
    }

    /// Load a JSON snapshot file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: DirectorySnapshot = serde_json::from_str(&content)?;
        debug!(
            path = %path.display(),
            principals = snapshot.principals.len(),
            objects = snapshot.objects.len(),
            "loaded directory snapshot"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Current contents
    pub fn snapshot(&self) -> Result<DirectorySnapshot> {
        let state = self.lock_read()?;
        let mut objects: Vec<ObjectEntry> = state.objects.values().cloned().collect();
        objects.sort_by(|a, b| a.object.id.cmp(&b.object.id));
        Ok(DirectorySnapshot {
            principals: state.principals.clone(),
            objects,
        })
    }

    pub fn add_principal(&self, principal: PrincipalEntry) -> Result<()> {
        self.lock_write()?.insert_principal(principal);
        Ok(())
    }

    pub fn add_object(&self, object: ObjectEntry) -> Result<()> {
        self.lock_write()?
            .objects
            .insert(object.object.id.clone(), object);
        Ok(())
    }

    /// Append an entry directly, bypassing the port and its write counter
    pub fn push_ace(&self, object_id: &str, ace: AccessControlEntry) -> Result<()> {
        let mut state = self.lock_write()?;
        let object = state
            .objects
            .get_mut(object_id)
            .ok_or_else(|| AuthzError::target_not_found(object_id))?;
        object.aces.push(ace);
        Ok(())
    }

    /// ACL of an object by id (empty when unknown)
    pub fn aces(&self, object_id: &str) -> Result<Vec<AccessControlEntry>> {
        let state = self.lock_read()?;
        Ok(state
            .objects
            .get(object_id)
            .map(|o| o.aces.clone())
            .unwrap_or_default())
    }

    /// Simulate the backing store being unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Simulate a slow backing store; every port call sleeps this long
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of successful ACL mutations through the port
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn connect(&self) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            std::thread::sleep(Duration::from_millis(latency));
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(AuthzError::Connection("directory server is unreachable".to_string()));
        }
        Ok(())
    }

    fn lock_read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| AuthzError::Unknown("Failed to acquire read lock".to_string()))
    }

    fn lock_write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| AuthzError::Unknown("Failed to acquire write lock".to_string()))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.connect()?;
        self.lock_read()
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.connect()?;
        self.lock_write()
    }
}

fn find_object<'a>(state: &'a State, identity: &str) -> Option<&'a ObjectEntry> {
    state.objects.get(identity).or_else(|| {
        state
            .objects
            .values()
            .find(|o| o.object.distinguished_name.eq_ignore_ascii_case(identity))
    })
}

impl PrincipalResolver for InMemoryDirectory {
    fn resolve(&self, identity: &str) -> Result<Option<ResolvedPrincipal>> {
        let state = self.read()?;
        Ok(state
            .principals
            .iter()
            .find(|p| p.matches(identity))
            .map(|p| ResolvedPrincipal {
                sid: p.sid.clone(),
                name: p.name.clone(),
            }))
    }
}

impl MembershipResolver for InMemoryDirectory {
    fn resolve_groups(&self, principal: &ResolvedPrincipal) -> Result<HashSet<String>> {
        let state = self.read()?;
        let direct: HashMap<&str, &[String]> = state
            .principals
            .iter()
            .map(|p| (p.sid.as_str(), p.member_of.as_slice()))
            .collect();

        // Breadth-first over nested groups; the visited set stops cycles
        let mut groups = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([principal.sid.as_str()]);
        while let Some(sid) = queue.pop_front() {
            for group in direct.get(sid).copied().unwrap_or_default() {
                if group != &principal.sid && groups.insert(group.clone()) {
                    queue.push_back(group.as_str());
                }
            }
        }
        Ok(groups)
    }
}

impl AclReader for InMemoryDirectory {
    fn resolve_target(&self, identity: &str) -> Result<Option<DirectoryObject>> {
        let state = self.read()?;
        Ok(find_object(&state, identity).map(|o| o.object.clone()))
    }

    fn read_aces(&self, target: &DirectoryObject, include_inherited: bool) -> Result<Vec<AccessControlEntry>> {
        let state = self.read()?;
        let object = state
            .objects
            .get(&target.id)
            .ok_or_else(|| AuthzError::target_not_found(&target.id))?;

        Ok(object
            .aces
            .iter()
            .filter(|ace| include_inherited || !ace.is_inherited)
            .cloned()
            .collect())
    }
}

impl AclWriter for InMemoryDirectory {
    fn add_ace(&self, target: &DirectoryObject, rule: &AceRule) -> Result<()> {
        let mut state = self.write()?;
        let object = state
            .objects
            .get_mut(&target.id)
            .ok_or_else(|| AuthzError::target_not_found(&target.id))?;

        // An identical explicit rule is merged, not duplicated
        if object.aces.iter().any(|ace| !ace.is_inherited && ace.same_rule(rule)) {
            return Ok(());
        }

        object.aces.push(AccessControlEntry::from(rule));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove_ace(&self, target: &DirectoryObject, rule: &AceRule) -> Result<bool> {
        let mut state = self.write()?;
        let object = state
            .objects
            .get_mut(&target.id)
            .ok_or_else(|| AuthzError::target_not_found(&target.id))?;

        // Most recent explicit match goes first; inherited entries belong to the parent
        let position = object
            .aces
            .iter()
            .rposition(|ace| !ace.is_inherited && ace.same_rule(rule));

        match position {
            Some(index) => {
                object.aces.remove(index);
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
