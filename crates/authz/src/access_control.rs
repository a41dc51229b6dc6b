//! AccessControl - Host-facing entry point
//!
//! Wraps the configured [`RoleManager`] with an audit trail and an async
//! batch check that runs directory I/O on tokio's blocking pool.

use audit::{AuditEntry, AuditLogger, AuditStats, DEFAULT_AUDIT_CAPACITY};
use rbac::{build_role_manager, RoleManager};
use shared::{ActionFlag, AuthzError, Directory, ErrorKind, NotAllowedError, Result, RoleConfig};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Per-check bound used when the configuration sets none
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// In-flight batch checks allowed when the configuration sets none
pub const DEFAULT_MAX_CONCURRENT_CHECKS: usize = 16;

/// Result of one check within a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Allowed,
    Denied,
    Failed { kind: ErrorKind, message: String },
}

impl CheckOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, CheckOutcome::Allowed)
    }

    fn from_result(result: &Result<bool>) -> Self {
        match result {
            Ok(true) => CheckOutcome::Allowed,
            Ok(false) => CheckOutcome::Denied,
            Err(e) => CheckOutcome::Failed {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }
}

/// One target's outcome in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub target: String,
    pub outcome: CheckOutcome,
}

/// Audited authorization facade
pub struct AccessControl {
    manager: Arc<dyn RoleManager>,
    audit: Mutex<AuditLogger>,
    check_timeout: Duration,
    /// Bounds batch checks holding a blocking thread, expired ones included
    check_permits: Arc<Semaphore>,
}

impl AccessControl {
    /// Create a new AccessControl over an already built manager
    pub fn new(manager: Arc<dyn RoleManager>, audit_capacity: usize, check_timeout: Duration) -> Self {
        Self {
            manager,
            audit: Mutex::new(AuditLogger::new(audit_capacity)),
            check_timeout,
            check_permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_CHECKS)),
        }
    }

    /// Builder: cap on batch checks running at once (at least one)
    pub fn with_max_concurrent_checks(mut self, limit: usize) -> Self {
        self.check_permits = Arc::new(Semaphore::new(limit.max(1)));
        self
    }

    /// Build the configured engine over `directory`
    pub fn from_config(config: &RoleConfig, directory: Arc<dyn Directory>) -> Result<Self> {
        let manager = build_role_manager(config, directory)?;
        let check_timeout = config
            .check_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_CHECK_TIMEOUT);
        let audit_capacity = config.audit_capacity.unwrap_or(DEFAULT_AUDIT_CAPACITY);
        let max_concurrent = config
            .max_concurrent_checks
            .unwrap_or(DEFAULT_MAX_CONCURRENT_CHECKS);

        info!(
            engine = ?manager.kind(),
            timeout_ms = check_timeout.as_millis() as u64,
            audit_capacity,
            max_concurrent,
            "access control initialized"
        );
        Ok(Self::new(manager, audit_capacity, check_timeout).with_max_concurrent_checks(max_concurrent))
    }

    /// Load a JSON or YAML role file and build over `directory`
    pub fn from_file(path: &Path, directory: Arc<dyn Directory>) -> Result<Self> {
        let config = RoleConfig::from_file(path)?;
        Self::from_config(&config, directory)
    }

    pub fn manager(&self) -> &Arc<dyn RoleManager> {
        &self.manager
    }

    pub fn check_timeout(&self) -> Duration {
        self.check_timeout
    }

    fn audit(&self) -> MutexGuard<'_, AuditLogger> {
        // A panic while logging leaves the ring buffer usable
        self.audit.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_check(&self, principal: &str, action: ActionFlag, target: &str, outcome: &CheckOutcome) {
        let mut audit = self.audit();
        match outcome {
            CheckOutcome::Allowed => audit.log_check(principal, action, target, true),
            CheckOutcome::Denied => audit.log_check(principal, action, target, false),
            CheckOutcome::Failed { kind, message } => {
                audit.log_failure(principal, target, Some(action), None, *kind, message)
            }
        }
    }

    /// Check if `principal` may perform `action` on `target`, recording the outcome
    pub fn check(&self, principal: &str, action: ActionFlag, target: &str) -> Result<bool> {
        let result = self.manager.can_perform_action(principal, action, target);
        self.record_check(principal, action, target, &CheckOutcome::from_result(&result));
        result
    }

    /// Like [`check`](Self::check) but fails `NotAllowed` on denial
    pub fn require(&self, principal: &str, action: ActionFlag, target: &str) -> Result<()> {
        if self.check(principal, action, target)? {
            return Ok(());
        }

        warn!(principal, target, %action, "action not allowed");
        Err(NotAllowedError::new(principal, action, target).into())
    }

    /// Grant `role`, recording the change or the failure
    pub fn grant(&self, principal: &str, role: &str, target: &str) -> Result<()> {
        let result = self.manager.add_role(principal, role, target);
        self.record_role_change(principal, role, target, true, &result);
        result
    }

    /// Revoke `role`, recording the change or the failure
    pub fn revoke(&self, principal: &str, role: &str, target: &str) -> Result<()> {
        let result = self.manager.remove_role(principal, role, target);
        self.record_role_change(principal, role, target, false, &result);
        result
    }

    fn record_role_change(&self, principal: &str, role: &str, target: &str, granted: bool, result: &Result<()>) {
        let mut audit = self.audit();
        match result {
            Ok(()) => audit.log_role_change(principal, role, target, granted),
            Err(e) => audit.log_failure(principal, target, None, Some(role), e.kind(), &e.to_string()),
        }
    }

    pub fn has_role(&self, principal: &str, role: &str, target: &str) -> Result<bool> {
        self.manager.has_role(principal, role, target)
    }

    pub fn roles(&self) -> Vec<String> {
        self.manager.get_roles()
    }

    /// Check one action against many targets.
    ///
    /// Each check runs on the blocking pool under the configured timeout,
    /// measured from the moment the check starts running. A failed or expired
    /// check yields `Failed` for that target only; the returned entries follow
    /// the order of `targets`.
    pub async fn authorize_batch<I, S>(&self, principal: &str, action: ActionFlag, targets: I) -> Vec<BatchEntry>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handles: Vec<(String, JoinHandle<CheckOutcome>)> = targets
            .into_iter()
            .map(|target| {
                let target: String = target.into();
                let handle = self.spawn_check(principal.to_string(), action, target.clone());
                (target, handle)
            })
            .collect();

        let mut entries = Vec::with_capacity(handles.len());
        for (target, handle) in handles {
            let outcome = handle.await.unwrap_or_else(|e| CheckOutcome::Failed {
                kind: ErrorKind::Unknown,
                message: format!("check task failed: {}", e),
            });

            if let CheckOutcome::Failed { kind, message } = &outcome {
                warn!(principal, target = %target, %action, %kind, message = %message, "batch check failed");
            }
            self.record_check(principal, action, &target, &outcome);
            entries.push(BatchEntry { target, outcome });
        }

        let allowed = entries.iter().filter(|e| e.outcome.is_allowed()).count();
        info!(principal, %action, targets = entries.len(), allowed, "batch authorized");
        entries
    }

    fn spawn_check(&self, principal: String, action: ActionFlag, target: String) -> JoinHandle<CheckOutcome> {
        let manager = Arc::clone(&self.manager);
        let permits = Arc::clone(&self.check_permits);
        let limit = self.check_timeout;

        tokio::spawn(async move {
            let Ok(permit) = permits.acquire_owned().await else {
                return CheckOutcome::Failed {
                    kind: ErrorKind::Unknown,
                    message: "check permits closed".to_string(),
                };
            };

            let (started_tx, started_rx) = oneshot::channel();
            let check = tokio::task::spawn_blocking(move || {
                // Held until the directory calls return, even after the caller gave up
                let _permit = permit;
                let _ = started_tx.send(());
                manager.can_perform_action(&principal, action, &target)
            });

            // Time spent queued for a blocking thread is not charged to the check
            let _ = started_rx.await;

            match tokio::time::timeout(limit, check).await {
                Ok(Ok(result)) => CheckOutcome::from_result(&result),
                Ok(Err(join_error)) => CheckOutcome::Failed {
                    kind: ErrorKind::Unknown,
                    message: format!("check task failed: {}", join_error),
                },
                Err(_) => CheckOutcome::from_result(&Err(AuthzError::Connection(format!(
                    "check timed out after {}ms",
                    limit.as_millis()
                )))),
            }
        })
    }

    pub fn audit_stats(&self) -> AuditStats {
        self.audit().get_stats()
    }

    /// Most recent denials and failures, newest first
    pub fn recent_denials(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit().get_recent_denials(limit).into_iter().cloned().collect()
    }

    /// Most recent entries, newest first
    pub fn recent_entries(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit().get_recent(limit).into_iter().cloned().collect()
    }

    pub fn export_audit(&self) -> serde_json::Value {
        self.audit().export_json()
    }
}

impl std::fmt::Debug for AccessControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessControl")
            .field("engine", &self.manager.kind())
            .field("check_timeout", &self.check_timeout)
            .field("available_check_permits", &self.check_permits.available_permits())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit::AuditEventType;
    use directory::{InMemoryDirectory, ObjectEntry, PrincipalEntry};
    use shared::{AccessControlEntry, DirectoryRights, EngineKind, ObjectKind};

    const ROLES: &str = r#"
engine: catalog
checkTimeoutMs: 100
auditCapacity: 50
roles:
  - name: Reader
    requiredRights: [READ_PROPERTY]
    allowedActions: [GET, SEARCH]
  - name: Editor
    requiredRights: [READ_PROPERTY, WRITE_PROPERTY]
    allowedActions: [MODIFY]
    extendsRoles: [Reader]
"#;

    fn directory() -> Arc<InMemoryDirectory> {
        let dir = InMemoryDirectory::new();
        dir.add_principal(PrincipalEntry::new("S-G-SUPPORT", "Support")).unwrap();
        dir.add_principal(PrincipalEntry::new("S-U-IVY", "ivy").member_of("S-G-SUPPORT")).unwrap();
        dir.add_object(
            ObjectEntry::new("user-1", "CN=One,OU=Staff,DC=corp,DC=local", ObjectKind::User)
                .with_ace(AccessControlEntry::allow("S-G-SUPPORT", DirectoryRights::GENERIC_READ)),
        )
        .unwrap();
        dir.add_object(
            ObjectEntry::new("user-2", "CN=Two,OU=Staff,DC=corp,DC=local", ObjectKind::User)
                .with_ace(AccessControlEntry::allow("S-G-SUPPORT", DirectoryRights::GENERIC_WRITE)),
        )
        .unwrap();
        Arc::new(dir)
    }

    fn access_control(dir: Arc<InMemoryDirectory>) -> AccessControl {
        let config = RoleConfig::from_yaml(ROLES).unwrap();
        AccessControl::from_config(&config, dir).unwrap()
    }

    #[test]
    fn test_from_config_settings() {
        let ac = access_control(directory());

        assert_eq!(ac.check_timeout(), Duration::from_millis(100));
        assert_eq!(ac.manager().kind(), EngineKind::Catalog);
        assert_eq!(ac.roles(), vec!["Reader".to_string(), "Editor".to_string()]);
    }

    #[test]
    fn test_default_timeout() {
        let config = RoleConfig::from_yaml("roles: []").unwrap();
        let ac = AccessControl::from_config(&config, directory()).unwrap();
        assert_eq!(ac.check_timeout(), DEFAULT_CHECK_TIMEOUT);
    }

    #[test]
    fn test_check_is_audited() {
        let ac = access_control(directory());

        assert!(ac.check("ivy", ActionFlag::GET, "user-1").unwrap());
        assert!(!ac.check("ivy", ActionFlag::MODIFY, "user-1").unwrap());
        assert!(ac.check("ghost", ActionFlag::GET, "user-1").is_err());

        let stats = ac.audit_stats();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.denial_count, 1);
        assert_eq!(stats.failure_count, 1);

        let denials = ac.recent_denials(10);
        assert_eq!(denials[0].event_type, AuditEventType::CheckFailed);
        assert!(denials[0].reason.as_ref().unwrap().starts_with("does_not_exist"));
        assert_eq!(denials[1].event_type, AuditEventType::ActionDenied);
    }

    #[test]
    fn test_require() {
        let ac = access_control(directory());

        assert!(ac.require("ivy", ActionFlag::SEARCH, "user-1").is_ok());
        let err = ac.require("ivy", ActionFlag::DELETE, "user-1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAllowed);
    }

    #[test]
    fn test_grant_and_revoke_are_audited() {
        let dir = directory();
        let ac = access_control(dir.clone());
        let before = dir.aces("user-1").unwrap();

        ac.grant("ivy", "Editor", "user-1").unwrap();
        ac.revoke("ivy", "Editor", "user-1").unwrap();
        assert!(ac.grant("ivy", "Ghost", "user-1").is_err());

        assert_eq!(dir.aces("user-1").unwrap(), before);
        let stats = ac.audit_stats();
        assert_eq!(stats.grant_count, 1);
        assert_eq!(stats.revoke_count, 1);
        assert_eq!(stats.failure_count, 1);

        let last = &ac.recent_entries(1)[0];
        assert_eq!(last.role.as_deref(), Some("Ghost"));
    }

    #[test]
    fn test_export_audit() {
        let ac = access_control(directory());
        ac.check("ivy", ActionFlag::GET, "user-1").unwrap();

        let json = ac.export_audit();
        assert_eq!(json[0]["principal"], "ivy");
        assert_eq!(json[0]["action"], "GET");
    }

    #[tokio::test]
    async fn test_batch_outcomes_in_order() {
        let ac = access_control(directory());

        let entries = ac
            .authorize_batch("ivy", ActionFlag::GET, ["user-1", "user-2", "user-9"])
            .await;

        let targets: Vec<_> = entries.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["user-1", "user-2", "user-9"]);

        // GENERIC_WRITE carries no READ_PROPERTY
        assert_eq!(entries[0].outcome, CheckOutcome::Allowed);
        assert_eq!(entries[1].outcome, CheckOutcome::Denied);
        assert!(matches!(
            entries[2].outcome,
            CheckOutcome::Failed { kind: ErrorKind::DoesNotExist, .. }
        ));
        assert_eq!(ac.audit_stats().total_entries, 3);
    }

    #[tokio::test]
    async fn test_batch_timeout_fails_only_that_check() {
        let dir = directory();
        dir.set_latency(Duration::from_millis(300));
        let ac = access_control(dir);

        let entries = ac.authorize_batch("ivy", ActionFlag::GET, ["user-1"]).await;
        match &entries[0].outcome {
            CheckOutcome::Failed { kind, message } => {
                assert_eq!(*kind, ErrorKind::ConnectionError);
                assert!(message.contains("timed out"));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_batch_queue_time_is_not_charged() {
        // A single blocking thread forces the checks to run one after another
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(1)
            .enable_all()
            .build()
            .unwrap();

        let dir = directory();
        // Four directory calls per check, roughly 120ms each check
        dir.set_latency(Duration::from_millis(30));
        let mut config = RoleConfig::from_yaml(ROLES).unwrap();
        config.check_timeout_ms = Some(200);
        let ac = AccessControl::from_config(&config, dir).unwrap();

        let entries =
            runtime.block_on(ac.authorize_batch("ivy", ActionFlag::GET, ["user-1", "user-1", "user-1"]));

        for entry in &entries {
            assert_eq!(entry.outcome, CheckOutcome::Allowed, "target {}", entry.target);
        }
    }

    #[tokio::test]
    async fn test_batch_respects_concurrency_cap() {
        let dir = directory();
        dir.set_latency(Duration::from_millis(20));
        let mut config = RoleConfig::from_yaml(ROLES).unwrap();
        config.check_timeout_ms = Some(1000);
        config.max_concurrent_checks = Some(1);
        let ac = AccessControl::from_config(&config, dir).unwrap();

        let started = std::time::Instant::now();
        let entries = ac
            .authorize_batch("ivy", ActionFlag::GET, ["user-1", "user-1", "user-1"])
            .await;

        assert!(entries.iter().all(|e| e.outcome.is_allowed()));
        // Three serialized checks of four 20ms calls each
        assert!(started.elapsed() >= Duration::from_millis(240));
    }

    #[tokio::test]
    async fn test_batch_offline_directory() {
        let dir = directory();
        dir.set_offline(true);
        let ac = access_control(dir);

        let entries = ac.authorize_batch("ivy", ActionFlag::GET, vec!["user-1".to_string()]).await;
        assert!(matches!(
            entries[0].outcome,
            CheckOutcome::Failed { kind: ErrorKind::ConnectionError, .. }
        ));
    }

    #[tokio::test]
    async fn test_batch_permissive_engine() {
        let mut config = RoleConfig::from_yaml(ROLES).unwrap();
        config.engine = EngineKind::Permissive;
        let ac = AccessControl::from_config(&config, directory()).unwrap();

        let entries = ac.authorize_batch("anyone", ActionFlag::DELETE, ["x", "y"]).await;
        assert!(entries.iter().all(|e| e.outcome.is_allowed()));
    }

    #[test]
    fn test_from_file() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        std::fs::write(file.path(), ROLES).unwrap();

        let ac = AccessControl::from_file(file.path(), directory()).unwrap();
        assert_eq!(ac.roles().len(), 2);
    }
}
