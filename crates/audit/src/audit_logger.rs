//! AuditLogger - Bounded trail of authorization decisions and role changes

use serde::{Deserialize, Serialize};
use shared::{ActionFlag, ErrorKind};
use std::collections::VecDeque;

/// Default number of retained entries
pub const DEFAULT_AUDIT_CAPACITY: usize = 10000;

/// Audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: String,
    pub event_type: AuditEventType,
    pub principal: String,
    pub target: String,
    /// Action name for checks, e.g. "MODIFY"
    pub action: Option<String>,
    /// Role name for grants and revocations
    pub role: Option<String>,
    pub success: bool,
    pub reason: Option<String>,
}

/// Types of audit events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    ActionAllowed,
    ActionDenied,
    RoleGranted,
    RoleRevoked,
    /// The check or change could not be evaluated
    CheckFailed,
}

/// Audit logger
#[derive(Debug)]
pub struct AuditLogger {
    entries: VecDeque<AuditEntry>,
    max_entries: usize,
}

impl AuditLogger {
    /// Create a new AuditLogger retaining at most `max_entries`
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries.min(1024)),
            max_entries,
        }
    }

    /// Log an audit entry, evicting the oldest when full
    pub fn log(&mut self, entry: AuditEntry) {
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    fn entry(event_type: AuditEventType, principal: &str, target: &str, success: bool) -> AuditEntry {
        AuditEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            event_type,
            principal: principal.to_string(),
            target: target.to_string(),
            action: None,
            role: None,
            success,
            reason: None,
        }
    }

    /// Log the outcome of an action check
    pub fn log_check(&mut self, principal: &str, action: ActionFlag, target: &str, allowed: bool) {
        let event_type = if allowed {
            AuditEventType::ActionAllowed
        } else {
            AuditEventType::ActionDenied
        };
        let mut entry = Self::entry(event_type, principal, target, allowed);
        entry.action = Some(action.to_string());
        if !allowed {
            entry.reason = Some("no role permitting the action is satisfied".to_string());
        }
        self.log(entry);
    }

    /// Log a successful grant or revocation
    pub fn log_role_change(&mut self, principal: &str, role: &str, target: &str, granted: bool) {
        let event_type = if granted {
            AuditEventType::RoleGranted
        } else {
            AuditEventType::RoleRevoked
        };
        let mut entry = Self::entry(event_type, principal, target, true);
        entry.role = Some(role.to_string());
        self.log(entry);
    }

    /// Log a check or role change that failed with an error
    pub fn log_failure(
        &mut self,
        principal: &str,
        target: &str,
        action: Option<ActionFlag>,
        role: Option<&str>,
        kind: ErrorKind,
        message: &str,
    ) {
        let mut entry = Self::entry(AuditEventType::CheckFailed, principal, target, false);
        entry.action = action.map(|a| a.to_string());
        entry.role = role.map(str::to_string);
        entry.reason = Some(format!("{}: {}", kind, message));
        self.log(entry);
    }

    /// Get recent entries, newest first
    pub fn get_recent(&self, limit: usize) -> Vec<&AuditEntry> {
        self.entries.iter().rev().take(limit).collect()
    }

    /// Get recent denials and failures, newest first
    pub fn get_recent_denials(&self, limit: usize) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| !e.success)
            .take(limit)
            .collect()
    }

    /// Entries concerning one principal, newest first
    pub fn get_for_principal(&self, principal: &str) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.principal == principal)
            .collect()
    }

    /// Get statistics
    pub fn get_stats(&self) -> AuditStats {
        let count = |event_type: AuditEventType| {
            self.entries
                .iter()
                .filter(|e| e.event_type == event_type)
                .count()
        };

        AuditStats {
            total_entries: self.entries.len(),
            denial_count: count(AuditEventType::ActionDenied),
            failure_count: count(AuditEventType::CheckFailed),
            grant_count: count(AuditEventType::RoleGranted),
            revoke_count: count(AuditEventType::RoleRevoked),
        }
    }

    /// Export as JSON
    pub fn export_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.entries).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}

/// Audit statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total_entries: usize,
    pub denial_count: usize,
    pub failure_count: usize,
    pub grant_count: usize,
    pub revoke_count: usize,
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}
