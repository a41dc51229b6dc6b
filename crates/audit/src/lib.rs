//! # Directory RBAC Audit
//!
//! In-memory audit trail of authorization checks and role changes.

mod audit_logger;

pub use audit_logger::{AuditEntry, AuditEventType, AuditLogger, AuditStats, DEFAULT_AUDIT_CAPACITY};
