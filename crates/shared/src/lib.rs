//! # Directory RBAC Shared
//!
//! Common types and collaborator ports used across the RBAC workspace.

pub mod ace;
pub mod action;
pub mod config;
pub mod directory;
pub mod error;
pub mod rights;
pub mod role;

// Re-exports
pub use ace::*;
pub use action::*;
pub use config::*;
pub use directory::*;
pub use error::*;
pub use rights::*;
pub use role::*;
