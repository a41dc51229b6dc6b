//! # Directory Adapters
//!
//! Implementations of the ports declared in [`shared::directory`].

pub mod in_memory;

pub use in_memory::{DirectorySnapshot, InMemoryDirectory, ObjectEntry, PrincipalEntry};
