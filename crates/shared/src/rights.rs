//! Directory rights algebra.
//!
//! Bit values match the directory's native access mask so numeric rights
//! in existing role configuration documents keep their meaning.
//!
//! # Example
//!
//! ```
//! use shared::DirectoryRights;
//!
//! let allow = DirectoryRights::READ_PROPERTY | DirectoryRights::WRITE_PROPERTY;
//! let deny = DirectoryRights::WRITE_PROPERTY;
//! assert_eq!(DirectoryRights::resolve(allow, deny), DirectoryRights::READ_PROPERTY);
//! assert!(allow.satisfies(DirectoryRights::READ_PROPERTY));
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Rights carried by an access control entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct DirectoryRights: u32 {
        const CREATE_CHILD           = 0x0000_0001;
        const DELETE_CHILD           = 0x0000_0002;
        const LIST_CHILDREN          = 0x0000_0004;
        /// Validated write
        const SELF                   = 0x0000_0008;
        const READ_PROPERTY          = 0x0000_0010;
        const WRITE_PROPERTY         = 0x0000_0020;
        const DELETE_TREE            = 0x0000_0040;
        const LIST_OBJECT            = 0x0000_0080;
        const EXTENDED_RIGHT         = 0x0000_0100;
        const DELETE                 = 0x0001_0000;
        const READ_CONTROL           = 0x0002_0000;
        const WRITE_DACL             = 0x0004_0000;
        const WRITE_OWNER            = 0x0008_0000;
        const SYNCHRONIZE            = 0x0010_0000;
        const ACCESS_SYSTEM_SECURITY = 0x0100_0000;

        const GENERIC_READ = Self::READ_CONTROL.bits()
            | Self::LIST_CHILDREN.bits()
            | Self::READ_PROPERTY.bits()
            | Self::LIST_OBJECT.bits();
        const GENERIC_WRITE = Self::READ_CONTROL.bits()
            | Self::SELF.bits()
            | Self::WRITE_PROPERTY.bits();
        const GENERIC_EXECUTE = Self::READ_CONTROL.bits() | Self::LIST_CHILDREN.bits();
        const GENERIC_ALL = 0x0000_01FF
            | Self::DELETE.bits()
            | Self::READ_CONTROL.bits()
            | Self::WRITE_DACL.bits()
            | Self::WRITE_OWNER.bits();
    }
}

impl DirectoryRights {
    /// Applies deny-override-on-overlap.
    ///
    /// A deny bit cancels exactly the matching allow bit; deny bits that
    /// were never allowed have no effect.
    #[must_use]
    pub fn resolve(allow: Self, deny: Self) -> Self {
        let cancelled = allow & deny;
        allow ^ cancelled
    }

    /// True when every bit of `required` is present in `self`.
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        (required & self) == required
    }
}

impl fmt::Display for DirectoryRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        bitflags::parser::to_writer(self, f)
    }
}
