//! Gated operation categories

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// One bit per operation category the handler layer gates.
    ///
    /// The empty set (`NONE`) and the full set (`ALL`) are sentinels and
    /// never appear as keys of the role catalog's action index.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ActionFlag: u32 {
        const GET                = 1 << 0;
        const CREATE             = 1 << 1;
        const MODIFY             = 1 << 2;
        const DELETE             = 1 << 3;
        const MOVE               = 1 << 4;
        const ADD_TO_GROUP       = 1 << 5;
        const REMOVE_FROM_GROUP  = 1 << 6;
        const SEARCH             = 1 << 7;
        const ADD_ACCESS_RULE    = 1 << 8;
        const REMOVE_ACCESS_RULE = 1 << 9;
        const SET_ACCESS_RULE    = 1 << 10;
        const PURGE_ACCESS_RULES = 1 << 11;
        const ADD_ROLE           = 1 << 12;
        const REMOVE_ROLE        = 1 << 13;
    }
}

impl ActionFlag {
    /// Sentinel: no action.
    pub const NONE: Self = Self::empty();

    /// Sentinel: every action.
    pub const ALL: Self = Self::all();

    /// True for a single named action; false for the sentinels and combinations.
    pub fn is_single(self) -> bool {
        self.bits().count_ones() == 1
    }

    /// Iterates every non-sentinel action in declaration order.
    pub fn each() -> impl Iterator<Item = ActionFlag> {
        Self::all().iter()
    }
}

impl fmt::Display for ActionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        bitflags::parser::to_writer(self, f)
    }
}
