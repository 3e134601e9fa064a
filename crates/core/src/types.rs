//! Shared domain types for Warden scoped resources.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Failure stage
// ---------------------------------------------------------------------------

/// The stage of a scoped block that raised a failure.
///
/// Ordered by lifecycle: `Acquisition < Body < Release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Acquisition,
    Body,
    Release,
}

impl FailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            FailureKind::Acquisition => "acquisition",
            FailureKind::Body => "body",
            FailureKind::Release => "release",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Resource lifecycle
// ---------------------------------------------------------------------------

/// Observable lifecycle of a single resource.
///
/// `release_count` is a counter, not a flag: a resource bound to two slots
/// of the same block is released once per slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub acquired: bool,
    pub used: bool,
    pub release_count: u32,
}

impl ResourceState {
    pub fn is_released(&self) -> bool {
        self.release_count > 0
    }
}
