//! Identity types for database entities
//!
//! Every entity carries two identities: a logical [`ItemId`] assigned once
//! and never reused, and a [`VersionId`] naming one concrete representation
//! snapshot. Replacing an entity bumps the version and leaves the logical
//! identity untouched; every cross-reference in the system (names, materials,
//! groups, modifiers) keys off the logical identity only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable logical identity of an entity
///
/// Assigned on creation, survives every replace, retired on removal.
/// Logical ids are never reused within a database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ItemId(u64);

impl ItemId {
    /// Create an id from a raw u64 value
    #[inline]
    pub const fn new(value: u64) -> Self {
        ItemId(value)
    }

    /// Get the raw u64 value
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Identity of one concrete representation snapshot
///
/// Exactly one version is current per logical identity at any time; a
/// replace retires the previous version. Temporary previews draw from the
/// same id space so versions are unique database-wide.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct VersionId(u64);

impl VersionId {
    /// Create an id from a raw u64 value
    #[inline]
    pub const fn new(value: u64) -> Self {
        VersionId(value)
    }

    /// Get the raw u64 value
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Identity of a scene-graph group node
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GroupId(u64);

impl GroupId {
    /// The root group of every scene
    pub const ROOT: GroupId = GroupId(0);

    /// Create an id from a raw u64 value
    #[inline]
    pub const fn new(value: u64) -> Self {
        GroupId(value)
    }

    /// Get the raw u64 value
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Check whether this is the root group
    #[inline]
    pub const fn is_root(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Identity of a material table entry
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MaterialId(u32);

impl MaterialId {
    /// Create an id from a raw u32 value
    #[inline]
    pub const fn new(value: u32) -> Self {
        MaterialId(value)
    }

    /// Get the raw u32 value
    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "material#{}", self.0)
    }
}
