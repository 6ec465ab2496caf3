//! Mutation event log.
//!
//! Every database mutation is recorded as a [`DbEvent`] rather than being
//! silently applied. Consumers (undo history, viewport sync, selection)
//! drain the log after a command completes to learn what changed; the
//! database itself never depends on anyone reading it.

use crate::types::{ItemId, VersionId};
use std::fmt;

/// A single recorded mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbEvent {
    /// A new logical identity was created.
    ItemAdded { item: ItemId, version: VersionId },
    /// An item's representation was replaced with a new version.
    ItemReplaced {
        item: ItemId,
        old_version: VersionId,
        new_version: VersionId,
    },
    /// A logical identity was retired.
    ItemRemoved { item: ItemId, version: VersionId },
    /// Visibility turned off.
    ItemHidden(ItemId),
    /// Visibility turned back on.
    ItemUnhidden(ItemId),
    /// A temporary preview object was published.
    TemporaryAdded(VersionId),
    /// A temporary preview object was cancelled and its resources released.
    TemporaryCancelled(VersionId),
}

impl fmt::Display for DbEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ItemAdded { item, version } => write!(f, "added {item} ({version})"),
            Self::ItemReplaced {
                item,
                old_version,
                new_version,
            } => write!(f, "replaced {item} ({old_version} -> {new_version})"),
            Self::ItemRemoved { item, version } => write!(f, "removed {item} ({version})"),
            Self::ItemHidden(item) => write!(f, "hid {item}"),
            Self::ItemUnhidden(item) => write!(f, "unhid {item}"),
            Self::TemporaryAdded(version) => write!(f, "temporary {version} published"),
            Self::TemporaryCancelled(version) => write!(f, "temporary {version} cancelled"),
        }
    }
}

/// Collects events during a sequence of mutations.
#[derive(Debug, Clone, Default)]
pub struct SignalLog {
    items: Vec<DbEvent>,
}

impl SignalLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Record an event.
    pub fn emit(&mut self, event: DbEvent) {
        self.items.push(event);
    }

    /// Check if there are any recorded events.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate over recorded events.
    pub fn iter(&self) -> std::slice::Iter<'_, DbEvent> {
        self.items.iter()
    }

    /// Take all recorded events, leaving the log empty.
    pub fn drain(&mut self) -> Vec<DbEvent> {
        std::mem::take(&mut self.items)
    }
}

impl<'a> IntoIterator for &'a SignalLog {
    type Item = &'a DbEvent;
    type IntoIter = std::slice::Iter<'a, DbEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
