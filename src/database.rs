//! The versioned geometry store.
//!
//! [`GeometryDatabase`] owns every concrete representation and the two
//! identity tables the whole system keys off: logical id -> current version
//! and version -> representation. Handles ([`ItemView`]) carry both ids;
//! a handle whose version has been superseded is stale and every operation
//! addressed through it fails with [`GeomError::StaleReference`].
//!
//! Temporary preview objects live in a separate table, draw versions from
//! the same id space, and are never serialized.

use crate::error::{GeomError, Result};
use crate::geometry::Representation;
use crate::signals::{DbEvent, SignalLog};
use crate::types::{ItemFlags, ItemId, VersionId};
use ahash::AHashMap;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance of an item: created by a user action or derived automatically
/// (e.g. by a modifier recomputation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Automatic,
}

/// Handle to one version of one item.
///
/// Returned by every mutating operation. Becomes stale as soon as the item
/// is replaced; the logical id alone stays meaningful across replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemView {
    /// Logical identity, stable across replaces
    pub item: ItemId,
    /// Version identity of the representation this handle was issued for
    pub version: VersionId,
}

impl fmt::Display for ItemView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.item, self.version)
    }
}

/// Handle to a temporary preview object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemporaryObject {
    /// Version identity of the preview representation
    pub version: VersionId,
}

/// Bookkeeping record of one live item.
#[derive(Debug, Clone)]
pub struct ItemRecord {
    /// Logical identity
    pub id: ItemId,
    /// Current version
    pub version: VersionId,
    /// Provenance tag, kept for bookkeeping only
    pub origin: Origin,
    /// State flags (visibility)
    pub flags: ItemFlags,
}

impl ItemRecord {
    /// Handle to the current version
    pub fn view(&self) -> ItemView {
        ItemView {
            item: self.id,
            version: self.version,
        }
    }
}

#[derive(Debug, Clone)]
struct TempRecord {
    rep: Representation,
    flags: ItemFlags,
}

/// The geometry store.
#[derive(Debug, Default)]
pub struct GeometryDatabase {
    /// Live items in creation order
    items: IndexMap<ItemId, ItemRecord>,
    /// Representation of every current version
    representations: AHashMap<VersionId, Representation>,
    /// Preview objects, keyed by their own version ids
    temporaries: AHashMap<VersionId, TempRecord>,
    next_item: u64,
    next_version: u64,
    signals: SignalLog,
}

impl GeometryDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        GeometryDatabase {
            items: IndexMap::new(),
            representations: AHashMap::new(),
            temporaries: AHashMap::new(),
            next_item: 1,
            next_version: 1,
            signals: SignalLog::new(),
        }
    }

    fn allocate_item(&mut self) -> ItemId {
        let id = ItemId::new(self.next_item);
        self.next_item += 1;
        id
    }

    fn allocate_version(&mut self) -> VersionId {
        let v = VersionId::new(self.next_version);
        self.next_version += 1;
        v
    }

    /// Resolve a handle to its record, failing on stale or missing handles
    fn resolve(&self, view: ItemView) -> Result<&ItemRecord> {
        let record = self
            .items
            .get(&view.item)
            .ok_or_else(|| GeomError::not_found(view.item.to_string()))?;
        if record.version != view.version {
            return Err(GeomError::StaleReference(view.version.value()));
        }
        Ok(record)
    }

    // ----------------------------------------------------------------
    // Persistent items
    // ----------------------------------------------------------------

    /// Add a new item, allocating a fresh logical identity
    pub fn add_item(&mut self, rep: Representation, origin: Origin) -> Result<ItemView> {
        rep.validate()?;
        let id = self.allocate_item();
        let version = self.allocate_version();
        self.representations.insert(version, rep);
        self.items.insert(
            id,
            ItemRecord {
                id,
                version,
                origin,
                flags: ItemFlags::default(),
            },
        );
        self.signals.emit(DbEvent::ItemAdded { item: id, version });
        debug!("added {id} ({version}, {origin:?})");
        Ok(ItemView { item: id, version })
    }

    /// Recreate an item under a known logical identity (document load path)
    pub(crate) fn restore_item(
        &mut self,
        id: ItemId,
        rep: Representation,
        origin: Origin,
        hidden: bool,
    ) -> Result<ItemView> {
        rep.validate()?;
        if self.items.contains_key(&id) {
            return Err(GeomError::Internal(format!("{id} restored twice")));
        }
        self.next_item = self.next_item.max(id.value() + 1);
        let version = self.allocate_version();
        self.representations.insert(version, rep);
        let mut flags = ItemFlags::default();
        flags.set(ItemFlags::VISIBLE, !hidden);
        self.items.insert(
            id,
            ItemRecord {
                id,
                version,
                origin,
                flags,
            },
        );
        self.signals.emit(DbEvent::ItemAdded { item: id, version });
        Ok(ItemView { item: id, version })
    }

    /// Replace an item's representation, bumping its version.
    ///
    /// The old handle becomes stale; name, material, and group bindings are
    /// unaffected because they key off the logical identity.
    pub fn replace_item(&mut self, view: ItemView, rep: Representation) -> Result<ItemView> {
        rep.validate()?;
        self.resolve(view)?;
        let new_version = self.allocate_version();
        self.representations.remove(&view.version);
        self.representations.insert(new_version, rep);
        let record = self.items.get_mut(&view.item).expect("resolved above");
        record.version = new_version;
        self.signals.emit(DbEvent::ItemReplaced {
            item: view.item,
            old_version: view.version,
            new_version,
        });
        debug!("replaced {} ({} -> {})", view.item, view.version, new_version);
        Ok(ItemView {
            item: view.item,
            version: new_version,
        })
    }

    /// Retire a logical identity entirely
    pub fn remove_item(&mut self, view: ItemView) -> Result<()> {
        self.resolve(view)?;
        self.representations.remove(&view.version);
        self.items.shift_remove(&view.item);
        self.signals.emit(DbEvent::ItemRemoved {
            item: view.item,
            version: view.version,
        });
        debug!("removed {}", view.item);
        Ok(())
    }

    /// Copy the current representation under a new logical identity.
    ///
    /// No modifier, name, or material bindings carry over.
    pub fn duplicate(&mut self, view: ItemView) -> Result<ItemView> {
        let rep = self.lookup(view)?.clone();
        self.add_item(rep, Origin::User)
    }

    /// Representation behind a handle
    pub fn lookup(&self, view: ItemView) -> Result<&Representation> {
        self.resolve(view)?;
        self.representations
            .get(&view.version)
            .ok_or_else(|| GeomError::Internal(format!("{view} has no representation")))
    }

    /// Current handle for a logical identity
    pub fn current_view(&self, id: ItemId) -> Result<ItemView> {
        self.record(id).map(ItemRecord::view)
    }

    /// Bookkeeping record for a logical identity
    pub fn record(&self, id: ItemId) -> Result<&ItemRecord> {
        self.items
            .get(&id)
            .ok_or_else(|| GeomError::not_found(id.to_string()))
    }

    // ----------------------------------------------------------------
    // Temporary previews
    // ----------------------------------------------------------------

    /// Publish a preview object. Previews start hidden until shown.
    pub fn add_temporary_item(&mut self, rep: Representation) -> Result<TemporaryObject> {
        rep.validate()?;
        let version = self.allocate_version();
        self.temporaries.insert(
            version,
            TempRecord {
                rep,
                flags: ItemFlags::TEMPORARY,
            },
        );
        self.signals.emit(DbEvent::TemporaryAdded(version));
        Ok(TemporaryObject { version })
    }

    /// Publish a preview standing in for an existing item.
    ///
    /// Validates that `from` is still current; slot supersession (cancelling
    /// the prior preview for the same logical identity) is the caller's job.
    pub fn replace_temporary_item(
        &mut self,
        from: ItemView,
        rep: Representation,
    ) -> Result<TemporaryObject> {
        self.resolve(from)?;
        self.add_temporary_item(rep)
    }

    /// Cancel a preview and release its resources
    pub fn cancel_temporary(&mut self, temp: TemporaryObject) -> Result<()> {
        self.temporaries
            .remove(&temp.version)
            .ok_or_else(|| GeomError::not_found(format!("temporary {}", temp.version)))?;
        self.signals.emit(DbEvent::TemporaryCancelled(temp.version));
        Ok(())
    }

    /// Make a preview visible
    pub fn show_temporary(&mut self, temp: TemporaryObject) -> Result<()> {
        self.temporary_mut(temp)?.flags.insert(ItemFlags::VISIBLE);
        Ok(())
    }

    /// Hide a preview without cancelling it
    pub fn hide_temporary(&mut self, temp: TemporaryObject) -> Result<()> {
        self.temporary_mut(temp)?.flags.remove(ItemFlags::VISIBLE);
        Ok(())
    }

    /// Whether a preview is currently visible
    pub fn temporary_visible(&self, temp: TemporaryObject) -> Result<bool> {
        Ok(self.temporary(temp)?.flags.is_visible())
    }

    /// State flags of a preview; always carries [`ItemFlags::TEMPORARY`]
    pub fn temporary_flags(&self, temp: TemporaryObject) -> Result<ItemFlags> {
        Ok(self.temporary(temp)?.flags)
    }

    /// Representation behind a preview handle
    pub fn lookup_temporary(&self, temp: TemporaryObject) -> Result<&Representation> {
        Ok(&self.temporary(temp)?.rep)
    }

    fn temporary(&self, temp: TemporaryObject) -> Result<&TempRecord> {
        self.temporaries
            .get(&temp.version)
            .ok_or_else(|| GeomError::not_found(format!("temporary {}", temp.version)))
    }

    fn temporary_mut(&mut self, temp: TemporaryObject) -> Result<&mut TempRecord> {
        self.temporaries
            .get_mut(&temp.version)
            .ok_or_else(|| GeomError::not_found(format!("temporary {}", temp.version)))
    }

    /// Number of live preview objects
    pub fn temporary_count(&self) -> usize {
        self.temporaries.len()
    }

    // ----------------------------------------------------------------
    // Visibility
    // ----------------------------------------------------------------

    /// Hide an item. Visibility is a property of the logical identity and
    /// is idempotent; hiding twice equals hiding once.
    pub fn hide(&mut self, view: ItemView) -> Result<()> {
        let record = self
            .items
            .get_mut(&view.item)
            .ok_or_else(|| GeomError::not_found(view.item.to_string()))?;
        if record.flags.is_visible() {
            record.flags.remove(ItemFlags::VISIBLE);
            self.signals.emit(DbEvent::ItemHidden(view.item));
        }
        Ok(())
    }

    /// Undo [`hide`](Self::hide)
    pub fn unhide(&mut self, view: ItemView) -> Result<()> {
        let record = self
            .items
            .get_mut(&view.item)
            .ok_or_else(|| GeomError::not_found(view.item.to_string()))?;
        if !record.flags.is_visible() {
            record.flags.insert(ItemFlags::VISIBLE);
            self.signals.emit(DbEvent::ItemUnhidden(view.item));
        }
        Ok(())
    }

    /// Whether an item is hidden
    pub fn is_hidden(&self, id: ItemId) -> Result<bool> {
        Ok(!self.record(id)?.flags.is_visible())
    }

    // ----------------------------------------------------------------
    // Queries
    // ----------------------------------------------------------------

    /// Live item records in creation order
    pub fn items(&self) -> impl Iterator<Item = &ItemRecord> {
        self.items.values()
    }

    /// Current handles in creation order
    pub fn views(&self) -> Vec<ItemView> {
        self.items.values().map(ItemRecord::view).collect()
    }

    /// Records with their current representations, in creation order
    pub fn iter(&self) -> impl Iterator<Item = (&ItemRecord, &Representation)> {
        self.items.values().map(move |record| {
            let rep = self
                .representations
                .get(&record.version)
                .expect("current version always has a representation");
            (record, rep)
        })
    }

    /// Number of live items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the database holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a logical identity is live
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Current version of every live item
    pub fn current_versions(&self) -> Vec<VersionId> {
        self.items.values().map(|r| r.version).collect()
    }

    /// Whether a version id is the current version of some live item
    pub fn is_valid_version(&self, version: VersionId) -> bool {
        self.representations.contains_key(&version)
    }

    /// The mutation event log
    pub fn signals(&self) -> &SignalLog {
        &self.signals
    }

    /// Take all recorded mutation events
    pub fn drain_signals(&mut self) -> Vec<DbEvent> {
        self.signals.drain()
    }
}
