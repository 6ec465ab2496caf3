//! Identity remapper and mutation coordination layer.
//!
//! [`ModifierManager`] is the single entry point for mutations once
//! modifiers may be present. It keeps the version -> logical mapping that
//! lets version-addressed handles find the logical identity owning a
//! modifier, triggers modifier recomputation on replace, routes preview
//! replacements to the modifier's preview path, and performs the removal
//! cascade. The modified-by / modifies relation is a non-owning side table
//! here, keyed by logical identity pairs.

use crate::compute::{CancellationToken, OrderGate};
use crate::database::{GeometryDatabase, ItemView, Origin, TemporaryObject};
use crate::error::{GeomError, Result};
use crate::geometry::Representation;
use crate::modifier::{ModifierList, ModifierUpdate, SymmetrySpec};
use crate::scene::Scene;
use crate::types::{ItemId, VersionId};
use ahash::AHashMap;
use indexmap::IndexMap;
use log::debug;

/// Coordination layer over the geometry store.
#[derive(Debug, Default)]
pub struct ModifierManager {
    /// Modifier list per logical identity, in attach order
    map: IndexMap<ItemId, ModifierList>,
    /// Version -> logical identity, for resolving version-addressed handles
    version2name: AHashMap<VersionId, ItemId>,
    /// base -> derived relation
    modifies: AHashMap<ItemId, ItemId>,
    /// derived -> base relation
    modified_by: AHashMap<ItemId, ItemId>,
    /// Last published preview per logical identity without a modifier
    plain_previews: AHashMap<ItemId, TemporaryObject>,
    /// Cancellation token of the in-flight preview per logical identity
    preview_tokens: AHashMap<ItemId, CancellationToken>,
    gate: OrderGate,
}

impl ModifierManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a version-addressed handle to its logical identity.
    ///
    /// A missing entry means a mutation bypassed this layer; that is a
    /// programming error, not a recoverable condition.
    fn resolve_name(&self, version: VersionId) -> Result<ItemId> {
        self.version2name
            .get(&version)
            .copied()
            .ok_or_else(|| {
                GeomError::Internal(format!("{version} has no logical identity mapping"))
            })
    }

    fn register_derived(
        &mut self,
        scene: &mut Scene,
        base: ItemId,
        update: ModifierUpdate,
    ) -> Result<()> {
        if let Some(old_version) = update.replaced {
            self.version2name.remove(&old_version);
        }
        self.version2name
            .insert(update.view.version, update.view.item);
        if !scene.contains_item(update.view.item) {
            scene.add_item(update.view.item)?;
        }
        self.modifies.insert(base, update.view.item);
        self.modified_by.insert(update.view.item, base);
        Ok(())
    }

    // ----------------------------------------------------------------
    // Mutating entry points
    // ----------------------------------------------------------------

    /// Add a new item; it starts tracking in the scene's root group
    pub fn add_item(
        &mut self,
        db: &mut GeometryDatabase,
        scene: &mut Scene,
        rep: Representation,
        origin: Origin,
    ) -> Result<ItemView> {
        let view = db.add_item(rep, origin)?;
        scene.add_item(view.item)?;
        self.version2name.insert(view.version, view.item);
        Ok(view)
    }

    /// Replace an item's representation.
    ///
    /// If the logical identity carries a modifier, its derived entity is
    /// recomputed before this returns. The version mapping is re-pointed
    /// from the old version to the new one.
    pub fn replace_item(
        &mut self,
        db: &mut GeometryDatabase,
        scene: &mut Scene,
        from: ItemView,
        rep: Representation,
    ) -> Result<ItemView> {
        let name = self.resolve_name(from.version)?;
        let ticket = self.gate.issue(name)?;

        let result = (|| {
            let result = db.replace_item(from, rep)?;
            self.version2name.remove(&from.version);
            self.version2name.insert(result.version, name);

            if let Some(list) = self.map.get_mut(&name) {
                let update = list.update(db, result, &CancellationToken::new())?;
                self.register_derived(scene, name, update)?;
            }
            Ok(result)
        })();

        self.gate.complete(ticket)?;
        result
    }

    /// Retire a logical identity, cascading to all dependent state.
    ///
    /// Releases scene bindings, cancels previews, and removes an attached
    /// modifier together with its derived entity. Removing a derived
    /// entity directly detaches it from its base's relation instead.
    pub fn remove_item(
        &mut self,
        db: &mut GeometryDatabase,
        scene: &mut Scene,
        view: ItemView,
    ) -> Result<()> {
        db.remove_item(view)?;
        let name = view.item;
        self.version2name.remove(&view.version);
        scene.prune_item(name);

        if let Some(token) = self.preview_tokens.remove(&name) {
            token.cancel();
        }
        if let Some(temp) = self.plain_previews.remove(&name) {
            db.cancel_temporary(temp)?;
        }

        // Cascade: the item owned a modifier.
        if let Some(mut list) = self.map.shift_remove(&name) {
            list.cancel_preview(db)?;
            if let Some(derived) = list.derived() {
                db.remove_item(derived)?;
                scene.prune_item(derived.item);
                self.version2name.remove(&derived.version);
                self.modified_by.remove(&derived.item);
                self.gate.retire(derived.item);
            }
            self.modifies.remove(&name);
        }

        // The item was itself a derived entity.
        if let Some(base) = self.modified_by.remove(&name) {
            self.modifies.remove(&base);
            if let Some(list) = self.map.get_mut(&base) {
                list.clear_derived();
            }
        }

        self.gate.retire(name);
        debug!("removed {name} with cascade");
        Ok(())
    }

    /// Copy an item under a new logical identity; no bindings carry over
    pub fn duplicate(
        &mut self,
        db: &mut GeometryDatabase,
        scene: &mut Scene,
        view: ItemView,
    ) -> Result<ItemView> {
        let result = db.duplicate(view)?;
        scene.add_item(result.item)?;
        self.version2name.insert(result.version, result.item);
        Ok(result)
    }

    /// Publish a free-standing preview object
    pub fn add_temporary_item(
        &self,
        db: &mut GeometryDatabase,
        rep: Representation,
    ) -> Result<TemporaryObject> {
        db.add_temporary_item(rep)
    }

    /// Publish a preview standing in for `from`, last-wins per identity.
    ///
    /// Routes through the modifier's preview path when one is attached so
    /// the preview shows the derived result of the candidate
    /// representation; otherwise the candidate is shown directly. The
    /// previous preview for this identity is cancelled either way.
    pub fn replace_temporary_item(
        &mut self,
        db: &mut GeometryDatabase,
        from: ItemView,
        rep: Representation,
    ) -> Result<TemporaryObject> {
        let name = self.resolve_name(from.version)?;

        let token = CancellationToken::new();
        if let Some(previous) = self.preview_tokens.insert(name, token.clone()) {
            previous.cancel();
        }

        if let Some(list) = self.map.get_mut(&name) {
            list.preview(db, from, &rep, &token)
        } else {
            db.hide(from)?;
            let result = db.replace_temporary_item(from, rep)?;
            if let Some(previous) = self.plain_previews.insert(name, result) {
                db.cancel_temporary(previous)?;
            }
            db.show_temporary(result)?;
            Ok(result)
        }
    }

    // ----------------------------------------------------------------
    // Modifier attachment
    // ----------------------------------------------------------------

    /// Attach a symmetry modifier and compute its derived entity
    pub fn attach(
        &mut self,
        db: &mut GeometryDatabase,
        scene: &mut Scene,
        base: ItemView,
        spec: SymmetrySpec,
    ) -> Result<ItemView> {
        let name = self.resolve_name(base.version)?;
        db.lookup(base)?;
        if self.map.contains_key(&name) {
            return Err(GeomError::precondition(format!(
                "{name} already has a modifier attached"
            )));
        }

        let ticket = self.gate.issue(name)?;
        let result = (|| {
            let mut list = ModifierList::new(spec);
            let update = list.update(db, base, &CancellationToken::new())?;
            self.map.insert(name, list);
            self.register_derived(scene, name, update)?;
            Ok(update.view)
        })();
        self.gate.complete(ticket)?;
        result
    }

    /// Detach an item's modifier, removing its derived entity
    pub fn detach(
        &mut self,
        db: &mut GeometryDatabase,
        scene: &mut Scene,
        base: ItemId,
    ) -> Result<()> {
        let mut list = self
            .map
            .shift_remove(&base)
            .ok_or_else(|| GeomError::not_found(format!("modifier on {base}")))?;
        list.cancel_preview(db)?;
        if let Some(derived) = list.derived() {
            db.remove_item(derived)?;
            scene.prune_item(derived.item);
            self.version2name.remove(&derived.version);
            self.modified_by.remove(&derived.item);
            self.gate.retire(derived.item);
        }
        self.modifies.remove(&base);
        Ok(())
    }

    /// Recreate a modifier attachment from persisted state (document load)
    pub(crate) fn restore_modifier(
        &mut self,
        db: &GeometryDatabase,
        base: ItemId,
        chain: Vec<SymmetrySpec>,
        derived: Option<ItemId>,
    ) -> Result<()> {
        let last = derived.map(|d| db.current_view(d)).transpose()?;
        let list = ModifierList::restore(chain, last)?;
        self.map.insert(base, list);
        if let Some(d) = derived {
            self.modifies.insert(base, d);
            self.modified_by.insert(d, base);
        }
        Ok(())
    }

    /// Track a restored item's version mapping (document load)
    pub(crate) fn restore_mapping(&mut self, view: ItemView) {
        self.version2name.insert(view.version, view.item);
    }

    // ----------------------------------------------------------------
    // Pass-throughs and queries
    // ----------------------------------------------------------------

    /// Representation behind a handle
    pub fn lookup<'db>(
        &self,
        db: &'db GeometryDatabase,
        view: ItemView,
    ) -> Result<&'db Representation> {
        db.lookup(view)
    }

    /// Hide an item
    pub fn hide(&self, db: &mut GeometryDatabase, view: ItemView) -> Result<()> {
        db.hide(view)
    }

    /// Undo [`hide`](Self::hide)
    pub fn unhide(&self, db: &mut GeometryDatabase, view: ItemView) -> Result<()> {
        db.unhide(view)
    }

    /// Whether a logical identity has a modifier attached
    pub fn has_modifier(&self, item: ItemId) -> bool {
        self.map.contains_key(&item)
    }

    /// The modifier list attached to an item
    pub fn modifier(&self, item: ItemId) -> Option<&ModifierList> {
        self.map.get(&item)
    }

    /// Modifier attachments in attach order
    pub fn modifiers(&self) -> impl Iterator<Item = (ItemId, &ModifierList)> {
        self.map.iter().map(|(id, list)| (*id, list))
    }

    /// The derived entity a base entity is modified into
    pub fn modifies(&self, base: ItemId) -> Option<ItemId> {
        self.modifies.get(&base).copied()
    }

    /// The base entity a derived entity was modified from
    pub fn modified_by(&self, derived: ItemId) -> Option<ItemId> {
        self.modified_by.get(&derived).copied()
    }
}
