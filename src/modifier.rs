//! Non-destructive modifier stack.
//!
//! A [`ModifierList`] is attached to one logical identity and derives a
//! second entity from the base by applying its chain of symmetry
//! modifiers. Recomputation replaces the previous derived version rather
//! than accumulating new entities; the derived item is tagged
//! [`Origin::Automatic`].

use crate::compute::CancellationToken;
use crate::database::{GeometryDatabase, ItemView, Origin, TemporaryObject};
use crate::error::{GeomError, Result};
use crate::geometry::{kernel, Representation};
use crate::types::{Plane, VersionId};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Parameters of one symmetry modifier
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SymmetrySpec {
    /// Mirror plane
    pub plane: Plane,
}

impl SymmetrySpec {
    /// Symmetry across a given plane
    pub fn across(plane: Plane) -> Self {
        SymmetrySpec { plane }
    }
}

/// Result of a committed modifier recomputation
#[derive(Debug, Clone, Copy)]
pub struct ModifierUpdate {
    /// Handle to the derived entity after recomputation
    pub view: ItemView,
    /// Version the derived entity held before, `None` on first computation
    pub replaced: Option<VersionId>,
}

/// The modifier chain of one logical identity.
///
/// State machine: no derived version yet -> derived version `V`, where each
/// committed [`update`](Self::update) replaces `V` in place and each
/// [`preview`](Self::preview) publishes a temporary object superseding the
/// previous one.
#[derive(Debug)]
pub struct ModifierList {
    chain: Vec<SymmetrySpec>,
    last: Option<ItemView>,
    temp: Option<TemporaryObject>,
}

impl ModifierList {
    /// Create a list holding a single symmetry modifier
    pub fn new(spec: SymmetrySpec) -> Self {
        ModifierList {
            chain: vec![spec],
            last: None,
            temp: None,
        }
    }

    /// Create a list from an ordered modifier chain
    pub fn from_chain(chain: Vec<SymmetrySpec>) -> Result<Self> {
        if chain.is_empty() {
            return Err(GeomError::precondition("modifier chain cannot be empty"));
        }
        Ok(ModifierList {
            chain,
            last: None,
            temp: None,
        })
    }

    /// Recreate a list with an already-live derived entity (document load)
    pub(crate) fn restore(chain: Vec<SymmetrySpec>, last: Option<ItemView>) -> Result<Self> {
        let mut list = Self::from_chain(chain)?;
        list.last = last;
        Ok(list)
    }

    /// The ordered modifier chain
    pub fn chain(&self) -> &[SymmetrySpec] {
        &self.chain
    }

    /// Handle to the current derived entity, if one has been computed
    pub fn derived(&self) -> Option<ItemView> {
        self.last
    }

    /// The live preview object, if any
    pub fn temp(&self) -> Option<TemporaryObject> {
        self.temp
    }

    /// Apply the chain to a base representation
    fn compute(
        &self,
        base: &Representation,
        token: &CancellationToken,
    ) -> Result<Representation> {
        let mut rep = base.clone();
        for spec in &self.chain {
            rep = kernel::apply_symmetry(&rep, &spec.plane, token)?;
        }
        Ok(rep)
    }

    /// Committed recomputation from the base's current representation.
    ///
    /// The first run creates the derived entity; later runs replace its
    /// version in place. Kernel failures propagate to the caller.
    pub fn update(
        &mut self,
        db: &mut GeometryDatabase,
        base: ItemView,
        token: &CancellationToken,
    ) -> Result<ModifierUpdate> {
        let base_rep = db.lookup(base)?.clone();
        let derived_rep = self.compute(&base_rep, token)?;

        let update = match self.last {
            Some(prev) => {
                let view = db.replace_item(prev, derived_rep)?;
                ModifierUpdate {
                    view,
                    replaced: Some(prev.version),
                }
            }
            None => {
                let view = db.add_item(derived_rep, Origin::Automatic)?;
                ModifierUpdate {
                    view,
                    replaced: None,
                }
            }
        };
        self.last = Some(update.view);
        debug!("modifier on {} recomputed -> {}", base.item, update.view);
        Ok(update)
    }

    /// Preview recomputation for live-drag interaction.
    ///
    /// Hides the base, applies the chain to the candidate representation
    /// (the in-progress geometry, not the committed one), publishes the
    /// result as a visible temporary object, and cancels the previous
    /// preview for this logical identity. Transient kernel failures are
    /// swallowed and the previous preview is retained so a momentarily
    /// invalid configuration does not tear down the interaction.
    pub fn preview(
        &mut self,
        db: &mut GeometryDatabase,
        base: ItemView,
        candidate: &Representation,
        token: &CancellationToken,
    ) -> Result<TemporaryObject> {
        db.hide(base)?;

        let derived_rep = match self.compute(candidate, token) {
            Ok(rep) => rep,
            Err(GeomError::Computation(msg)) if self.temp.is_some() => {
                warn!("preview recomputation failed, retaining previous: {msg}");
                return Ok(self.temp.expect("checked above"));
            }
            Err(e) => return Err(e),
        };

        let result = db.replace_temporary_item(base, derived_rep)?;
        if let Some(prev) = self.temp.take() {
            db.cancel_temporary(prev)?;
        }
        db.show_temporary(result)?;
        self.temp = Some(result);
        Ok(result)
    }

    /// Cancel the live preview, if any
    pub fn cancel_preview(&mut self, db: &mut GeometryDatabase) -> Result<()> {
        if let Some(temp) = self.temp.take() {
            db.cancel_temporary(temp)?;
        }
        Ok(())
    }

    /// Forget the derived entity handle (its removal is the caller's job)
    pub(crate) fn clear_derived(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vector3;

    fn cube() -> Representation {
        Representation::cuboid(Vector3::ZERO, Vector3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_update_creates_then_replaces() {
        let mut db = GeometryDatabase::new();
        let base = db.add_item(cube(), Origin::User).unwrap();
        let mut list = ModifierList::new(SymmetrySpec::default());
        let token = CancellationToken::new();

        let first = list.update(&mut db, base, &token).unwrap();
        assert!(first.replaced.is_none());
        assert_eq!(db.len(), 2);
        assert_eq!(
            db.record(first.view.item).unwrap().origin,
            Origin::Automatic
        );

        let second = list.update(&mut db, base, &token).unwrap();
        assert_eq!(second.replaced, Some(first.view.version));
        assert_eq!(second.view.item, first.view.item);
        // Replaced, not duplicated.
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn test_chain_applies_in_order() {
        let mut db = GeometryDatabase::new();
        let curve = Representation::polyline(vec![
            Vector3::new(0.25, 0.0, 0.0),
            Vector3::new(0.5, 0.0, 0.0),
        ]);
        let base = db.add_item(curve, Origin::User).unwrap();
        let offset = Plane::new(Vector3::new(1.0, 0.0, 0.0), Vector3::UNIT_X);
        let mut list = ModifierList::from_chain(vec![
            SymmetrySpec::across(Plane::YZ),
            SymmetrySpec::across(offset),
        ])
        .unwrap();
        let token = CancellationToken::new();

        let update = list.update(&mut db, base, &token).unwrap();
        // x -> -x across YZ, then x -> 2 - x across x = 1. The reverse
        // order would land at -1.75 and -1.5.
        assert_eq!(
            db.lookup(update.view).unwrap().points(),
            &[Vector3::new(2.25, 0.0, 0.0), Vector3::new(2.5, 0.0, 0.0)]
        );
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert!(matches!(
            ModifierList::from_chain(Vec::new()),
            Err(GeomError::InvalidPrecondition(_))
        ));
    }

    #[test]
    fn test_derived_spans_mirror() {
        let mut db = GeometryDatabase::new();
        let base = db.add_item(cube(), Origin::User).unwrap();
        let mut list = ModifierList::new(SymmetrySpec::across(Plane::YZ));
        let token = CancellationToken::new();

        let update = list.update(&mut db, base, &token).unwrap();
        let bbox = db.lookup(update.view).unwrap().bounding_box().unwrap();
        assert_eq!(bbox.min, Vector3::new(-1.0, 0.0, 0.0));
        assert_eq!(bbox.max, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_preview_supersedes_previous() {
        let mut db = GeometryDatabase::new();
        let base = db.add_item(cube(), Origin::User).unwrap();
        let mut list = ModifierList::new(SymmetrySpec::default());
        let token = CancellationToken::new();

        let first = list.preview(&mut db, base, &cube(), &token).unwrap();
        assert!(db.is_hidden(base.item).unwrap());
        assert!(db.temporary_visible(first).unwrap());

        let second = list.preview(&mut db, base, &cube(), &token).unwrap();
        assert_ne!(first, second);
        assert_eq!(db.temporary_count(), 1);
        assert!(db.lookup_temporary(first).is_err());
        assert!(db.temporary_visible(second).unwrap());
    }

    #[test]
    fn test_preview_failure_retains_previous() {
        let mut db = GeometryDatabase::new();
        let base = db.add_item(cube(), Origin::User).unwrap();
        let mut list = ModifierList::new(SymmetrySpec::default());
        let token = CancellationToken::new();

        let good = list.preview(&mut db, base, &cube(), &token).unwrap();

        // Degenerate plane makes the kernel fail transiently.
        list.chain[0].plane = Plane::new(Vector3::ZERO, Vector3::ZERO);
        let retained = list.preview(&mut db, base, &cube(), &token).unwrap();
        assert_eq!(retained, good);
        assert_eq!(db.temporary_count(), 1);
    }

    #[test]
    fn test_preview_failure_without_previous_propagates() {
        let mut db = GeometryDatabase::new();
        let base = db.add_item(cube(), Origin::User).unwrap();
        let mut list =
            ModifierList::new(SymmetrySpec::across(Plane::new(Vector3::ZERO, Vector3::ZERO)));
        let token = CancellationToken::new();

        assert!(matches!(
            list.preview(&mut db, base, &cube(), &token),
            Err(GeomError::Computation(_))
        ));
    }

    #[test]
    fn test_committed_update_propagates_failure() {
        let mut db = GeometryDatabase::new();
        let base = db.add_item(cube(), Origin::User).unwrap();
        let mut list =
            ModifierList::new(SymmetrySpec::across(Plane::new(Vector3::ZERO, Vector3::ZERO)));
        let token = CancellationToken::new();

        assert!(matches!(
            list.update(&mut db, base, &token),
            Err(GeomError::Computation(_))
        ));
        // No partial mutation committed.
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_cancel_preview() {
        let mut db = GeometryDatabase::new();
        let base = db.add_item(cube(), Origin::User).unwrap();
        let mut list = ModifierList::new(SymmetrySpec::default());
        let token = CancellationToken::new();

        list.preview(&mut db, base, &cube(), &token).unwrap();
        list.cancel_preview(&mut db).unwrap();
        assert_eq!(db.temporary_count(), 0);
        // Cancelling again is a no-op.
        list.cancel_preview(&mut db).unwrap();
    }
}
