//! Document persistence.
//!
//! A saved document is two artifacts: a JSON structural description
//! ([`StructuralDescription`]) and a compressed binary geometric payload.
//! [`Document`] bundles both and owns the load protocol: a document loads
//! only into an empty editor state, is validated in full before a single
//! table is touched, and restores items first so every later binding can
//! resolve.

mod payload;
mod snapshot;

pub use snapshot::{
    ChildEntry, GroupEntry, ItemEntry, MaterialEntry, ModifierEntry, StructuralDescription,
};

use crate::database::GeometryDatabase;
use crate::error::{GeomError, Result};
use crate::geometry::Representation;
use crate::manager::ModifierManager;
use crate::material::{Material, MaterialDatabase};
use crate::scene::{Scene, SceneRef};
use crate::types::{GroupId, ItemId};
use ahash::{AHashMap, AHashSet};
use log::info;

/// Version stamp shared by both document artifacts
pub const FORMAT_VERSION: u32 = 1;

/// A complete saved document: structure plus geometry.
#[derive(Debug, Clone)]
pub struct Document {
    description: StructuralDescription,
    geometry: Vec<(ItemId, Representation)>,
}

impl Document {
    /// Snapshot a live editor session
    pub fn capture(
        db: &GeometryDatabase,
        scene: &Scene,
        materials: &MaterialDatabase,
        manager: &ModifierManager,
    ) -> Self {
        let description = StructuralDescription::capture(db, scene, materials, manager);
        let geometry = db
            .iter()
            .map(|(record, rep)| (record.id, rep.clone()))
            .collect();
        Document {
            description,
            geometry,
        }
    }

    /// The structural half
    pub fn description(&self) -> &StructuralDescription {
        &self.description
    }

    /// Serialize into the two saved artifacts: (JSON, binary payload)
    pub fn to_parts(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let json = self.description.to_json()?;
        let bytes = payload::encode(self.geometry.iter().map(|(id, rep)| (*id, rep)))?;
        Ok((json, bytes))
    }

    /// Parse and cross-validate the two saved artifacts
    pub fn from_parts(json: &[u8], payload_bytes: &[u8]) -> Result<Self> {
        let description = StructuralDescription::from_json(json)?;
        let geometry = payload::decode(payload_bytes)?;
        let doc = Document {
            description,
            geometry,
        };
        doc.validate()?;
        Ok(doc)
    }

    /// Reject any internal inconsistency before a load may begin.
    ///
    /// Every cross-reference between the two artifacts and within the
    /// structural description is checked here, so a failed load leaves the
    /// target completely untouched.
    fn validate(&self) -> Result<()> {
        let desc = &self.description;
        if desc.format != FORMAT_VERSION {
            return Err(GeomError::corrupt(format!(
                "unsupported document format {}",
                desc.format
            )));
        }

        let mut item_ids = AHashSet::new();
        for entry in &desc.items {
            if !item_ids.insert(entry.id) {
                return Err(GeomError::corrupt(format!("{} listed twice", entry.id)));
            }
        }
        let payload_ids: AHashSet<ItemId> = self.geometry.iter().map(|(id, _)| *id).collect();
        if payload_ids != item_ids {
            return Err(GeomError::corrupt(
                "structural description and geometric payload disagree on items",
            ));
        }

        let mut material_ids = AHashSet::new();
        for entry in &desc.materials {
            if !material_ids.insert(entry.id) {
                return Err(GeomError::corrupt(format!("{} listed twice", entry.id)));
            }
        }
        for entry in &desc.items {
            if let Some(material) = entry.material {
                if !material_ids.contains(&material) {
                    return Err(GeomError::corrupt(format!(
                        "{} references unknown {material}",
                        entry.id
                    )));
                }
            }
        }

        match desc.groups.first() {
            Some(root) if root.id.is_root() => {}
            _ => return Err(GeomError::corrupt("first group must be the root group")),
        }
        let mut group_ids = AHashSet::new();
        for entry in &desc.groups {
            if !group_ids.insert(entry.id) {
                return Err(GeomError::corrupt(format!("{} listed twice", entry.id)));
            }
        }

        // Every item and every non-root group must appear in exactly one
        // child slot; the tree has no other shape.
        let mut seen_items = AHashSet::new();
        let mut seen_groups = AHashSet::new();
        let mut child_groups: AHashMap<GroupId, Vec<GroupId>> = AHashMap::new();
        for entry in &desc.groups {
            for child in &entry.children {
                match child {
                    ChildEntry::Item { item } => {
                        if !item_ids.contains(item) {
                            return Err(GeomError::corrupt(format!(
                                "{} references unknown {item}",
                                entry.id
                            )));
                        }
                        if !seen_items.insert(*item) {
                            return Err(GeomError::corrupt(format!(
                                "{item} parented twice"
                            )));
                        }
                    }
                    ChildEntry::Group { group } => {
                        if group.is_root() {
                            return Err(GeomError::corrupt(
                                "root group cannot be a child",
                            ));
                        }
                        if !group_ids.contains(group) {
                            return Err(GeomError::corrupt(format!(
                                "{} references unknown {group}",
                                entry.id
                            )));
                        }
                        if !seen_groups.insert(*group) {
                            return Err(GeomError::corrupt(format!(
                                "{group} parented twice"
                            )));
                        }
                        child_groups.entry(entry.id).or_default().push(*group);
                    }
                }
            }
        }
        if seen_items != item_ids {
            return Err(GeomError::corrupt("some items are missing from the tree"));
        }

        // Per-slot checks alone would accept a cycle disconnected from the
        // root; walk down from the root and require every group on the way.
        let mut reached = AHashSet::new();
        reached.insert(GroupId::ROOT);
        let mut stack = vec![GroupId::ROOT];
        while let Some(group) = stack.pop() {
            for child in child_groups.get(&group).map_or(&[][..], Vec::as_slice) {
                if reached.insert(*child) {
                    stack.push(*child);
                }
            }
        }
        if reached.len() != group_ids.len() {
            return Err(GeomError::corrupt(
                "some groups are not reachable from the root",
            ));
        }

        let mut modifier_bases = AHashSet::new();
        for entry in &desc.modifiers {
            if !item_ids.contains(&entry.item) {
                return Err(GeomError::corrupt(format!(
                    "modifier on unknown {}",
                    entry.item
                )));
            }
            if !modifier_bases.insert(entry.item) {
                return Err(GeomError::corrupt(format!(
                    "{} has two modifier entries",
                    entry.item
                )));
            }
            if entry.chain.is_empty() {
                return Err(GeomError::corrupt(format!(
                    "modifier on {} has an empty chain",
                    entry.item
                )));
            }
            if let Some(derived) = entry.derived {
                if derived == entry.item || !item_ids.contains(&derived) {
                    return Err(GeomError::corrupt(format!(
                        "modifier on {} has an invalid derived item",
                        entry.item
                    )));
                }
            }
        }

        Ok(())
    }

    /// Restore the document into an empty editor state.
    ///
    /// Items first, then materials, the group tree, bindings, and finally
    /// modifier attachments, so every reference resolves when it is
    /// rewired.
    pub fn load_into(
        &self,
        db: &mut GeometryDatabase,
        scene: &mut Scene,
        materials: &mut MaterialDatabase,
        manager: &mut ModifierManager,
    ) -> Result<()> {
        if !db.is_empty() || !scene.is_pristine() || !materials.is_empty() {
            return Err(GeomError::precondition(
                "a document can only load into an empty editor state",
            ));
        }
        self.validate()?;

        let geometry: AHashMap<ItemId, &Representation> =
            self.geometry.iter().map(|(id, rep)| (*id, rep)).collect();

        for entry in &self.description.items {
            let rep = (*geometry
                .get(&entry.id)
                .expect("validated against payload"))
            .clone();
            let view = db.restore_item(entry.id, rep, entry.origin, entry.hidden)?;
            manager.restore_mapping(view);
            scene.add_item(entry.id)?;
        }

        for entry in &self.description.materials {
            materials.restore(entry.id, Material::new(entry.name.clone(), entry.color))?;
        }

        for entry in &self.description.groups {
            if !entry.id.is_root() {
                scene.restore_group(entry.id)?;
            }
        }
        let lists: Vec<(GroupId, Vec<SceneRef>)> = self
            .description
            .groups
            .iter()
            .map(|entry| {
                (
                    entry.id,
                    entry.children.iter().map(|c| SceneRef::from(*c)).collect(),
                )
            })
            .collect();
        scene.restore_children(&lists)?;

        for entry in &self.description.groups {
            if let Some(name) = &entry.name {
                scene.set_name(entry.id, name.clone())?;
            }
        }
        for entry in &self.description.items {
            if let Some(name) = &entry.name {
                scene.set_name(entry.id, name.clone())?;
            }
            if let Some(material) = entry.material {
                scene.set_material(entry.id, material)?;
            }
        }

        for entry in &self.description.modifiers {
            manager.restore_modifier(db, entry.item, entry.chain.clone(), entry.derived)?;
        }

        info!(
            "loaded document: {} items, {} groups, {} materials, {} modifiers",
            self.description.items.len(),
            self.description.groups.len(),
            self.description.materials.len(),
            self.description.modifiers.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Origin;
    use crate::types::Vector3;

    fn cube() -> Representation {
        Representation::cuboid(Vector3::ZERO, Vector3::new(1.0, 1.0, 1.0))
    }

    fn single_item_doc() -> Document {
        let mut db = GeometryDatabase::new();
        let mut scene = Scene::new();
        let materials = MaterialDatabase::new();
        let mut manager = ModifierManager::new();
        manager
            .add_item(&mut db, &mut scene, cube(), Origin::User)
            .unwrap();
        Document::capture(&db, &scene, &materials, &manager)
    }

    #[test]
    fn test_parts_survive_reparse() {
        let doc = single_item_doc();
        let (json, payload) = doc.to_parts().unwrap();
        let parsed = Document::from_parts(&json, &payload).unwrap();
        assert_eq!(parsed.description(), doc.description());
    }

    #[test]
    fn test_payload_item_mismatch_is_corrupt() {
        let doc = single_item_doc();
        let (json, _) = doc.to_parts().unwrap();
        let other = {
            let mut db = GeometryDatabase::new();
            let mut scene = Scene::new();
            let materials = MaterialDatabase::new();
            let mut manager = ModifierManager::new();
            manager
                .add_item(&mut db, &mut scene, cube(), Origin::User)
                .unwrap();
            manager
                .add_item(&mut db, &mut scene, cube(), Origin::User)
                .unwrap();
            Document::capture(&db, &scene, &materials, &manager)
        };
        let (_, payload) = other.to_parts().unwrap();
        assert!(matches!(
            Document::from_parts(&json, &payload),
            Err(GeomError::CorruptDocument(_))
        ));
    }

    #[test]
    fn test_load_requires_empty_target() {
        let doc = single_item_doc();
        let mut db = GeometryDatabase::new();
        let mut scene = Scene::new();
        let mut materials = MaterialDatabase::new();
        let mut manager = ModifierManager::new();
        manager
            .add_item(&mut db, &mut scene, cube(), Origin::User)
            .unwrap();

        assert!(matches!(
            doc.load_into(&mut db, &mut scene, &mut materials, &mut manager),
            Err(GeomError::InvalidPrecondition(_))
        ));
        // Nothing was touched.
        assert_eq!(db.len(), 1);
    }
}
