//! Structural description of a document.
//!
//! The JSON-facing half of a saved document: everything except concrete
//! geometry. Item entries reference their geometry in the binary payload by
//! logical id; groups are captured root first with their exact child
//! ordering so a load reproduces the scene tree byte for byte.

use super::FORMAT_VERSION;
use crate::database::{GeometryDatabase, Origin};
use crate::error::{GeomError, Result};
use crate::manager::ModifierManager;
use crate::material::MaterialDatabase;
use crate::modifier::SymmetrySpec;
use crate::scene::{Scene, SceneRef};
use crate::types::{GroupId, ItemId, MaterialId};
use serde::{Deserialize, Serialize};

/// One persistent item, minus its geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEntry {
    pub id: ItemId,
    pub origin: Origin,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialId>,
}

/// One material definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub id: MaterialId,
    pub name: String,
    pub color: u32,
}

/// A child slot in a group's ordered child list
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "lowercase")]
pub enum ChildEntry {
    Item { item: ItemId },
    Group { group: GroupId },
}

impl From<SceneRef> for ChildEntry {
    fn from(node: SceneRef) -> Self {
        match node {
            SceneRef::Item(item) => ChildEntry::Item { item },
            SceneRef::Group(group) => ChildEntry::Group { group },
        }
    }
}

impl From<ChildEntry> for SceneRef {
    fn from(entry: ChildEntry) -> Self {
        match entry {
            ChildEntry::Item { item } => SceneRef::Item(item),
            ChildEntry::Group { group } => SceneRef::Group(group),
        }
    }
}

/// One group with its ordered children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub id: GroupId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub children: Vec<ChildEntry>,
}

/// One modifier attachment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierEntry {
    pub item: ItemId,
    pub chain: Vec<SymmetrySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived: Option<ItemId>,
}

/// Everything about a document except concrete geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralDescription {
    pub format: u32,
    pub items: Vec<ItemEntry>,
    pub materials: Vec<MaterialEntry>,
    /// Groups in creation order, root first
    pub groups: Vec<GroupEntry>,
    pub modifiers: Vec<ModifierEntry>,
}

impl StructuralDescription {
    /// Snapshot the structural state of a live editor session
    pub fn capture(
        db: &GeometryDatabase,
        scene: &Scene,
        materials: &MaterialDatabase,
        manager: &ModifierManager,
    ) -> Self {
        let items = db
            .items()
            .map(|record| ItemEntry {
                id: record.id,
                origin: record.origin,
                hidden: !record.flags.is_visible(),
                name: scene.get_name(record.id).ok().map(str::to_owned),
                material: scene.get_material(record.id).ok().flatten(),
            })
            .collect();

        let materials = materials
            .iter()
            .map(|(id, m)| MaterialEntry {
                id,
                name: m.name.clone(),
                color: m.color,
            })
            .collect();

        let groups = scene
            .groups()
            .map(|(id, children)| GroupEntry {
                id,
                name: scene.get_name(id).ok().map(str::to_owned),
                children: children.iter().map(|c| ChildEntry::from(*c)).collect(),
            })
            .collect();

        let modifiers = manager
            .modifiers()
            .map(|(item, list)| ModifierEntry {
                item,
                chain: list.chain().to_vec(),
                derived: list.derived().map(|view| view.item),
            })
            .collect();

        StructuralDescription {
            format: FORMAT_VERSION,
            items,
            materials,
            groups,
            modifiers,
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse from JSON; malformed input reports `CorruptDocument`
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            GeomError::corrupt(format!("structural description is malformed: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_survives_parse() {
        let desc = StructuralDescription {
            format: FORMAT_VERSION,
            items: vec![ItemEntry {
                id: ItemId::new(1),
                origin: Origin::User,
                hidden: false,
                name: Some("my first box".into()),
                material: None,
            }],
            materials: vec![],
            groups: vec![GroupEntry {
                id: GroupId::ROOT,
                name: None,
                children: vec![ChildEntry::Item {
                    item: ItemId::new(1),
                }],
            }],
            modifiers: vec![],
        };
        let json = desc.to_json().unwrap();
        assert_eq!(StructuralDescription::from_json(&json).unwrap(), desc);
    }

    #[test]
    fn test_malformed_json_is_corrupt() {
        assert!(matches!(
            StructuralDescription::from_json(b"{ not json"),
            Err(GeomError::CorruptDocument(_))
        ));
    }

    #[test]
    fn test_child_entry_tagging() {
        let json = serde_json::to_string(&ChildEntry::Group {
            group: GroupId::new(3),
        })
        .unwrap();
        assert!(json.contains("\"tag\":\"group\""));
    }
}
