//! Material table.
//!
//! Materials are named render appearances referenced from the scene by
//! [`MaterialId`]. The table owns the definitions; the scene records which
//! item uses which id. Absence of a binding means "use the default".

use crate::error::{GeomError, Result};
use crate::types::MaterialId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A named material definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// Human-readable name
    pub name: String,
    /// Base color as a 0xRRGGBB hex value
    pub color: u32,
}

impl Material {
    /// Create a material
    pub fn new(name: impl Into<String>, color: u32) -> Self {
        Material {
            name: name.into(),
            color,
        }
    }
}

/// Registry of material definitions, in creation order
#[derive(Debug, Default)]
pub struct MaterialDatabase {
    materials: IndexMap<MaterialId, Material>,
    next: u32,
}

impl MaterialDatabase {
    /// Create an empty table
    pub fn new() -> Self {
        MaterialDatabase {
            materials: IndexMap::new(),
            next: 1,
        }
    }

    /// Register a material and return its id
    pub fn add(&mut self, name: impl Into<String>, color: u32) -> MaterialId {
        let id = MaterialId::new(self.next);
        self.next += 1;
        self.materials.insert(id, Material::new(name, color));
        id
    }

    /// Recreate a material under a known id (document load path)
    pub(crate) fn restore(&mut self, id: MaterialId, material: Material) -> Result<()> {
        if self.materials.contains_key(&id) {
            return Err(GeomError::Internal(format!("{id} restored twice")));
        }
        self.next = self.next.max(id.value() + 1);
        self.materials.insert(id, material);
        Ok(())
    }

    /// Look up a material definition
    pub fn get(&self, id: MaterialId) -> Result<&Material> {
        self.materials
            .get(&id)
            .ok_or_else(|| GeomError::not_found(id.to_string()))
    }

    /// Whether an id refers to a registered material
    pub fn contains(&self, id: MaterialId) -> bool {
        self.materials.contains_key(&id)
    }

    /// Materials in creation order
    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials.iter().map(|(id, m)| (*id, m))
    }

    /// Number of registered materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
