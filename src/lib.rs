//! # geomdb
//!
//! A versioned geometry database with a modifier stack and document
//! persistence, built as the model layer of an interactive solid-modeling
//! editor.
//!
//! ## Features
//!
//! - Versioned storage: stable logical identity across replaces, with
//!   stale-handle detection
//! - Solid, curve, and planar-region representations
//! - Non-destructive symmetry modifiers with committed and preview
//!   recomputation paths
//! - Scene graph with ordered groups, name and material bindings
//! - Two-artifact document format: JSON structure plus compressed binary
//!   geometry, validated all-or-nothing on load
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use geomdb::{
//!     GeometryDatabase, ModifierManager, Origin, Representation, Scene,
//!     SymmetrySpec, Vector3,
//! };
//!
//! let mut db = GeometryDatabase::new();
//! let mut scene = Scene::new();
//! let mut manager = ModifierManager::new();
//!
//! // Add a box and mirror it across the YZ plane.
//! let rep = Representation::cuboid(Vector3::ZERO, Vector3::new(1.0, 1.0, 1.0));
//! let base = manager.add_item(&mut db, &mut scene, rep, Origin::User)?;
//! let derived = manager.attach(&mut db, &mut scene, base, SymmetrySpec::default())?;
//!
//! // Replacing the base recomputes the derived entity in place.
//! let bigger = Representation::cuboid(Vector3::ZERO, Vector3::new(2.0, 2.0, 2.0));
//! manager.replace_item(&mut db, &mut scene, base, bigger)?;
//! # Ok::<(), geomdb::GeomError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`GeometryDatabase`] - versioned store mapping logical ids to current
//!   versions and versions to representations
//! - [`ModifierManager`] - single mutation entry point; remaps versions to
//!   logical identities and drives modifier recomputation
//! - [`Scene`] - grouping hierarchy with name and material bindings, keyed
//!   by logical identity so bindings survive replaces
//! - [`Document`] - save/load of the whole editor state

#![allow(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod compute;
pub mod database;
pub mod document;
pub mod error;
pub mod geometry;
pub mod manager;
pub mod material;
pub mod modifier;
pub mod scene;
pub mod signals;
pub mod types;

// Re-export commonly used types
pub use error::{GeomError, Result};
pub use types::{
    BoundingBox3D, GroupId, ItemFlags, ItemId, MaterialId, Plane, Vector3, VersionId,
};

pub use compute::CancellationToken;
pub use database::{GeometryDatabase, ItemRecord, ItemView, Origin, TemporaryObject};
pub use document::{Document, StructuralDescription};
pub use geometry::{CurveRep, RegionRep, RepKind, Representation, SolidRep};
pub use manager::ModifierManager;
pub use material::{Material, MaterialDatabase};
pub use modifier::{ModifierList, SymmetrySpec};
pub use scene::{Scene, SceneRef};
pub use signals::{DbEvent, SignalLog};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_fresh_state_is_empty() {
        let db = GeometryDatabase::new();
        let scene = Scene::new();
        assert!(db.is_empty());
        assert!(scene.is_pristine());
    }
}
