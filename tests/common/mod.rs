//! Shared test utilities for geomdb integration tests.

#![allow(dead_code)]

use geomdb::{
    GeometryDatabase, ItemView, ModifierManager, Origin, Representation, Scene, Vector3,
};
use geomdb::material::MaterialDatabase;

/// Comparison tolerance for geometric assertions
pub const TOL: f64 = 1e-9;

/// A complete editor state: database, scene, materials, and the manager
/// coordinating them.
pub struct Fixture {
    pub db: GeometryDatabase,
    pub scene: Scene,
    pub materials: MaterialDatabase,
    pub manager: ModifierManager,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            db: GeometryDatabase::new(),
            scene: Scene::new(),
            materials: MaterialDatabase::new(),
            manager: ModifierManager::new(),
        }
    }

    /// Add a user item through the manager, as the editor would
    pub fn add(&mut self, rep: Representation) -> ItemView {
        self.manager
            .add_item(&mut self.db, &mut self.scene, rep, Origin::User)
            .expect("add_item")
    }

    /// Add a unit cube at the origin
    pub fn add_unit_cube(&mut self) -> ItemView {
        self.add(unit_cube())
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Axis-aligned box between two corners
pub fn cuboid(min: Vector3, max: Vector3) -> Representation {
    Representation::cuboid(min, max)
}

/// Unit cube spanning (0,0,0)..(1,1,1)
pub fn unit_cube() -> Representation {
    cuboid(Vector3::ZERO, Vector3::new(1.0, 1.0, 1.0))
}

/// Cube spanning (0,0,0)..(s,s,s)
pub fn cube(s: f64) -> Representation {
    cuboid(Vector3::ZERO, Vector3::new(s, s, s))
}

pub fn assert_vec_eq(a: Vector3, b: Vector3) {
    assert!(
        a.distance(&b) < TOL,
        "vectors differ: {a} vs {b}"
    );
}
