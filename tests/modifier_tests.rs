//! Integration tests for modifier attachment, recomputation, and previews.

mod common;

use common::*;
use geomdb::{GeomError, Origin, Plane, SymmetrySpec, Vector3};

#[test]
fn test_attach_creates_mirrored_derived_entity() {
    let mut fx = Fixture::new();
    let base = fx.add_unit_cube();
    let derived = fx
        .manager
        .attach(&mut fx.db, &mut fx.scene, base, SymmetrySpec::across(Plane::YZ))
        .unwrap();

    assert_eq!(fx.db.len(), 2);
    assert_eq!(
        fx.db.record(derived.item).unwrap().origin,
        Origin::Automatic
    );
    let bbox = fx.db.lookup(derived).unwrap().bounding_box().unwrap();
    assert_vec_eq(bbox.min, Vector3::new(-1.0, 0.0, 0.0));
    assert_vec_eq(bbox.max, Vector3::new(1.0, 1.0, 1.0));

    assert_eq!(fx.manager.modifies(base.item), Some(derived.item));
    assert_eq!(fx.manager.modified_by(derived.item), Some(base.item));
}

#[test]
fn test_base_replace_recomputes_in_place() {
    let mut fx = Fixture::new();
    let base = fx.add_unit_cube();
    let derived = fx
        .manager
        .attach(&mut fx.db, &mut fx.scene, base, SymmetrySpec::default())
        .unwrap();

    fx.manager
        .replace_item(&mut fx.db, &mut fx.scene, base, cube(2.0))
        .unwrap();

    // Same derived identity, new version, still only two items.
    assert_eq!(fx.db.len(), 2);
    let current = fx.db.current_view(derived.item).unwrap();
    assert_ne!(current.version, derived.version);
    let bbox = fx.db.lookup(current).unwrap().bounding_box().unwrap();
    assert_vec_eq(bbox.min, Vector3::new(-2.0, 0.0, 0.0));
    assert_vec_eq(bbox.max, Vector3::new(2.0, 2.0, 2.0));
}

#[test]
fn test_preview_shows_derived_candidate() {
    let mut fx = Fixture::new();
    let base = fx.add_unit_cube();
    fx.manager
        .attach(&mut fx.db, &mut fx.scene, base, SymmetrySpec::across(Plane::YZ))
        .unwrap();

    let candidate = cuboid(Vector3::ZERO, Vector3::new(4.0, 1.0, 1.0));
    let temp = fx
        .manager
        .replace_temporary_item(&mut fx.db, base, candidate)
        .unwrap();

    assert!(fx.db.is_hidden(base.item).unwrap());
    assert!(fx.db.temporary_visible(temp).unwrap());
    let bbox = fx
        .db
        .lookup_temporary(temp)
        .unwrap()
        .bounding_box()
        .unwrap();
    assert_vec_eq(bbox.min, Vector3::new(-4.0, 0.0, 0.0));
    assert_vec_eq(bbox.max, Vector3::new(4.0, 1.0, 1.0));

    // The committed tables are untouched by previews.
    assert_eq!(fx.db.len(), 2);
}

#[test]
fn test_preview_is_last_wins() {
    let mut fx = Fixture::new();
    let base = fx.add_unit_cube();
    fx.manager
        .attach(&mut fx.db, &mut fx.scene, base, SymmetrySpec::default())
        .unwrap();

    let first = fx
        .manager
        .replace_temporary_item(&mut fx.db, base, cube(2.0))
        .unwrap();
    let second = fx
        .manager
        .replace_temporary_item(&mut fx.db, base, cube(3.0))
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(fx.db.temporary_count(), 1);
    assert!(fx.db.lookup_temporary(first).is_err());
    assert!(fx.db.temporary_visible(second).unwrap());
}

#[test]
fn test_remove_base_cascades() {
    let mut fx = Fixture::new();
    let base = fx.add_unit_cube();
    let derived = fx
        .manager
        .attach(&mut fx.db, &mut fx.scene, base, SymmetrySpec::default())
        .unwrap();
    fx.manager
        .replace_temporary_item(&mut fx.db, base, cube(2.0))
        .unwrap();

    fx.manager
        .remove_item(&mut fx.db, &mut fx.scene, base)
        .unwrap();

    assert!(fx.db.is_empty());
    assert_eq!(fx.db.temporary_count(), 0);
    assert!(!fx.scene.contains_item(derived.item));
    assert_eq!(fx.manager.modified_by(derived.item), None);
}

#[test]
fn test_detach_removes_derived_only() {
    let mut fx = Fixture::new();
    let base = fx.add_unit_cube();
    let derived = fx
        .manager
        .attach(&mut fx.db, &mut fx.scene, base, SymmetrySpec::default())
        .unwrap();

    fx.manager
        .detach(&mut fx.db, &mut fx.scene, base.item)
        .unwrap();

    assert_eq!(fx.db.len(), 1);
    assert!(fx.db.contains(base.item));
    assert!(!fx.db.contains(derived.item));
    assert!(!fx.manager.has_modifier(base.item));
}

#[test]
fn test_failed_commit_leaves_state_intact() {
    let mut fx = Fixture::new();
    let base = fx.add_unit_cube();
    let degenerate = SymmetrySpec::across(Plane::new(Vector3::ZERO, Vector3::ZERO));

    assert!(matches!(
        fx.manager
            .attach(&mut fx.db, &mut fx.scene, base, degenerate),
        Err(GeomError::Computation(_))
    ));

    assert_eq!(fx.db.len(), 1);
    assert!(!fx.manager.has_modifier(base.item));
    // The base is still fully mutable afterwards.
    assert!(fx
        .manager
        .replace_item(&mut fx.db, &mut fx.scene, base, cube(2.0))
        .is_ok());
}
