//! Integration tests for the versioned store and its handle semantics.

mod common;

use common::*;
use geomdb::{DbEvent, GeomError, ItemView, Vector3};
use proptest::prelude::*;

#[test]
fn test_replace_keeps_logical_identity() {
    let mut fx = Fixture::new();
    let a = fx.add_unit_cube();
    fx.scene.set_name(a.item, "my first box").unwrap();

    let b = fx
        .manager
        .replace_item(&mut fx.db, &mut fx.scene, a, cube(2.0))
        .unwrap();

    assert_eq!(a.item, b.item);
    // Bindings key off the logical identity and survive the replace.
    assert_eq!(fx.scene.get_name(b.item).unwrap(), "my first box");
    // The old handle is stale everywhere.
    assert!(matches!(
        fx.db.lookup(a),
        Err(GeomError::StaleReference(_))
    ));
    assert!(fx
        .manager
        .replace_item(&mut fx.db, &mut fx.scene, a, cube(3.0))
        .is_err());
}

#[test]
fn test_remove_through_manager_releases_everything() {
    let mut fx = Fixture::new();
    let a = fx.add_unit_cube();
    let m = fx.materials.add("steel", 0x123456);
    fx.scene.set_name(a.item, "doomed").unwrap();
    fx.scene.set_material(a.item, m).unwrap();

    fx.manager
        .remove_item(&mut fx.db, &mut fx.scene, a)
        .unwrap();

    assert!(fx.db.is_empty());
    assert!(!fx.scene.contains_item(a.item));
    assert!(fx.scene.get_name(a.item).is_err());
    // The material definition itself is untouched.
    assert!(fx.materials.contains(m));
}

#[test]
fn test_signal_log_reports_mutations_in_order() {
    let mut fx = Fixture::new();
    let a = fx.add_unit_cube();
    let b = fx
        .manager
        .replace_item(&mut fx.db, &mut fx.scene, a, cube(2.0))
        .unwrap();
    fx.manager
        .remove_item(&mut fx.db, &mut fx.scene, b)
        .unwrap();

    let events = fx.db.drain_signals();
    assert_eq!(
        events,
        vec![
            DbEvent::ItemAdded {
                item: a.item,
                version: a.version
            },
            DbEvent::ItemReplaced {
                item: a.item,
                old_version: a.version,
                new_version: b.version
            },
            DbEvent::ItemRemoved {
                item: b.item,
                version: b.version
            },
        ]
    );
    assert!(fx.db.signals().is_empty());
}

#[test]
fn test_duplicate_is_independent() {
    let mut fx = Fixture::new();
    let a = fx.add_unit_cube();
    let b = fx
        .manager
        .duplicate(&mut fx.db, &mut fx.scene, a)
        .unwrap();

    // Replacing the copy leaves the original alone.
    fx.manager
        .replace_item(&mut fx.db, &mut fx.scene, b, cube(5.0))
        .unwrap();
    let bbox = fx.db.lookup(a).unwrap().bounding_box().unwrap();
    assert_vec_eq(bbox.max, Vector3::new(1.0, 1.0, 1.0));
}

#[derive(Debug, Clone)]
enum Op {
    Add(f64),
    Replace(usize, f64),
    Remove(usize),
    ToggleHidden(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1.0..100.0f64).prop_map(Op::Add),
        (any::<usize>(), 1.0..100.0f64).prop_map(|(i, s)| Op::Replace(i, s)),
        any::<usize>().prop_map(Op::Remove),
        any::<usize>().prop_map(Op::ToggleHidden),
    ]
}

proptest! {
    /// Any sequence of mutations keeps the store's identity tables
    /// consistent: live handles resolve, superseded handles are stale, and
    /// current versions are unique.
    #[test]
    fn prop_mutation_sequences_keep_handles_consistent(
        ops in prop::collection::vec(op_strategy(), 1..40)
    ) {
        let mut fx = Fixture::new();
        let mut live: Vec<ItemView> = Vec::new();
        let mut retired: Vec<ItemView> = Vec::new();

        for op in ops {
            match op {
                Op::Add(s) => {
                    live.push(fx.add(cube(s)));
                }
                Op::Replace(i, s) => {
                    if live.is_empty() { continue; }
                    let i = i % live.len();
                    let old = live[i];
                    let new = fx.manager
                        .replace_item(&mut fx.db, &mut fx.scene, old, cube(s))
                        .unwrap();
                    prop_assert_eq!(old.item, new.item);
                    retired.push(old);
                    live[i] = new;
                }
                Op::Remove(i) => {
                    if live.is_empty() { continue; }
                    let i = i % live.len();
                    let view = live.remove(i);
                    fx.manager
                        .remove_item(&mut fx.db, &mut fx.scene, view)
                        .unwrap();
                    retired.push(view);
                }
                Op::ToggleHidden(i) => {
                    if live.is_empty() { continue; }
                    let view = live[i % live.len()];
                    if fx.db.is_hidden(view.item).unwrap() {
                        fx.db.unhide(view).unwrap();
                    } else {
                        fx.db.hide(view).unwrap();
                    }
                }
            }

            prop_assert_eq!(fx.db.len(), live.len());
            for view in &live {
                prop_assert!(fx.db.lookup(*view).is_ok());
                prop_assert!(fx.scene.contains_item(view.item));
            }
            let mut versions = fx.db.current_versions();
            versions.sort();
            versions.dedup();
            prop_assert_eq!(versions.len(), live.len());
        }

        for view in &retired {
            prop_assert!(fx.db.lookup(*view).is_err());
        }
    }
}
