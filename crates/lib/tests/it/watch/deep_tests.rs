use serde_json::json;
use treewatch::{
    crdt::Value,
    watch::{Path, watch_path, watch_path_str},
};

use crate::helpers::*;

fn path(s: &str) -> Path {
    s.parse().expect("valid path")
}

#[test]
fn test_initial_emission_reflects_current_state() {
    let (_doc, root) = setup_root();
    set(&root, "a", json!({"b": [1, 2]}));

    for (p, expected) in [
        ("a.b.[1]", json!(2)),
        ("a.b.[5]", json!(null)),
        ("a.missing", json!(null)),
        ("a.b", json!([1, 2])),
    ] {
        let recorder = record(&watch_path(root.clone(), &path(p)));
        assert_eq!(as_json(&recorder), vec![expected], "path {p}");
    }
}

#[test]
fn test_unchanged_value_is_not_reemitted() {
    let (doc, root) = setup_root();
    set(&root, "a", json!({"b": "x", "c": 1}));
    let a = child_map(&root, "a");
    let recorder = record(&watch_path(root.clone(), &path("a.b")));

    set(&a, "c", 2);
    set(&root, "sibling", true);
    set(&a, "b", "x");
    {
        let mut txn = doc.transact_mut().unwrap();
        a.insert(&mut txn, "b", "y").unwrap();
        a.insert(&mut txn, "b", "x").unwrap();
    }

    assert_eq!(as_json(&recorder), vec![json!("x")]);
}

#[test]
fn test_in_place_mutation_of_watched_container_is_not_reemitted() {
    let (_doc, root) = setup_root();
    set(&root, "a", json!({"b": {"n": 1}}));
    let b = child_map(&child_map(&root, "a"), "b");
    let recorder = record(&watch_path(root.clone(), &path("a.b")));

    set(&b, "n", 2);
    set(&b, "m", 3);

    assert_eq!(recorder.count(), 1);
    assert_eq!(as_json(&recorder), vec![json!({"n": 2, "m": 3})]);
}

#[test]
fn test_replaced_child_is_switched() {
    let (_doc, root) = setup_root();
    set(&root, "a", json!({"b": 1}));
    let old = child_map(&root, "a");
    let recorder = record(&watch_path(root.clone(), &path("a.b")));

    set(&root, "a", json!({"b": 2}));
    let new = child_map(&root, "a");

    set(&old, "b", 100);
    set(&new, "b", 3);

    assert_eq!(as_json(&recorder), vec![json!(1), json!(2), json!(3)]);
}

#[test]
fn test_disposal_stops_emissions() {
    let (_doc, root) = setup_root();
    set(&root, "a", json!({"b": 1}));
    let a = child_map(&root, "a");
    let mut recorder = record(&watch_path(root.clone(), &path("a.b")));

    set(&a, "b", 2);
    recorder.unsubscribe();
    set(&a, "b", 3);
    set(&root, "a", json!({"b": 4}));

    assert_eq!(as_json(&recorder), vec![json!(1), json!(2)]);
}

#[test]
fn test_absent_path_recovers() {
    let (_doc, root) = setup_root();
    let recorder = record(&watch_path(root.clone(), &path("x.y.z")));

    set(&root, "x", json!({"y": {"z": 5}}));

    assert_eq!(as_json(&recorder), vec![json!(null), json!(5)]);
}

#[test]
fn test_missing_piece_created_deeper_down() {
    let (_doc, root) = setup_root();
    set(&root, "x", json!({}));
    let x = child_map(&root, "x");
    let recorder = record(&watch_path(root.clone(), &path("x.y.z")));

    let y = set(&x, "y", json!({})).as_map().cloned().unwrap();
    assert_eq!(as_json(&recorder), vec![json!(null)]);
    set(&y, "z", "found");

    assert_eq!(recorder.last().flatten().unwrap(), "found");
    assert_eq!(recorder.count(), 2);
}

#[test]
fn test_kind_mismatch_resolves_to_none() {
    let (_doc, root) = setup_root();
    set(&root, "list", json!(["a", "b"]));
    set(&root, "map", json!({"k": "v"}));

    let by_key = record(&watch_path(root.clone(), &path("list.k")));
    let by_index = record(&watch_path(root.clone(), &path("map.[0]")));
    let through_scalar = record(&watch_path(root.clone(), &path("map.k.deeper")));
    let wildcard = record(&watch_path(root.clone(), &path("map.[*]")));

    for recorder in [&by_key, &by_index, &through_scalar, &wildcard] {
        assert_eq!(as_json(recorder), vec![json!(null)]);
    }
}

#[test]
fn test_list_positions_shift() {
    let (doc, root) = setup_root();
    let list = set(&root, "pages", json!([{"title": "one"}, {"title": "two"}]));
    let list = list.as_list().unwrap();
    let recorder = record(&watch_path(root.clone(), &path("pages.[0].title")));

    list.insert(&mut doc.transact_mut().unwrap(), 0, json!({"title": "zero"}))
        .unwrap();
    list.remove(&mut doc.transact_mut().unwrap(), 0).unwrap();
    list.remove(&mut doc.transact_mut().unwrap(), 0).unwrap();

    assert_eq!(
        as_json(&recorder),
        vec![json!("one"), json!("zero"), json!("one"), json!("two")]
    );
}

#[test]
fn test_independent_subscriptions() {
    let (_doc, root) = setup_root();
    let stream = watch_path_str(root.clone(), "a").unwrap();
    let mut first = record(&stream);
    let second = record(&stream);

    set(&root, "a", 1);
    first.unsubscribe();
    set(&root, "a", 2);

    assert_eq!(as_json(&first), vec![json!(null), json!(1)]);
    assert_eq!(as_json(&second), vec![json!(null), json!(1), json!(2)]);
}

#[test]
fn test_empty_path_is_constant() {
    let (_doc, root) = setup_root();
    let recorder = record(&watch_path(root.clone(), &Path::default()));
    set(&root, "a", 1);

    assert_eq!(recorder.count(), 1);
    assert_eq!(recorder.values()[0], Some(Value::Map(root)));
}

#[test]
fn test_malformed_path_is_rejected() {
    let (_doc, root) = setup_root();
    let err = watch_path_str(root, "a.[one]").err().unwrap();
    assert_eq!(err.segment(), "[one]");
}
