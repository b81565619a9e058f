use serde_json::json;
use treewatch::{
    Error,
    crdt::{CRDTError, ContainerKind, Doc, Input, Origin, Value},
};

use crate::helpers::*;

#[test]
fn test_root_containers_are_shared() {
    let doc = Doc::new();
    let first = doc.get_or_insert_map("settings").unwrap();
    let second = doc.get_or_insert_map("settings").unwrap();
    set(&first, "theme", "dark");

    assert_eq!(first, second);
    let txn = doc.transact().unwrap();
    assert_eq!(second.get(&txn, "theme").unwrap(), "dark");
    assert_eq!(doc.root_names(&txn), vec!["settings".to_string()]);
}

#[test]
fn test_root_kind_conflict() {
    let doc = Doc::new();
    doc.get_or_insert_list("items").unwrap();

    let err = doc.get_or_insert_map("items").unwrap_err();
    assert!(err.is_type_error());
    let err: Error = err.into();
    assert_eq!(err.module(), "crdt");
    let txn = doc.transact().unwrap();
    assert_eq!(doc.root(&txn, "items").unwrap().kind(), ContainerKind::List);
}

#[test]
fn test_nested_inputs_become_containers() {
    let (doc, root) = setup_root();
    set(
        &root,
        "page",
        json!({"title": "Intro", "tags": ["a", "b"], "meta": {"draft": true}}),
    );

    let page = child_map(&root, "page");
    let txn = doc.transact().unwrap();
    assert_eq!(page.keys(&txn), vec!["meta", "tags", "title"]);
    let tags = page.get(&txn, "tags").unwrap();
    assert_eq!(tags.as_list().unwrap().len(&txn), 2);
    assert_eq!(page.get(&txn, "meta").unwrap().type_name(), "map");
    assert_eq!(doc.to_json(&txn)["root"]["page"]["meta"], json!({"draft": true}));
}

#[test]
fn test_list_bounds() {
    let (doc, root) = setup_root();
    let list = set(&root, "list", Input::list([1, 2, 3]))
        .as_list()
        .cloned()
        .unwrap();

    let mut txn = doc.transact_mut().unwrap();
    assert_eq!(
        list.insert(&mut txn, 5, 9).unwrap_err(),
        CRDTError::IndexOutOfBounds { index: 5, len: 3 }
    );
    assert!(list.remove_range(&mut txn, 2, 2).unwrap_err().is_bounds_error());
    assert!(list.remove(&mut txn, 7).unwrap_err().is_bounds_error());
    assert_eq!(list.remove_range(&mut txn, 0, 2).unwrap().len(), 2);
    assert_eq!(list.to_json(&txn), json!([3]));
}

#[test]
fn test_scalars_compare_by_value_containers_by_identity() {
    let (doc, root) = setup_root();
    let a = set(&root, "a", Input::map([("x", 1)]));
    let b = set(&root, "b", Input::map([("x", 1)]));

    assert_ne!(a, b);
    assert_eq!(a, root.get(&doc.transact().unwrap(), "a").unwrap());
    assert_eq!(Value::Int(3), Value::Int(3));
    assert_eq!(set(&root, "s", "s"), "s");
    assert_eq!(root.get(&doc.transact().unwrap(), "n"), None);
}

#[test]
fn test_peers_converge_through_updates() {
    let (doc, root) = setup_root();
    let (peer, peer_root) = setup_root();
    set(&root, "local", 1);
    set(&peer_root, "remote", json!({"tags": ["x"]}));

    let to_doc = peer.encode_state_as_update(&doc.state_vector().unwrap()).unwrap();
    let to_peer = doc.encode_state_as_update(&peer.state_vector().unwrap()).unwrap();
    doc.apply_update(&to_doc, Origin::Remote("peer".into())).unwrap();
    peer.apply_update(&to_peer, Origin::Remote("doc".into())).unwrap();

    let expected = json!({"local": 1, "remote": {"tags": ["x"]}});
    assert_eq!(root.snapshot().unwrap(), expected);
    assert_eq!(peer_root.snapshot().unwrap(), expected);
}

#[test]
fn test_full_state_update_from_empty_state_vector() {
    let (doc, root) = setup_root();
    set(&root, "n", 1);
    let update = doc.encode_state_as_update(&[]).unwrap();

    let (copy, copy_root) = setup_root();
    copy.apply_update(&update, Origin::Local).unwrap();
    assert_eq!(copy_root.snapshot().unwrap(), json!({"n": 1}));
}

#[test]
fn test_malformed_update_is_rejected() {
    let (doc, _root) = setup_root();
    let err = doc.apply_update(&[0xff, 0x01], Origin::Local).unwrap_err();
    assert!(err.is_update_error());
    let err: Error = err.into();
    assert!(!err.is_transaction_error());
}
