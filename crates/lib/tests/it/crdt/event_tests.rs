use std::{cell::RefCell, rc::Rc};

use serde_json::json;
use treewatch::{
    crdt::{EntryChange, Event, EventKind, ListChange, MapRef, Origin, PathSegment},
    observable::Subscription,
    watch::watch_path_str,
};

use crate::helpers::*;

type Batches = Rc<RefCell<Vec<Vec<(Vec<PathSegment>, Vec<String>)>>>>;

/// Records every deep batch as (path, changed keys) pairs.
fn deep_batches(map: &MapRef) -> (Batches, Subscription) {
    let batches: Batches = Rc::default();
    let sink = batches.clone();
    let sub = map.observe_deep(move |events: &[Event]| {
        sink.borrow_mut().push(
            events
                .iter()
                .map(|e| {
                    let keys = e.keys_changed().into_iter().map(String::from).collect();
                    (e.path().to_vec(), keys)
                })
                .collect(),
        );
    });
    (batches, sub)
}

#[test]
fn test_transaction_delivers_one_deep_batch() {
    let (doc, root) = setup_root();
    set(&root, "a", json!({"b": {}}));
    let a = child_map(&root, "a");
    let b = child_map(&a, "b");

    let (batches, _sub) = deep_batches(&root);
    {
        let mut txn = doc.transact_mut().unwrap();
        b.insert(&mut txn, "x", 1).unwrap();
        a.insert(&mut txn, "y", 2).unwrap();
        b.insert(&mut txn, "z", 3).unwrap();
    }

    let batches = batches.borrow();
    assert_eq!(batches.len(), 1);
    // shallower events first
    assert_eq!(
        batches[0],
        vec![
            (vec![PathSegment::from("a")], vec!["y".to_string()]),
            (
                vec![PathSegment::from("a"), PathSegment::from("b")],
                vec!["x".to_string(), "z".to_string()]
            ),
        ]
    );
}

#[test]
fn test_observers_wait_for_commit() {
    let (doc, root) = setup_root();
    let (batches, _sub) = deep_batches(&root);

    let mut txn = doc.transact_mut().unwrap();
    set_in(&mut txn, &root, "a", 1);
    assert!(doc.transact_mut().unwrap_err().is_transaction_error());
    set_in(&mut txn, &root, "b", 2);
    assert!(batches.borrow().is_empty());
    drop(txn);

    assert_eq!(batches.borrow().len(), 1);
}

fn set_in(txn: &mut treewatch::crdt::TransactionMut<'_>, map: &MapRef, key: &str, value: i64) {
    map.insert(txn, key, value).unwrap();
}

#[test]
fn test_observer_may_write_back() {
    let (_doc, root) = setup_root();
    let writer = root.clone();
    let _sub = root.observe(move |event| {
        if event.keys_changed().contains(&"input") {
            let mut txn = writer.doc().transact_mut().unwrap();
            writer.insert(&mut txn, "echo", true).unwrap();
        }
    });

    set(&root, "input", 1);
    assert_eq!(root.snapshot().unwrap(), json!({"input": 1, "echo": true}));
}

#[test]
fn test_repeated_writes_coalesce() {
    let (doc, root) = setup_root();
    set(&root, "kept", 1);

    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = changes.clone();
    let _sub = root.observe(move |event| {
        if let EventKind::Map { keys } = event.kind() {
            sink.borrow_mut().extend(keys.clone());
        }
    });

    {
        let mut txn = doc.transact_mut().unwrap();
        root.insert(&mut txn, "kept", 2).unwrap();
        root.insert(&mut txn, "kept", 3).unwrap();
        root.insert(&mut txn, "temp", 1).unwrap();
        root.remove(&mut txn, "temp").unwrap();
    }

    let changes = changes.borrow();
    assert_eq!(changes.len(), 1);
    let (key, change) = &changes[0];
    assert_eq!(key, "kept");
    match change {
        EntryChange::Updated(old, new) => {
            assert_eq!(*old, 1);
            assert_eq!(*new, 3);
        }
        other => panic!("expected an update, got {other:?}"),
    }
}

#[test]
fn test_list_events_carry_structural_changes() {
    let (doc, root) = setup_root();
    let list = set(&root, "items", json!([1, 2, 3])).as_list().cloned().unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let _sub = list.observe(move |event| {
        if let EventKind::List { changes } = event.kind() {
            sink.borrow_mut().extend(changes.iter().copied());
        }
    });
    {
        let mut txn = doc.transact_mut().unwrap();
        list.push(&mut txn, 4).unwrap();
        list.remove_range(&mut txn, 0, 2).unwrap();
    }

    // computed against the list as it was before the transaction
    assert_eq!(
        *seen.borrow(),
        vec![
            ListChange::Removed { index: 0, len: 2 },
            ListChange::Inserted { index: 1, len: 1 },
        ]
    );
}

#[test]
fn test_list_paths_follow_current_position() {
    let (doc, root) = setup_root();
    let list = set(&root, "pages", json!([{"n": 0}, {"n": 1}]))
        .as_list()
        .cloned()
        .unwrap();
    let second = list
        .get(&doc.transact().unwrap(), 1)
        .unwrap()
        .as_map()
        .cloned()
        .unwrap();

    let (batches, _sub) = deep_batches(&root);
    list.remove(&mut doc.transact_mut().unwrap(), 0).unwrap();
    set(&second, "n", 10);

    let batches = batches.borrow();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[1][0].0, vec![PathSegment::from("pages"), PathSegment::from(0)]);
}

#[test]
fn test_replaced_containers_stop_reporting() {
    let (_doc, root) = setup_root();
    set(&root, "old", json!({}));
    let old = child_map(&root, "old");

    let (batches, _sub) = deep_batches(&root);
    set(&root, "old", "replaced");
    set(&old, "x", 1);

    assert_eq!(batches.borrow().len(), 1);
    assert_eq!(old.snapshot().unwrap(), json!({}));
}

#[test]
fn test_origin_is_reported() {
    let (doc, root) = setup_root();
    let origins = Rc::new(RefCell::new(Vec::new()));
    let sink = origins.clone();
    let _sub = root.observe(move |event| sink.borrow_mut().push(event.origin().clone()));

    set(&root, "local", true);
    {
        let mut txn = doc.transact_mut_with(Origin::Remote("peer-1".into())).unwrap();
        root.insert(&mut txn, "remote", true).unwrap();
    }

    assert_eq!(
        *origins.borrow(),
        vec![Origin::Local, Origin::Remote("peer-1".into())]
    );
}

#[test]
fn test_remote_update_reaches_observers_and_watchers() {
    let (doc, root) = setup_root();
    let (peer, peer_root) = setup_root();

    let origins = Rc::new(RefCell::new(Vec::new()));
    let sink = origins.clone();
    let _sub = root.observe(move |event| sink.borrow_mut().push(event.origin().clone()));
    let title = record(&watch_path_str(root.clone(), "page.title").unwrap());

    set(&peer_root, "page", json!({"title": "from peer"}));
    let update = peer
        .encode_state_as_update(&doc.state_vector().unwrap())
        .unwrap();
    doc.apply_update(&update, Origin::Remote("peer".into()))
        .unwrap();

    assert_eq!(*origins.borrow(), vec![Origin::Remote("peer".into())]);
    assert_eq!(as_json(&title), vec![json!(null), json!("from peer")]);
}

#[test]
fn test_shallow_observer_disposal() {
    let (_doc, root) = setup_root();
    let count = Rc::new(RefCell::new(0));
    let sink = count.clone();
    let sub = root.observe(move |_| *sink.borrow_mut() += 1);

    set(&root, "a", 1);
    sub.unsubscribe();
    set(&root, "b", 2);
    assert_eq!(*count.borrow(), 1);
}
