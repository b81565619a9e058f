use serde_json::json;
use treewatch::{
    crdt::{Doc, Origin},
    watch::{parse_path, watch_path, watch_path_pattern},
};

use crate::helpers::*;

#[test]
fn test_subkey_lifecycle() {
    let doc = Doc::new();
    let foo = doc.get_or_insert_map("foo").unwrap();
    let recorder = record(&watch_path(foo.clone(), &parse_path("key.subkey").unwrap()));
    assert_eq!(as_json(&recorder), vec![json!(null)]);

    set(&foo, "key", json!({"subkey": "xxxzzz"}));
    assert_eq!(recorder.last().flatten().unwrap(), "xxxzzz");

    let key = child_map(&foo, "key");
    set(&key, "subkey", "yyy");
    assert_eq!(recorder.last().flatten().unwrap(), "yyy");

    key.remove(&mut doc.transact_mut().unwrap(), "subkey").unwrap();
    assert_eq!(recorder.last(), Some(None));

    // the path already resolves to nothing; neither step re-emits
    foo.remove(&mut doc.transact_mut().unwrap(), "key").unwrap();
    set(&foo, "key", "plain string");

    assert_eq!(
        as_json(&recorder),
        vec![json!(null), json!("xxxzzz"), json!("yyy"), json!(null)]
    );
}

#[test]
fn test_remote_edits_are_observed() {
    let doc = Doc::new();
    let root = doc.get_or_insert_map("doc").unwrap();
    set(&root, "pages", json!([{"title": "draft"}]));

    let title = record(&watch_path(
        root.clone(),
        &parse_path("pages.[0].title").unwrap(),
    ));
    let any_page = record(&watch_path_pattern(
        root_container(&root),
        &parse_path("pages.[*]").unwrap(),
    ));

    let page = {
        let txn = doc.transact().unwrap();
        let pages = root.get(&txn, "pages").unwrap();
        pages.as_list().unwrap().get(&txn, 0).unwrap()
    };
    {
        let page = page.as_map().unwrap();
        let mut txn = doc.transact_mut_with(Origin::Remote("peer".into())).unwrap();
        page.insert(&mut txn, "title", "published").unwrap();
        page.insert(&mut txn, "author", "someone").unwrap();
    }

    assert_eq!(
        as_json(&title),
        vec![json!("draft"), json!("published")]
    );
    assert_eq!(any_page.count(), 2);
}

#[test]
fn test_watchers_on_one_document_do_not_interfere() {
    let (_doc, root) = setup_root();
    let a = record(&watch_path(root.clone(), &parse_path("a").unwrap()));
    let b = record(&watch_path(root.clone(), &parse_path("b").unwrap()));
    let mut tree = record(&watch_path_pattern(
        root_container(&root),
        &parse_path("a").unwrap(),
    ));

    set(&root, "a", 1);
    tree.unsubscribe();
    set(&root, "b", 2);
    set(&root, "a", 3);

    assert_eq!(as_json(&a), vec![json!(null), json!(1), json!(3)]);
    assert_eq!(as_json(&b), vec![json!(null), json!(2)]);
    assert_eq!(tree.count(), 2);
}
