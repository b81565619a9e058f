use std::{cell::RefCell, rc::Rc};

use serde_json::json;
use treewatch::{
    crdt::{Attributes, Doc, Origin, TextRef},
    inline::{InlineEditor, InlineRange, Line, LineRenderer, RenderError, RenderState},
};

/// Renders into a shared buffer so tests can inspect it while mounted.
#[derive(Clone, Default)]
struct Screen {
    lines: Rc<RefCell<Vec<String>>>,
    rebuilds: Rc<RefCell<usize>>,
    fail_once: Rc<RefCell<bool>>,
}

impl Screen {
    fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl LineRenderer for Screen {
    fn update_line(&mut self, key: usize, line: &Line) -> Result<(), RenderError> {
        if std::mem::take(&mut *self.fail_once.borrow_mut()) {
            return Err(RenderError::host("composition raced the update"));
        }
        let mut lines = self.lines.borrow_mut();
        if lines.len() <= key {
            lines.resize(key + 1, String::new());
        }
        lines[key] = line.text();
        Ok(())
    }

    fn truncate(&mut self, len: usize) -> Result<(), RenderError> {
        self.lines.borrow_mut().truncate(len);
        Ok(())
    }

    fn clear(&mut self) {
        self.lines.borrow_mut().clear();
        *self.rebuilds.borrow_mut() += 1;
    }
}

fn setup(content: &str) -> (Doc, TextRef, Screen, InlineEditor<Screen>) {
    let doc = Doc::new();
    let text = doc.get_or_insert_text("body").unwrap();
    text.insert(&mut doc.transact_mut().unwrap(), 0, content).unwrap();
    let screen = Screen::default();
    let editor = InlineEditor::mount(text.clone(), screen.clone()).unwrap();
    (doc, text, screen, editor)
}

#[tokio::test]
async fn test_render_follows_mutations() {
    let (doc, text, screen, editor) = setup("first\nsecond");
    assert_eq!(screen.lines(), vec!["first", "second"]);

    {
        let mut txn = doc.transact_mut().unwrap();
        let end = text.len(&txn);
        text.insert(&mut txn, end, "\nthird").unwrap();
    }
    editor.update_complete().await;
    assert_eq!(screen.lines(), vec!["first", "second", "third"]);

    text.delete(&mut doc.transact_mut().unwrap(), 5, 7).unwrap();
    editor.update_complete().await;
    assert_eq!(screen.lines(), vec!["first", "third"]);
    assert_eq!(editor.render_state(), RenderState::Idle);
}

#[tokio::test]
async fn test_remote_insert_keeps_selection() {
    let (doc, text, _screen, editor) = setup("hello world");
    editor.set_range(Some(InlineRange::new(6, 5))).unwrap();

    {
        let mut txn = doc.transact_mut_with(Origin::Remote("peer".into())).unwrap();
        text.insert(&mut txn, 0, "¡").unwrap();
        text.insert(&mut txn, 1, "Oh, ").unwrap();
    }
    editor.update_complete().await;

    assert_eq!(editor.range(), Some(InlineRange::new(11, 5)));
}

#[tokio::test]
async fn test_selection_at_start_survives() {
    let (doc, text, _screen, editor) = setup("abc");
    editor.set_range(Some(InlineRange::caret(0))).unwrap();
    text.insert(&mut doc.transact_mut().unwrap(), 3, "def").unwrap();
    editor.update_complete().await;
    assert_eq!(editor.range(), Some(InlineRange::caret(0)));
}

#[test]
fn test_render_error_triggers_rebuild() {
    let (doc, text, screen, _editor) = setup("one\ntwo");
    *screen.fail_once.borrow_mut() = true;

    text.insert(&mut doc.transact_mut().unwrap(), 3, "!").unwrap();

    assert_eq!(screen.lines(), vec!["one!", "two"]);
    assert_eq!(*screen.rebuilds.borrow(), 1);
}

#[test]
fn test_formatting_rerenders_line() {
    let (doc, text, screen, editor) = setup("plain\nbold");
    let bold = Attributes::from([("bold".to_string(), json!(true))]);
    text.format(&mut doc.transact_mut().unwrap(), 6, 4, bold).unwrap();

    assert_eq!(screen.lines(), vec!["plain", "bold"]);
    editor.rerender().unwrap();
    assert_eq!(*screen.rebuilds.borrow(), 0);
}

#[test]
fn test_unmount_detaches() {
    let (doc, text, screen, editor) = setup("a");
    editor.unmount();
    text.insert(&mut doc.transact_mut().unwrap(), 1, "b").unwrap();
    assert_eq!(screen.lines(), vec!["a"]);

    editor.rerender().unwrap();
    assert_eq!(screen.lines(), vec!["ab"]);
}

#[test]
fn test_replacing_a_selection_moves_the_caret() {
    let (_doc, text, screen, editor) = setup("hello world");
    editor
        .insert_text(InlineRange::new(6, 5), "🦀 crab")
        .unwrap();

    assert_eq!(text.snapshot().unwrap(), "hello 🦀 crab");
    assert_eq!(screen.lines(), vec!["hello 🦀 crab"]);
    assert_eq!(editor.range(), Some(InlineRange::caret(13)));
}
