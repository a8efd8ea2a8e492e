//! Normalization passes, schema hooks and composite transform failures.

use pretty_assertions::assert_eq;
use quire_editor::transforms::node::{self, NodeOptions};
use quire_editor::{Editor, EditorError, EditorResult, Location, NodeMatch, Schema};
use quire_model::{Affinity, Document, Element, Node, Operation, Point, Range, RangeAffinity};
use serde_json::{json, Value};

fn editor(value: Value) -> Editor {
    let document: Document = serde_json::from_value(value).unwrap();
    Editor::new(document)
}

fn tree(editor: &Editor) -> Value {
    serde_json::to_value(editor.document()).unwrap()
}

#[test]
fn test_second_normalize_is_noop() {
    let mut editor = editor(json!({ "children": [
        { "children": [] },
        { "children": [{ "text": "a" }, { "text": "b" }] }
    ] }));
    editor.normalize_force().unwrap();
    assert!(editor.dirty_paths().is_empty());

    let settled = tree(&editor);
    assert_eq!(
        settled,
        json!({ "children": [
            { "children": [{ "text": "" }] },
            { "children": [{ "text": "ab" }] }
        ] })
    );

    editor.normalize().unwrap();
    editor.normalize().unwrap();
    assert_eq!(tree(&editor), settled);
}

#[test]
fn test_composite_failure_keeps_earlier_operations() {
    let mut editor = editor(json!({ "children": [
        { "type": "list", "children": [{ "type": "item", "children": [{ "text": "a" }] }] },
        { "type": "item", "children": [{ "text": "b" }] }
    ] }));
    let items = NodeMatch::custom(|_, node, _| {
        node.as_element()
            .is_some_and(|e| e.property("type") == Some(&json!("item")))
    });

    let result = node::lift_nodes(
        &mut editor,
        NodeOptions::at(Location::root()).matching(items),
    );

    assert!(matches!(result, Err(EditorError::InvalidOperation(_))));
    // The first lift already landed and is not rolled back.
    assert_eq!(
        tree(&editor),
        json!({ "children": [
            { "type": "item", "children": [{ "text": "a" }] },
            { "type": "item", "children": [{ "text": "b" }] }
        ] })
    );
    assert!(editor.is_normalizing());
    assert!(editor.can_undo());
}

#[derive(Debug)]
struct NoEmptyText;

impl Schema for NoEmptyText {
    fn normalize_node(&self, editor: &mut Editor, path: &[usize]) -> EditorResult<()> {
        if let Some(text) = editor.document().get_if(path).and_then(|n| n.as_text()) {
            if text.text.is_empty() && path.len() > 1 {
                return Err(EditorError::SchemaViolation(format!(
                    "empty text at {path:?}"
                )));
            }
        }
        quire_editor::normalize_node(editor, path)
    }
}

#[test]
fn test_schema_violation_surfaces_from_apply() {
    let document = Document::new(vec![Node::element(vec![Node::text("a")])]);
    let mut editor = Editor::builder()
        .document(document)
        .schema(NoEmptyText)
        .build();

    let result = editor.apply(Operation::RemoveText {
        path: vec![0, 0],
        offset: 0,
        text: "a".into(),
    });
    assert!(matches!(result, Err(EditorError::SchemaViolation(_))));
    // The operation itself committed before normalization ran.
    assert_eq!(editor.document().string(&[]).unwrap(), "");
    assert!(editor.is_normalizing());
}

#[derive(Debug)]
struct Titled;

impl Schema for Titled {
    fn normalize_node(&self, editor: &mut Editor, path: &[usize]) -> EditorResult<()> {
        if path.is_empty() {
            let first_is_title = editor
                .children()
                .first()
                .and_then(Node::as_element)
                .is_some_and(|e| e.property("type") == Some(&json!("title")));
            if !first_is_title {
                let title = Element::new(vec![Node::text("")]).with("type", "title");
                return node::insert_nodes(
                    editor,
                    vec![Node::Element(title)],
                    NodeOptions::at([0]),
                );
            }
        }
        quire_editor::normalize_node(editor, path)
    }
}

#[test]
fn test_custom_hook_extends_pass() {
    let document = Document::new(vec![Node::element(vec![Node::text("body")])]);
    let mut editor = Editor::builder()
        .document(document)
        .schema(Titled)
        .build();
    editor.normalize_force().unwrap();

    assert_eq!(
        tree(&editor),
        json!({ "children": [
            { "type": "title", "children": [{ "text": "" }] },
            { "children": [{ "text": "body" }] }
        ] })
    );

    node::remove_nodes(&mut editor, NodeOptions::at([0])).unwrap();
    assert_eq!(editor.children().len(), 2);
}

#[test]
fn test_refs_survive_edit_sequence() {
    let mut editor = editor(json!({ "children": [
        { "children": [{ "text": "alpha" }] },
        { "children": [{ "text": "beta" }] }
    ] }));
    let path = editor.path_ref(vec![1, 0], Some(Affinity::Forward));
    let point = editor.point_ref(Point::new(vec![1, 0], 2), Some(Affinity::Forward));
    let range = editor.range_ref(
        Range::new(Point::new(vec![1, 0], 1), Point::new(vec![1, 0], 3)),
        Some(RangeAffinity::Inward),
    );

    node::insert_nodes(
        &mut editor,
        vec![Node::element(vec![Node::text("zero")])],
        NodeOptions::at([0]),
    )
    .unwrap();
    editor
        .apply(Operation::InsertText {
            path: vec![2, 0],
            offset: 0,
            text: ">".into(),
        })
        .unwrap();
    node::merge_nodes(&mut editor, NodeOptions::at([2])).unwrap();

    // "alpha" + ">beta" now share one leaf.
    assert_eq!(editor.document().string(&[1]).unwrap(), "alpha>beta");
    assert_eq!(path.unref(&mut editor), Some(vec![1, 0]));
    assert_eq!(point.unref(&mut editor), Some(Point::new(vec![1, 0], 8)));
    assert_eq!(
        range.unref(&mut editor),
        Some(Range::new(
            Point::new(vec![1, 0], 7),
            Point::new(vec![1, 0], 9)
        ))
    );
}
