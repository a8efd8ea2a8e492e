//! Every primitive operation followed by its inverse restores the document
//! and the selection exactly.

use pretty_assertions::assert_eq;
use quire_editor::{Editor, EditorConfig, EditorError, HistoryConfig, NormalizeConfig};
use quire_model::{Document, Node, Operation, Point, Properties, Range, SelectionPatch};
use serde_json::json;

fn raw_editor() -> Editor {
    let document: Document = serde_json::from_value(json!({ "children": [
        { "type": "p", "children": [{ "text": "one" }, { "text": "!", "italic": true }] },
        { "children": [{ "text": "two", "bold": true }] }
    ] }))
    .unwrap();
    let config = EditorConfig {
        history: HistoryConfig {
            enabled: false,
            ..HistoryConfig::default()
        },
        normalize: NormalizeConfig {
            enabled: false,
            ..NormalizeConfig::default()
        },
    };
    Editor::builder()
        .document(document)
        .selection(Range::new(
            Point::new(vec![0, 0], 1),
            Point::new(vec![0, 0], 2),
        ))
        .config(config)
        .build()
}

fn props(value: serde_json::Value) -> Properties {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Properties::new(),
    }
}

fn every_kind(editor: &Editor) -> Vec<Operation> {
    let second = editor.document().node(&[1]).unwrap().clone();
    vec![
        Operation::InsertNode {
            path: vec![1],
            node: Node::element(vec![Node::text("inserted")]),
        },
        Operation::RemoveNode {
            path: vec![1],
            node: second,
        },
        Operation::SetNode {
            path: vec![0],
            properties: props(json!({ "type": "p" })),
            new_properties: props(json!({ "type": "h1", "level": 1 })),
        },
        Operation::SplitNode {
            path: vec![0, 0],
            position: 1,
            properties: Properties::new(),
        },
        Operation::SplitNode {
            path: vec![0],
            position: 1,
            properties: props(json!({ "type": "p" })),
        },
        Operation::MergeNode {
            path: vec![1],
            position: 2,
            properties: Properties::new(),
        },
        Operation::MergeNode {
            path: vec![0, 1],
            position: 3,
            properties: props(json!({ "italic": true })),
        },
        Operation::MoveNode {
            path: vec![0, 0],
            new_path: vec![1, 0],
        },
        Operation::InsertText {
            path: vec![0, 0],
            offset: 1,
            text: "xx".into(),
        },
        Operation::RemoveText {
            path: vec![1, 0],
            offset: 0,
            text: "tw".into(),
        },
        Operation::SetSelection {
            properties: Some(SelectionPatch {
                anchor: Some(Point::new(vec![0, 0], 1)),
                focus: None,
            }),
            new_properties: Some(SelectionPatch {
                anchor: Some(Point::new(vec![1, 0], 3)),
                focus: None,
            }),
        },
    ]
}

#[test]
fn test_inverse_restores_document_and_selection() {
    let template = raw_editor();
    for op in every_kind(&template) {
        let mut editor = raw_editor();
        let document = editor.document().clone();
        let selection = editor.selection().cloned();

        editor.apply(op.clone()).unwrap();
        assert!(
            editor.document() != &document || editor.selection() != selection.as_ref(),
            "{} changed nothing",
            op.kind()
        );

        editor.apply(op.inverse()).unwrap();
        assert_eq!(editor.document(), &document, "{} document", op.kind());
        assert_eq!(editor.selection(), selection.as_ref(), "{} selection", op.kind());
    }
}

#[test]
fn test_double_inverse_is_identity() {
    let template = raw_editor();
    for op in every_kind(&template) {
        assert_eq!(op.inverse().inverse(), op);
    }
}

#[test]
fn test_null_selection_round_trip() -> anyhow::Result<()> {
    let mut editor = raw_editor();
    let selection = editor
        .selection()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("fixture has a selection"))?;
    let clear = Operation::SetSelection {
        properties: Some(selection.clone().into()),
        new_properties: None,
    };
    editor.apply(clear.clone())?;
    assert_eq!(editor.selection(), None);
    editor.apply(clear.inverse())?;
    assert_eq!(editor.selection(), Some(&selection));
    Ok(())
}

#[test]
fn test_failed_operation_leaves_state_untouched() {
    let mut editor = raw_editor();
    let document = editor.document().clone();
    let selection = editor.selection().cloned();

    let mismatched = editor.apply(Operation::RemoveText {
        path: vec![0, 0],
        offset: 0,
        text: "two".into(),
    });
    assert!(matches!(mismatched, Err(EditorError::InvalidOperation(_))));

    let missing = editor.apply(Operation::RemoveNode {
        path: vec![7],
        node: Node::text(""),
    });
    assert!(missing.is_err());

    assert_eq!(editor.document(), &document);
    assert_eq!(editor.selection(), selection.as_ref());
    assert!(editor.operations().is_empty());
}

fn assert_rejected(editor: &mut Editor, op: Operation) {
    let document = editor.document().clone();
    let selection = editor.selection().cloned();
    let result = editor.apply(op.clone());
    assert!(
        matches!(result, Err(EditorError::InvalidOperation(_))),
        "{} was accepted",
        op.kind()
    );
    assert_eq!(editor.document(), &document);
    assert_eq!(editor.selection(), selection.as_ref());
}

#[test]
fn test_remove_node_must_carry_the_removed_node() {
    let mut editor = raw_editor();
    assert_rejected(
        &mut editor,
        Operation::RemoveNode {
            path: vec![1],
            node: Node::element(vec![Node::text("bogus")]),
        },
    );

    // Keys are not part of the comparison.
    let copy = editor.document().node(&[1]).unwrap().clone();
    editor
        .apply(Operation::RemoveNode {
            path: vec![1],
            node: serde_json::from_value(serde_json::to_value(&copy).unwrap()).unwrap(),
        })
        .unwrap();
    assert_eq!(editor.children().len(), 1);
}

#[test]
fn test_merge_node_position_must_match_previous_size() {
    let mut editor = raw_editor();
    assert_rejected(
        &mut editor,
        Operation::MergeNode {
            path: vec![0, 1],
            position: 1,
            properties: Properties::new(),
        },
    );
    assert_rejected(
        &mut editor,
        Operation::MergeNode {
            path: vec![1],
            position: 0,
            properties: Properties::new(),
        },
    );
}

#[test]
fn test_set_node_properties_must_match_current_values() {
    let mut editor = raw_editor();
    assert_rejected(
        &mut editor,
        Operation::SetNode {
            path: vec![0],
            properties: props(json!({ "type": "h1" })),
            new_properties: props(json!({ "type": "h2" })),
        },
    );
    assert_rejected(
        &mut editor,
        Operation::SetNode {
            path: vec![1, 0],
            properties: props(json!({ "bold": false })),
            new_properties: props(json!({ "bold": true })),
        },
    );

    // A missing key matches null.
    let op = Operation::SetNode {
        path: vec![1],
        properties: props(json!({ "align": null })),
        new_properties: props(json!({ "align": "left" })),
    };
    editor.apply(op.clone()).unwrap();
    editor.apply(op.inverse()).unwrap();
    assert_eq!(editor.document(), raw_editor().document());
}

#[test]
fn test_partial_selection_without_selection_fails() {
    let mut editor = raw_editor();
    editor
        .apply(Operation::SetSelection {
            properties: editor.selection().cloned().map(Into::into),
            new_properties: None,
        })
        .unwrap();

    let result = editor.apply(Operation::SetSelection {
        properties: None,
        new_properties: Some(SelectionPatch {
            anchor: Some(Point::new(vec![0, 0], 0)),
            focus: None,
        }),
    });
    assert!(matches!(result, Err(EditorError::InvalidOperation(_))));
    assert_eq!(editor.selection(), None);
}
