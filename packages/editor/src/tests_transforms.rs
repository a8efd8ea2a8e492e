/// Node transform tests - structural edits and their normalized results
use crate::transforms::node::{
    insert_nodes, lift_nodes, merge_nodes, move_nodes, set_nodes, split_nodes, unset_nodes,
    unwrap_nodes, wrap_nodes,
};
use crate::transforms::selection;
use crate::*;
use quire_model::{Document, Element, Node, Point, Properties, Range};
use serde_json::{json, Value};

#[cfg(test)]
mod node_transform_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor(value: Value) -> Editor {
        let document: Document = serde_json::from_value(value).unwrap();
        Editor::new(document)
    }

    fn tree(editor: &Editor) -> Value {
        serde_json::to_value(editor.document()).unwrap()
    }

    fn block(text: &str) -> Value {
        json!({ "children": [{ "text": text }] })
    }

    #[test]
    fn test_insert_nodes_at_path_keeps_selection() {
        let mut editor = editor(json!({ "children": [block("a")] }));
        insert_nodes(
            &mut editor,
            vec![Node::element(vec![Node::text("b")])],
            NodeOptions::at([1]),
        )
        .unwrap();

        assert_eq!(tree(&editor), json!({ "children": [block("a"), block("b")] }));
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_insert_block_at_cursor_splits_and_selects() {
        let mut editor = editor(json!({ "children": [block("ab")] }));
        selection::select(&mut editor, Point::new(vec![0, 0], 1)).unwrap();

        insert_nodes(
            &mut editor,
            vec![Node::element(vec![Node::text("X")])],
            NodeOptions::default(),
        )
        .unwrap();

        assert_eq!(
            tree(&editor),
            json!({ "children": [block("a"), block("X"), block("b")] })
        );
        assert_eq!(
            editor.selection(),
            Some(&Range::collapsed(Point::new(vec![1, 0], 1)))
        );
    }

    #[test]
    fn test_insert_nodes_at_root_path_fails() {
        let mut editor = editor(json!({ "children": [block("a")] }));
        let result = insert_nodes(&mut editor, vec![Node::text("x")], NodeOptions::at([]));
        assert!(matches!(result, Err(EditorError::InvalidOperation(_))));
    }

    #[test]
    fn test_move_nodes_merges_text_after_normalizing() {
        let mut editor = editor(json!({ "children": [block("one"), block("two")] }));
        move_nodes(&mut editor, NodeOptions::at([1, 0]).to(vec![0, 1])).unwrap();

        assert_eq!(
            tree(&editor),
            json!({ "children": [block("onetwo"), block("")] })
        );
    }

    #[test]
    fn test_move_nodes_requires_destination() {
        let mut editor = editor(json!({ "children": [block("one")] }));
        let result = move_nodes(&mut editor, NodeOptions::at([0]));
        assert!(matches!(result, Err(EditorError::InvalidOperation(_))));
        assert_eq!(tree(&editor), json!({ "children": [block("one")] }));
    }

    #[test]
    fn test_merge_nodes_joins_siblings() {
        let mut editor = editor(json!({ "children": [block("one"), block("two")] }));
        merge_nodes(&mut editor, NodeOptions::at([1])).unwrap();
        assert_eq!(tree(&editor), json!({ "children": [block("onetwo")] }));
    }

    #[test]
    fn test_merge_into_empty_block_removes_it() {
        let mut editor = editor(json!({ "children": [
            { "type": "heading", "children": [{ "text": "" }] },
            block("two")
        ] }));
        merge_nodes(&mut editor, NodeOptions::at([1])).unwrap();
        assert_eq!(tree(&editor), json!({ "children": [block("two")] }));
    }

    #[test]
    fn test_split_nodes_at_point() {
        let mut editor = editor(json!({ "children": [
            { "type": "para", "children": [{ "text": "hello" }] }
        ] }));
        split_nodes(&mut editor, NodeOptions::at(Point::new(vec![0, 0], 2))).unwrap();

        assert_eq!(
            tree(&editor),
            json!({ "children": [
                { "type": "para", "children": [{ "text": "he" }] },
                { "type": "para", "children": [{ "text": "llo" }] }
            ] })
        );
    }

    #[test]
    fn test_split_nodes_at_edge_only_when_always() {
        let mut editor = editor(json!({ "children": [block("hello")] }));
        let end = Point::new(vec![0, 0], 5);

        split_nodes(&mut editor, NodeOptions::at(end.clone())).unwrap();
        assert_eq!(tree(&editor), json!({ "children": [block("hello")] }));

        split_nodes(&mut editor, NodeOptions::at(end).always(true)).unwrap();
        assert_eq!(
            tree(&editor),
            json!({ "children": [block("hello"), block("")] })
        );
    }

    #[test]
    fn test_set_and_unset_nodes() {
        let mut editor = editor(json!({ "children": [block("a"), block("b")] }));

        let mut props = Properties::new();
        props.insert("type".into(), json!("heading"));
        set_nodes(&mut editor, props, NodeOptions::at([1])).unwrap();
        assert_eq!(
            tree(&editor),
            json!({ "children": [
                block("a"),
                { "type": "heading", "children": [{ "text": "b" }] }
            ] })
        );

        unset_nodes(&mut editor, &["type"], NodeOptions::at([1])).unwrap();
        assert_eq!(tree(&editor), json!({ "children": [block("a"), block("b")] }));
    }

    #[test]
    fn test_set_nodes_across_selection_hits_every_block() {
        let mut editor = editor(json!({ "children": [block("a"), block("b")] }));
        selection::select(
            &mut editor,
            Range::new(Point::new(vec![0, 0], 0), Point::new(vec![1, 0], 1)),
        )
        .unwrap();

        let mut props = Properties::new();
        props.insert("align".into(), json!("center"));
        set_nodes(&mut editor, props, NodeOptions::default()).unwrap();

        assert_eq!(
            tree(&editor),
            json!({ "children": [
                { "align": "center", "children": [{ "text": "a" }] },
                { "align": "center", "children": [{ "text": "b" }] }
            ] })
        );
    }

    #[test]
    fn test_set_nodes_skips_text_and_children_keys() {
        let mut editor = editor(json!({ "children": [block("a")] }));
        let mut props = Properties::new();
        props.insert("text".into(), json!("nope"));
        props.insert("children".into(), json!([]));
        set_nodes(&mut editor, props, NodeOptions::at([0, 0])).unwrap();
        assert_eq!(tree(&editor), json!({ "children": [block("a")] }));
    }

    #[test]
    fn test_wrap_then_unwrap() {
        let original = json!({ "children": [block("a"), block("b"), block("c")] });
        let mut editor = editor(original.clone());

        let quote = Element::new(Vec::new()).with("type", "quote");
        wrap_nodes(&mut editor, quote, NodeOptions::at([1])).unwrap();
        assert_eq!(
            tree(&editor),
            json!({ "children": [
                block("a"),
                { "type": "quote", "children": [block("b")] },
                block("c")
            ] })
        );

        unwrap_nodes(&mut editor, NodeOptions::at([1])).unwrap();
        assert_eq!(tree(&editor), original);
    }

    #[test]
    fn test_lift_only_child() {
        let mut editor = editor(json!({ "children": [{ "children": [block("word")] }] }));
        lift_nodes(&mut editor, NodeOptions::at([0, 0])).unwrap();
        assert_eq!(tree(&editor), json!({ "children": [block("word")] }));
    }

    #[test]
    fn test_lift_middle_child_splits_parent() {
        let mut editor = editor(json!({ "children": [{
            "type": "list",
            "children": [block("a"), block("b"), block("c")]
        }] }));
        lift_nodes(&mut editor, NodeOptions::at([0, 1])).unwrap();

        assert_eq!(
            tree(&editor),
            json!({ "children": [
                { "type": "list", "children": [block("a")] },
                block("b"),
                { "type": "list", "children": [block("c")] }
            ] })
        );
    }

    #[test]
    fn test_lift_top_level_fails() {
        let mut editor = editor(json!({ "children": [block("a")] }));
        let result = lift_nodes(&mut editor, NodeOptions::at([0]));
        assert!(matches!(result, Err(EditorError::InvalidOperation(_))));
    }
}
