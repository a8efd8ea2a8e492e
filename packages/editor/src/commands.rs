//! High-level editing commands.
//!
//! The free functions are the core behavior each [`Schema`] hook falls back
//! to. The [`Editor`] methods of the same names dispatch through the active
//! schema, so overrides see every command issued through the editor.
//!
//! [`Schema`]: crate::schema::Schema

use crate::editor::Editor;
use crate::errors::EditorResult;
use crate::location::{NodeMatch, Unit};
use crate::transforms::node::{self, NodeOptions};
use crate::transforms::text::{self, TextOptions};
use quire_model::{path, Node, Properties, Text};
use serde_json::Value;
use tracing::debug;

/// Texts whose parent is not a void element.
fn markable() -> NodeMatch {
    NodeMatch::custom(|editor, node, at| {
        node.is_text()
            && path::parent(at)
                .ok()
                .and_then(|parent| editor.document().get_if(&parent))
                .and_then(|parent| parent.as_element())
                .map_or(true, |parent| !editor.is_void(parent))
    })
}

/// Type `text` at the selection, carrying any pending cursor marks.
pub fn insert_text(editor: &mut Editor, text: &str) -> EditorResult<()> {
    if editor.selection().is_none() {
        return Ok(());
    }
    editor.without_normalizing(|editor| {
        match editor.cursor_marks().cloned() {
            Some(marks) => {
                let mut leaf = Text::new(text);
                leaf.marks = marks;
                node::insert_nodes(editor, vec![Node::Text(leaf)], NodeOptions::default())?;
            }
            None => text::insert_text(editor, text, TextOptions::default())?,
        }
        editor.set_cursor_marks(None);
        Ok(())
    })
}

pub fn insert_node(editor: &mut Editor, node: Node) -> EditorResult<()> {
    node::insert_nodes(editor, vec![node], NodeOptions::default())
}

/// Split the block at the selection.
pub fn insert_break(editor: &mut Editor) -> EditorResult<()> {
    node::split_nodes(editor, NodeOptions::default().always(true))
}

pub fn delete_backward(editor: &mut Editor, unit: Unit) -> EditorResult<()> {
    if !editor.selection().is_some_and(|s| s.is_collapsed()) {
        return Ok(());
    }
    text::delete(editor, TextOptions::default().unit(unit).reverse(true))
}

pub fn delete_forward(editor: &mut Editor, unit: Unit) -> EditorResult<()> {
    if !editor.selection().is_some_and(|s| s.is_collapsed()) {
        return Ok(());
    }
    text::delete(editor, TextOptions::default().unit(unit))
}

/// Delete the expanded selection.
pub fn delete_fragment(editor: &mut Editor, reverse: bool) -> EditorResult<()> {
    if !editor.selection().is_some_and(|s| s.is_expanded()) {
        return Ok(());
    }
    text::delete(editor, TextOptions::default().reverse(reverse))
}

/// Mark the selected text. With a collapsed selection the mark is held as
/// a cursor mark for the next insertion instead.
pub fn add_mark(editor: &mut Editor, key: &str, value: Value) -> EditorResult<()> {
    let Some(selection) = editor.selection() else {
        return Ok(());
    };
    if selection.is_expanded() {
        let mut props = Properties::new();
        props.insert(key.to_string(), value);
        return node::set_nodes(
            editor,
            props,
            NodeOptions::default()
                .matching(markable())
                .split(true)
                .voids(true),
        );
    }

    let mut marks = editor.marks()?.unwrap_or_default();
    marks.insert(key.to_string(), value);
    debug!(key, "holding cursor mark");
    editor.set_cursor_marks(Some(marks));
    editor.notify();
    Ok(())
}

pub fn remove_mark(editor: &mut Editor, key: &str) -> EditorResult<()> {
    let Some(selection) = editor.selection() else {
        return Ok(());
    };
    if selection.is_expanded() {
        return node::unset_nodes(
            editor,
            &[key],
            NodeOptions::default()
                .matching(markable())
                .split(true)
                .voids(true),
        );
    }

    let mut marks = editor.marks()?.unwrap_or_default();
    marks.remove(key);
    editor.set_cursor_marks(Some(marks));
    editor.notify();
    Ok(())
}

impl Editor {
    pub fn insert_text(&mut self, text: &str) -> EditorResult<()> {
        let schema = self.schema();
        schema.insert_text(self, text)
    }

    pub fn insert_node(&mut self, node: Node) -> EditorResult<()> {
        let schema = self.schema();
        schema.insert_node(self, node)
    }

    pub fn insert_break(&mut self) -> EditorResult<()> {
        let schema = self.schema();
        schema.insert_break(self)
    }

    pub fn delete_backward(&mut self, unit: Unit) -> EditorResult<()> {
        let schema = self.schema();
        schema.delete_backward(self, unit)
    }

    pub fn delete_forward(&mut self, unit: Unit) -> EditorResult<()> {
        let schema = self.schema();
        schema.delete_forward(self, unit)
    }

    pub fn delete_fragment(&mut self, reverse: bool) -> EditorResult<()> {
        let schema = self.schema();
        schema.delete_fragment(self, reverse)
    }

    pub fn add_mark(&mut self, key: &str, value: impl Into<Value>) -> EditorResult<()> {
        let schema = self.schema();
        schema.add_mark(self, key, value.into())
    }

    pub fn remove_mark(&mut self, key: &str) -> EditorResult<()> {
        let schema = self.schema();
        schema.remove_mark(self, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::selection;
    use quire_model::{Document, Point, Range};
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn editor(text: &str) -> Editor {
        Editor::new(Document::new(vec![Node::element(vec![Node::text(text)])]))
    }

    fn leaves(editor: &Editor) -> Vec<(String, bool)> {
        editor
            .document()
            .texts(Default::default())
            .map(|(t, _)| (t.text.clone(), t.mark("bold").is_some()))
            .collect()
    }

    #[test]
    fn test_typing_and_breaking() {
        let mut editor = editor("");
        selection::select(&mut editor, Point::new(vec![0, 0], 0)).unwrap();
        editor.insert_text("ab").unwrap();
        editor.insert_break().unwrap();
        editor.insert_text("c").unwrap();

        assert_eq!(editor.children().len(), 2);
        assert_eq!(editor.document().string(&[0]).unwrap(), "ab");
        assert_eq!(editor.document().string(&[1]).unwrap(), "c");
        assert_eq!(
            editor.selection(),
            Some(&Range::collapsed(Point::new(vec![1, 0], 1)))
        );
    }

    #[test]
    fn test_add_mark_on_expanded_selection_splits_text() {
        let mut editor = editor("hello");
        selection::select(
            &mut editor,
            Range::new(Point::new(vec![0, 0], 1), Point::new(vec![0, 0], 3)),
        )
        .unwrap();
        editor.add_mark("bold", true).unwrap();
        assert_eq!(
            leaves(&editor),
            vec![
                ("h".to_string(), false),
                ("el".to_string(), true),
                ("lo".to_string(), false)
            ]
        );
        assert_eq!(editor.string(editor.selection().cloned().unwrap(), false).unwrap(), "el");

        editor.remove_mark("bold").unwrap();
        assert_eq!(leaves(&editor), vec![("hello".to_string(), false)]);
    }

    #[test]
    fn test_cursor_mark_applies_to_next_insert() {
        let mut editor = editor("ab");
        selection::select(&mut editor, Point::new(vec![0, 0], 1)).unwrap();

        let changes = Rc::new(Cell::new(0));
        let seen = Rc::clone(&changes);
        editor.set_on_change(move |_| seen.set(seen.get() + 1));

        editor.add_mark("bold", true).unwrap();
        assert_eq!(changes.get(), 1);
        assert_eq!(editor.cursor_marks().and_then(|m| m.get("bold")), Some(&json!(true)));

        editor.insert_text("X").unwrap();
        assert_eq!(changes.get(), 2);
        assert!(editor.cursor_marks().is_none());
        assert_eq!(
            leaves(&editor),
            vec![
                ("a".to_string(), false),
                ("X".to_string(), true),
                ("b".to_string(), false)
            ]
        );
    }

    #[test]
    fn test_delete_commands_respect_selection_shape() {
        let mut editor = editor("abc");
        selection::select(&mut editor, Point::new(vec![0, 0], 2)).unwrap();
        editor.delete_fragment(false).unwrap();
        assert_eq!(editor.document().string(&[]).unwrap(), "abc");

        editor.delete_backward(Unit::Character).unwrap();
        assert_eq!(editor.document().string(&[]).unwrap(), "ac");
        editor.delete_forward(Unit::Character).unwrap();
        assert_eq!(editor.document().string(&[]).unwrap(), "a");

        selection::select(&mut editor, [0]).unwrap();
        editor.delete_backward(Unit::Character).unwrap();
        assert_eq!(editor.document().string(&[]).unwrap(), "a");
        editor.delete_fragment(true).unwrap();
        assert_eq!(editor.document().string(&[]).unwrap(), "");
    }
}
