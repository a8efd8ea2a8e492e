//! # Operation reducer
//!
//! Applies one primitive [`Operation`] to a document and selection.
//!
//! ## Atomicity
//!
//! [`validate`] checks every precondition of an operation against the
//! committed state before [`commit`] touches anything, so an operation
//! either lands completely or fails with the previous state intact.
//!
//! The fields an operation carries for its own inverse (`remove_node.node`,
//! `merge_node.position`, `set_node.properties`, `remove_text.text`) must
//! match the document, otherwise undo would not restore it.
//!
//! ## Selection
//!
//! Selection points are rebased with forward affinity. When `remove_node`
//! deletes the node a selection point sits in, the point is relocated to
//! the end of the previous text leaf or the start of the next one; if no
//! text remains the selection becomes null.

use crate::errors::{EditorError, EditorResult};
use quire_model::path::{self, Affinity, Path};
use quire_model::text::{byte_index, char_len, slice_chars};
use quire_model::{
    Document, Element, Node, NodesOptions, Operation, Point, Properties, Range, SelectionPatch,
    Text,
};
use serde_json::Value;

/// Check that `op` can be applied to `document` without partial effects.
pub(crate) fn validate(
    document: &Document,
    selection: Option<&Range>,
    op: &Operation,
) -> EditorResult<()> {
    match op {
        Operation::InsertNode { path: at, .. } => {
            let (index, parent) = split_path(at)?;
            let len = child_count(document, parent)?;
            if index > len {
                return Err(EditorError::invalid(format!(
                    "cannot insert a node at {at:?}, the parent has {len} children"
                )));
            }
        }

        Operation::RemoveNode { path: at, node } => {
            if document.node(at)? != node {
                return Err(EditorError::invalid(format!(
                    "node does not match the node at {at:?}"
                )));
            }
        }

        Operation::SetNode {
            path: at,
            properties,
            new_properties,
        } => {
            let current = document.node(at)?.properties();
            if let Some((key, _)) = properties
                .iter()
                .find(|(key, value)| current.get(key.as_str()).unwrap_or(&Value::Null) != *value)
            {
                return Err(EditorError::invalid(format!(
                    "property {key:?} does not match the node at {at:?}"
                )));
            }
            for key in ["children", "text"] {
                if new_properties.contains_key(key) {
                    return Err(EditorError::invalid(format!(
                        "cannot set the \"{key}\" property of the node at {at:?}"
                    )));
                }
            }
        }

        Operation::SplitNode {
            path: at, position, ..
        } => {
            let len = size(document.node(at)?);
            if *position > len {
                return Err(EditorError::invalid(format!(
                    "cannot split the node at {at:?} at position {position}, its size is {len}"
                )));
            }
        }

        Operation::MergeNode {
            path: at, position, ..
        } => {
            let node = document.node(at)?;
            let previous = path::previous(at)?;
            let prev = document.node(&previous)?;
            if node.is_text() != prev.is_text() {
                return Err(EditorError::invalid(format!(
                    "cannot merge the node at {at:?} into a previous sibling of a different kind"
                )));
            }
            let len = size(prev);
            if *position != len {
                return Err(EditorError::invalid(format!(
                    "cannot merge the node at {at:?} at position {position}, the previous sibling has size {len}"
                )));
            }
        }

        Operation::MoveNode {
            path: from,
            new_path: to,
        } => {
            document.node(from)?;
            if path::is_ancestor(from, to) {
                return Err(EditorError::invalid(format!(
                    "cannot move a node at {from:?} into its own descendant {to:?}"
                )));
            }
            let target = path::transform(from, op, None).ok_or_else(|| EditorError::unresolved(from))?;
            let (index, parent_after) = split_path(&target)?;
            let parent_before = unshift(parent_after, from);
            let mut len = child_count(document, &parent_before)?;
            if from.len() == parent_before.len() + 1 && from.starts_with(&parent_before) {
                len -= 1;
            }
            if index > len {
                return Err(EditorError::invalid(format!(
                    "cannot move a node to {to:?}, the destination has {len} children"
                )));
            }
        }

        Operation::InsertText {
            path: at, offset, ..
        } => {
            let leaf = document.leaf(at)?;
            let len = leaf.char_len();
            if *offset > len {
                return Err(quire_model::ModelError::offset_out_of_range(at, *offset, len).into());
            }
        }

        Operation::RemoveText {
            path: at,
            offset,
            text,
        } => {
            let leaf = document.leaf(at)?;
            let len = leaf.char_len();
            let end = offset + char_len(text);
            if end > len {
                return Err(quire_model::ModelError::offset_out_of_range(at, end, len).into());
            }
            if slice_chars(&leaf.text, *offset, end) != text {
                return Err(EditorError::invalid(format!(
                    "text {text:?} does not match the content at {at:?} offset {offset}"
                )));
            }
        }

        Operation::SetSelection { new_properties, .. } => {
            if let Some(patch) = new_properties {
                if selection.is_none() && (patch.anchor.is_none() || patch.focus.is_none()) {
                    return Err(EditorError::invalid(
                        "cannot apply an incomplete set_selection when there is no current selection",
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Apply a validated `op`.
pub(crate) fn commit(
    document: &mut Document,
    selection: &mut Option<Range>,
    op: &Operation,
) -> EditorResult<()> {
    match op {
        Operation::InsertNode { path: at, node } => {
            let (index, parent) = split_path(at)?;
            document.children_mut(parent)?.insert(index, node.clone());
            transform_selection(selection, op);
        }

        Operation::RemoveNode { path: at, .. } => {
            let (index, parent) = split_path(at)?;
            document.children_mut(parent)?.remove(index);
            relocate_selection(document, selection, op, at);
        }

        Operation::SetNode {
            path: at,
            properties,
            new_properties,
        } => {
            let target = document.node_mut(at)?.properties_mut();
            set_properties(target, properties, new_properties);
        }

        Operation::SplitNode {
            path: at,
            position,
            properties,
        } => {
            let (index, parent) = split_path(at)?;
            let node = document.node_mut(at)?;
            let sibling = match node {
                Node::Text(text) => {
                    let at_byte = byte_index(&text.text, *position);
                    let after = text.text.split_off(at_byte);
                    let mut sibling = Text::new(after);
                    sibling.marks = properties.clone();
                    Node::Text(sibling)
                }
                Node::Element(element) => {
                    let after = element.children.split_off(*position);
                    let mut sibling = Element::new(after);
                    sibling.properties = properties.clone();
                    Node::Element(sibling)
                }
            };
            document.children_mut(parent)?.insert(index + 1, sibling);
            transform_selection(selection, op);
        }

        Operation::MergeNode { path: at, .. } => {
            let (index, parent) = split_path(at)?;
            let node = document.children_mut(parent)?.remove(index);
            let prev = document.node_mut(&path::previous(at)?)?;
            match (prev, node) {
                (Node::Text(prev), Node::Text(node)) => prev.text.push_str(&node.text),
                (Node::Element(prev), Node::Element(node)) => prev.children.extend(node.children),
                _ => {
                    return Err(EditorError::invalid(format!(
                        "cannot merge nodes of different kinds at {at:?}"
                    )))
                }
            }
            transform_selection(selection, op);
        }

        Operation::MoveNode { path: from, .. } => {
            let target = path::transform(from, op, None).ok_or_else(|| EditorError::unresolved(from))?;
            let (index, parent) = split_path(from)?;
            let node = document.children_mut(parent)?.remove(index);
            let (new_index, new_parent) = split_path(&target)?;
            document.children_mut(new_parent)?.insert(new_index, node);
            transform_selection(selection, op);
        }

        Operation::InsertText {
            path: at,
            offset,
            text,
        } => {
            let leaf = document.text_mut(at)?;
            let at_byte = byte_index(&leaf.text, *offset);
            leaf.text.insert_str(at_byte, text);
            transform_selection(selection, op);
        }

        Operation::RemoveText {
            path: at,
            offset,
            text,
        } => {
            let leaf = document.text_mut(at)?;
            let from = byte_index(&leaf.text, *offset);
            let to = byte_index(&leaf.text, offset + char_len(text));
            leaf.text.replace_range(from..to, "");
            transform_selection(selection, op);
        }

        Operation::SetSelection { new_properties, .. } => {
            *selection = patch_selection(selection.take(), new_properties.as_ref())?;
        }
    }

    Ok(())
}

fn split_path(at: &[usize]) -> EditorResult<(usize, &[usize])> {
    at.split_last()
        .map(|(index, parent)| (*index, parent))
        .ok_or_else(|| EditorError::invalid("operation cannot target the root path"))
}

fn child_count(document: &Document, parent: &[usize]) -> EditorResult<usize> {
    Ok(document.ancestor(parent)?.children().map_or(0, <[Node]>::len))
}

/// Text length for leaves, child count for elements.
fn size(node: &Node) -> usize {
    match node {
        Node::Text(text) => text.char_len(),
        Node::Element(element) => element.children.len(),
    }
}

/// Map a path taken after `removed` left the tree back to before it left.
fn unshift(after: &[usize], removed: &[usize]) -> Path {
    let mut before = after.to_vec();
    if let Some((&index, parent)) = removed.split_last() {
        let depth = parent.len();
        if before.len() > depth && before[..depth] == *parent && before[depth] >= index {
            before[depth] += 1;
        }
    }
    before
}

fn set_properties(target: &mut Properties, properties: &Properties, new_properties: &Properties) {
    for (key, value) in new_properties {
        if value.is_null() {
            target.remove(key);
        } else {
            target.insert(key.clone(), value.clone());
        }
    }
    for key in properties.keys() {
        if !new_properties.contains_key(key) {
            target.remove(key);
        }
    }
}

fn patch_selection(
    selection: Option<Range>,
    patch: Option<&SelectionPatch>,
) -> EditorResult<Option<Range>> {
    let Some(patch) = patch else {
        return Ok(None);
    };
    let mut range = match (selection, &patch.anchor, &patch.focus) {
        (Some(range), _, _) => range,
        (None, Some(anchor), Some(focus)) => Range::new(anchor.clone(), focus.clone()),
        (None, _, _) => {
            return Err(EditorError::invalid(
                "cannot apply an incomplete set_selection when there is no current selection",
            ))
        }
    };
    if let Some(anchor) = &patch.anchor {
        range.anchor = anchor.clone();
    }
    if let Some(focus) = &patch.focus {
        range.focus = focus.clone();
    }
    Ok(Some(range))
}

fn transform_selection(selection: &mut Option<Range>, op: &Operation) {
    if let Some(range) = selection.as_ref() {
        let anchor = range.anchor.transform(op, Some(Affinity::Forward));
        let focus = range.focus.transform(op, Some(Affinity::Forward));
        *selection = match (anchor, focus) {
            (Some(anchor), Some(focus)) => Some(Range::new(anchor, focus)),
            _ => None,
        };
    }
}

/// Rebase the selection across a `remove_node`, moving points that were
/// inside the removed subtree to the nearest surviving text.
fn relocate_selection(
    document: &Document,
    selection: &mut Option<Range>,
    op: &Operation,
    removed: &[usize],
) {
    let Some(range) = selection.as_ref() else {
        return;
    };

    let mut points = [range.anchor.clone(), range.focus.clone()];
    for point in points.iter_mut() {
        if let Some(moved) = point.transform(op, Some(Affinity::Forward)) {
            *point = moved;
            continue;
        }
        match nearest_text(document, removed) {
            Some(nearest) => *point = nearest,
            None => {
                *selection = None;
                return;
            }
        }
    }

    let [anchor, focus] = points;
    *selection = Some(Range::new(anchor, focus));
}

fn nearest_text(document: &Document, removed: &[usize]) -> Option<Point> {
    let mut prev: Option<(&Text, Path)> = None;
    let mut next: Option<(&Text, Path)> = None;
    for (text, p) in document.texts(NodesOptions::default()) {
        if path::compare(&p, removed) == std::cmp::Ordering::Less {
            prev = Some((text, p));
        } else {
            next = Some((text, p));
            break;
        }
    }

    let prefer_next = match (&prev, &next) {
        (Some((_, prev_path)), Some((_, next_path))) => {
            if next_path.as_slice() == removed {
                !path::has_previous(next_path)
            } else {
                path::common(prev_path, removed).len() < path::common(next_path, removed).len()
            }
        }
        _ => false,
    };

    match (prev, next) {
        (Some((text, p)), _) if !prefer_next => Some(Point::new(p, text.char_len())),
        (_, Some((_, p))) => Some(Point::new(p, 0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Document {
        serde_json::from_value(json!({
            "children": [
                { "type": "p", "children": [{ "text": "one" }, { "text": "two", "bold": true }] },
                { "type": "p", "children": [{ "text": "three" }] }
            ]
        }))
        .unwrap()
    }

    fn cursor(path: &[usize], offset: usize) -> Option<Range> {
        Some(Range::collapsed(Point::new(path.to_vec(), offset)))
    }

    fn run(document: &mut Document, selection: &mut Option<Range>, op: &Operation) -> EditorResult<()> {
        validate(document, selection.as_ref(), op)?;
        commit(document, selection, op)
    }

    #[test]
    fn test_split_and_merge_text() {
        let mut document = doc();
        let mut selection = cursor(&[0, 0], 2);
        let split = Operation::SplitNode {
            path: vec![0, 0],
            position: 1,
            properties: Properties::new(),
        };
        run(&mut document, &mut selection, &split).unwrap();
        assert_eq!(document.leaf(&[0, 0]).unwrap().text, "o");
        assert_eq!(document.leaf(&[0, 1]).unwrap().text, "ne");
        assert_eq!(selection, cursor(&[0, 1], 1));

        run(&mut document, &mut selection, &split.inverse()).unwrap();
        assert_eq!(document, doc());
        assert_eq!(selection, cursor(&[0, 0], 2));
    }

    #[test]
    fn test_set_node_null_removes_key() {
        let mut document = doc();
        let mut selection = None;
        let mut props = Properties::new();
        props.insert("bold".into(), json!(true));
        let mut new_props = Properties::new();
        new_props.insert("italic".into(), json!(true));
        let op = Operation::SetNode {
            path: vec![0, 1],
            properties: props,
            new_properties: new_props,
        };
        run(&mut document, &mut selection, &op).unwrap();
        let leaf = document.leaf(&[0, 1]).unwrap();
        assert_eq!(leaf.mark("bold"), None);
        assert_eq!(leaf.mark("italic"), Some(&json!(true)));
    }

    #[test]
    fn test_set_node_rejects_text_key() {
        let document = doc();
        let mut new_props = Properties::new();
        new_props.insert("text".into(), json!("x"));
        let op = Operation::SetNode {
            path: vec![0, 0],
            properties: Properties::new(),
            new_properties: new_props,
        };
        assert!(validate(&document, None, &op).is_err());
    }

    #[test]
    fn test_remove_relocates_selection_to_previous_text() {
        let mut document = doc();
        let mut selection = cursor(&[1, 0], 3);
        let node = document.node(&[1]).unwrap().clone();
        run(
            &mut document,
            &mut selection,
            &Operation::RemoveNode { path: vec![1], node },
        )
        .unwrap();
        assert_eq!(selection, cursor(&[0, 1], 3));
    }

    #[test]
    fn test_remove_last_text_nulls_selection() {
        let mut document = Document::new(vec![Node::element(vec![Node::text("x")])]);
        let mut selection = cursor(&[0, 0], 0);
        let node = document.node(&[0]).unwrap().clone();
        run(
            &mut document,
            &mut selection,
            &Operation::RemoveNode { path: vec![0], node },
        )
        .unwrap();
        assert_eq!(selection, None);
    }

    #[test]
    fn test_move_validation() {
        let document = doc();
        let into_self = Operation::MoveNode {
            path: vec![0],
            new_path: vec![0, 1],
        };
        assert!(validate(&document, None, &into_self).is_err());

        let too_far = Operation::MoveNode {
            path: vec![0, 0],
            new_path: vec![0, 2],
        };
        assert!(validate(&document, None, &too_far).is_err());

        let to_end = Operation::MoveNode {
            path: vec![0, 0],
            new_path: vec![0, 1],
        };
        assert!(validate(&document, None, &to_end).is_ok());

        let across = Operation::MoveNode {
            path: vec![0, 0],
            new_path: vec![1, 1],
        };
        assert!(validate(&document, None, &across).is_ok());
    }

    #[test]
    fn test_failed_operation_leaves_state() {
        let document = doc();
        let op = Operation::RemoveText {
            path: vec![0, 0],
            offset: 1,
            text: "zz".into(),
        };
        assert!(validate(&document, None, &op).is_err());

        let partial = Operation::SetSelection {
            properties: None,
            new_properties: Some(SelectionPatch {
                anchor: Some(Point::new(vec![0, 0], 0)),
                focus: None,
            }),
        };
        assert!(validate(&document, None, &partial).is_err());
    }
}
