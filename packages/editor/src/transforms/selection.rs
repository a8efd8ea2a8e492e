//! Selection transforms. Each one reduces to at most one `set_selection`
//! operation.

use crate::editor::Editor;
use crate::errors::EditorResult;
use crate::location::{Location, SelectionEdge, StepOptions, Unit};
use quire_model::{Operation, Point, SelectionPatch};

/// Options for [`move_selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOptions {
    pub distance: usize,
    pub unit: Unit,
    pub reverse: bool,
    /// Move only this edge; both edges move when absent.
    pub edge: Option<SelectionEdge>,
}

impl Default for MoveOptions {
    fn default() -> Self {
        Self {
            distance: 1,
            unit: Unit::Character,
            reverse: false,
            edge: None,
        }
    }
}

/// Select `target`, creating a selection if there is none.
pub fn select(editor: &mut Editor, target: impl Into<Location>) -> EditorResult<()> {
    let range = editor.range(target, None)?;
    if editor.selection().is_some() {
        return set_selection(editor, range.into());
    }
    editor.apply(Operation::SetSelection {
        properties: None,
        new_properties: Some(range.into()),
    })
}

pub fn deselect(editor: &mut Editor) -> EditorResult<()> {
    let Some(selection) = editor.selection().cloned() else {
        return Ok(());
    };
    editor.apply(Operation::SetSelection {
        properties: Some(selection.into()),
        new_properties: None,
    })
}

/// Patch the existing selection. Only edges that actually change end up
/// in the operation; nothing happens without a selection.
pub fn set_selection(editor: &mut Editor, patch: SelectionPatch) -> EditorResult<()> {
    let Some(selection) = editor.selection().cloned() else {
        return Ok(());
    };
    let mut old = SelectionPatch::default();
    let mut new = SelectionPatch::default();

    if let Some(anchor) = patch.anchor {
        if anchor != selection.anchor {
            old.anchor = Some(selection.anchor.clone());
            new.anchor = Some(anchor);
        }
    }
    if let Some(focus) = patch.focus {
        if focus != selection.focus {
            old.focus = Some(selection.focus.clone());
            new.focus = Some(focus);
        }
    }

    if new.is_empty() {
        return Ok(());
    }
    editor.apply(Operation::SetSelection {
        properties: Some(old),
        new_properties: Some(new),
    })
}

/// Resolve `start`/`end` to the anchor or focus of `selection`.
fn side(editor: &Editor, edge: SelectionEdge) -> SelectionEdge {
    let backward = editor.selection().is_some_and(|s| s.is_backward());
    match (edge, backward) {
        (SelectionEdge::Start, false) | (SelectionEdge::End, true) => SelectionEdge::Anchor,
        (SelectionEdge::Start, true) | (SelectionEdge::End, false) => SelectionEdge::Focus,
        (edge, _) => edge,
    }
}

/// Move one edge of the selection to `point`.
pub fn set_point(editor: &mut Editor, point: Point, edge: SelectionEdge) -> EditorResult<()> {
    editor.require_selection()?;
    let patch = match side(editor, edge) {
        SelectionEdge::Anchor => SelectionPatch {
            anchor: Some(point),
            focus: None,
        },
        _ => SelectionPatch {
            anchor: None,
            focus: Some(point),
        },
    };
    set_selection(editor, patch)
}

/// Collapse the selection onto one of its edges.
pub fn collapse(editor: &mut Editor, edge: SelectionEdge) -> EditorResult<()> {
    let Some(selection) = editor.selection().cloned() else {
        return Ok(());
    };
    let point = match side(editor, edge) {
        SelectionEdge::Anchor => selection.anchor,
        _ => selection.focus,
    };
    select(editor, point)
}

/// Step the selection edges by `options.unit`. Edges with nowhere to go
/// stay put.
pub fn move_selection(editor: &mut Editor, options: MoveOptions) -> EditorResult<()> {
    let Some(selection) = editor.selection().cloned() else {
        return Ok(());
    };
    let edge = options.edge.map(|edge| side(editor, edge));
    let step = StepOptions::unit(options.unit).distance(options.distance);
    let shift = |editor: &Editor, point: Point| -> EditorResult<Option<Point>> {
        if options.reverse {
            editor.before(point, step)
        } else {
            editor.after(point, step)
        }
    };

    let mut patch = SelectionPatch::default();
    if matches!(edge, None | Some(SelectionEdge::Anchor)) {
        patch.anchor = shift(editor, selection.anchor.clone())?;
    }
    if matches!(edge, None | Some(SelectionEdge::Focus)) {
        patch.focus = shift(editor, selection.focus.clone())?;
    }
    set_selection(editor, patch)
}
