//! Text transforms: deleting content and inserting strings.

use crate::editor::Editor;
use crate::errors::{EditorError, EditorResult};
use crate::location::{Location, Mode, NodeMatch, NodeQuery, StepOptions, Unit};
use crate::transforms::node::{self, NodeOptions};
use crate::transforms::selection;
use quire_model::path;
use quire_model::text::slice_chars;
use quire_model::{Affinity, Operation, Path, Point, Range};
use std::cmp::Ordering;
use tracing::instrument;

const FORWARD: Option<Affinity> = Some(Affinity::Forward);

#[derive(Debug, Clone, PartialEq)]
pub struct TextOptions {
    pub at: Option<Location>,
    pub distance: usize,
    pub unit: Unit,
    pub reverse: bool,
    pub hanging: bool,
    pub voids: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            at: None,
            distance: 1,
            unit: Unit::Character,
            reverse: false,
            hanging: false,
            voids: false,
        }
    }
}

impl TextOptions {
    pub fn at(at: impl Into<Location>) -> Self {
        Self {
            at: Some(at.into()),
            ..Self::default()
        }
    }

    pub fn distance(mut self, distance: usize) -> Self {
        self.distance = distance;
        self
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn hanging(mut self, hanging: bool) -> Self {
        self.hanging = hanging;
        self
    }

    pub fn voids(mut self, voids: bool) -> Self {
        self.voids = voids;
        self
    }
}

fn block_above(editor: &Editor, point: &Point, voids: bool) -> EditorResult<Option<Path>> {
    Ok(editor
        .above(
            &NodeQuery::new()
                .at(point.clone())
                .matching(NodeMatch::Block)
                .voids(voids),
        )?
        .map(|(_, p)| p))
}

fn highest_void(editor: &Editor, point: &Point) -> EditorResult<Option<Path>> {
    Ok(editor
        .void_above(&NodeQuery::new().at(point.clone()).mode(Mode::Highest))?
        .map(|(_, p)| p))
}

/// Delete content. A collapsed target is first widened by `distance`
/// units in the direction of `reverse`; a point inside a void removes the
/// whole void. Blocks the range spans are merged together afterwards.
#[instrument(skip_all, fields(unit = ?options.unit, reverse = options.reverse))]
pub fn delete(editor: &mut Editor, options: TextOptions) -> EditorResult<()> {
    editor.without_normalizing(|editor| {
        let voids = options.voids;
        let mut hanging = options.hanging;
        let Some(mut at) = editor.resolve_at(options.at.as_ref()) else {
            return Ok(());
        };

        if let Location::Range(range) = &at {
            if range.is_collapsed() {
                at = Location::Point(range.anchor.clone());
            }
        }

        if let Location::Point(point) = &at {
            let furthest_void = highest_void(editor, point)?;
            at = match furthest_void {
                Some(void_path) if !voids => Location::Path(void_path),
                _ => {
                    let step = StepOptions::unit(options.unit).distance(options.distance);
                    let target = if options.reverse {
                        match editor.before(point.clone(), step)? {
                            Some(target) => target,
                            None => editor.start(Location::root())?,
                        }
                    } else {
                        match editor.after(point.clone(), step)? {
                            Some(target) => target,
                            None => editor.end(Location::root())?,
                        }
                    };
                    hanging = true;
                    Location::Range(Range::new(point.clone(), target))
                }
            };
        }

        let range = match at {
            Location::Path(p) => {
                return node::remove_nodes(editor, NodeOptions::at(p).voids(voids));
            }
            Location::Range(range) if range.is_collapsed() => return Ok(()),
            Location::Range(range) => range,
            Location::Point(_) => return Ok(()),
        };

        let range = if !hanging && range.end() != editor.end(Location::root())? {
            editor.unhang_range(&range, voids)?
        } else {
            range
        };

        let (mut start, mut end) = range.edges();
        let start_block = block_above(editor, &start, voids)?;
        let end_block = block_above(editor, &end, voids)?;
        let across_blocks = matches!((&start_block, &end_block), (Some(s), Some(e)) if s != e);
        let single_text = start.path == end.path;
        let start_void = if voids { None } else { highest_void(editor, &start)? };
        let end_void = if voids { None } else { highest_void(editor, &end)? };

        // Nudge edges that sit inside inline voids out of them.
        if start_void.is_some() {
            if let Some(before) = editor.before(start.clone(), StepOptions::default())? {
                if start_block.as_ref().is_some_and(|b| path::is_ancestor(b, &before.path)) {
                    start = before;
                }
            }
        }
        if end_void.is_some() {
            if let Some(after) = editor.after(end.clone(), StepOptions::default())? {
                if end_block.as_ref().is_some_and(|b| path::is_ancestor(b, &after.path)) {
                    end = after;
                }
            }
        }

        // Whole nodes strictly inside the range, plus any voids it touches.
        let mut matches: Vec<Path> = Vec::new();
        for (node, p) in editor.nodes(&NodeQuery::new().at(range.clone()).voids(voids))? {
            if matches
                .last()
                .is_some_and(|last| path::compare(&p, last) == Ordering::Equal)
            {
                continue;
            }
            let void = !voids && node.as_element().is_some_and(|e| editor.is_void(e));
            if void || (!path::is_common(&p, &start.path) && !path::is_common(&p, &end.path)) {
                matches.push(p);
            }
        }

        let path_refs: Vec<_> = matches
            .into_iter()
            .map(|p| editor.path_ref(p, FORWARD))
            .collect();
        let start_ref = editor.point_ref(start.clone(), FORWARD);
        let end_ref = editor.point_ref(end.clone(), FORWARD);

        if !single_text && start_void.is_none() {
            let point = start_ref
                .current(editor)
                .ok_or_else(|| EditorError::invalid("the start of the deleted range no longer resolves"))?;
            let leaf = editor.document().leaf(&point.path)?;
            let text = slice_chars(&leaf.text, start.offset, usize::MAX).to_string();
            if !text.is_empty() {
                editor.apply(Operation::RemoveText {
                    path: point.path,
                    offset: start.offset,
                    text,
                })?;
            }
        }

        for path_ref in path_refs.into_iter().rev() {
            if let Some(p) = path_ref.unref(editor) {
                node::remove_nodes(editor, NodeOptions::at(p).voids(voids))?;
            }
        }

        if end_void.is_none() {
            let point = end_ref
                .current(editor)
                .ok_or_else(|| EditorError::invalid("the end of the deleted range no longer resolves"))?;
            let leaf = editor.document().leaf(&point.path)?;
            let offset = if single_text { start.offset } else { 0 };
            let text = slice_chars(&leaf.text, offset, end.offset).to_string();
            if !text.is_empty() {
                editor.apply(Operation::RemoveText {
                    path: point.path,
                    offset,
                    text,
                })?;
            }
        }

        if !single_text && across_blocks {
            if let (Some(end_point), Some(_)) = (end_ref.current(editor), start_ref.current(editor)) {
                node::merge_nodes(
                    editor,
                    NodeOptions::at(end_point).hanging(true).voids(voids),
                )?;
            }
        }

        let start_point = start_ref.unref(editor);
        let end_point = end_ref.unref(editor);
        let point = if options.reverse {
            start_point.or(end_point)
        } else {
            end_point.or(start_point)
        };
        if options.at.is_none() {
            if let Some(point) = point {
                selection::select(editor, point)?;
            }
        }
        Ok(())
    })
}

/// Insert `text` at a point, replacing the range first when one is given.
/// Inserting into a void element does nothing unless `voids` is set.
#[instrument(skip_all, fields(len = text.len()))]
pub fn insert_text(editor: &mut Editor, text: &str, options: TextOptions) -> EditorResult<()> {
    editor.without_normalizing(|editor| {
        let voids = options.voids;
        let Some(at) = editor.resolve_at(options.at.as_ref()) else {
            return Ok(());
        };
        let at = match at {
            Location::Path(p) => Location::Range(editor.range(p, None)?),
            other => other,
        };

        let point = match at {
            Location::Range(range) if range.is_collapsed() => range.anchor,
            Location::Range(range) => {
                let end = range.end();
                if !voids && highest_void(editor, &end)?.is_some() {
                    return Ok(());
                }
                let start_ref = editor.point_ref(range.start(), FORWARD);
                let end_ref = editor.point_ref(end, FORWARD);
                delete(editor, TextOptions::at(range).voids(voids))?;
                let start = start_ref.unref(editor);
                let end = end_ref.unref(editor);
                let Some(point) = start.or(end) else {
                    return Ok(());
                };
                selection::set_selection(editor, Range::collapsed(point.clone()).into())?;
                point
            }
            Location::Point(point) => point,
            Location::Path(_) => return Ok(()),
        };

        if !voids && highest_void(editor, &point)?.is_some() {
            return Ok(());
        }
        if text.is_empty() {
            return Ok(());
        }
        editor.apply(Operation::InsertText {
            path: point.path,
            offset: point.offset,
            text: text.to_string(),
        })
    })
}
