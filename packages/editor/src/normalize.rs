//! # Normalization
//!
//! After operations are applied, every dirty path is handed to the schema's
//! `normalize_node` hook. Paths are drained last-in first-out; a hook that
//! applies operations dirties further paths and extends the pass.
//!
//! A pass is capped at `initial dirty count * iteration_factor` pops so that
//! a hook that never converges fails with
//! [`EditorError::NormalizationLimit`] instead of looping.

use crate::editor::Editor;
use crate::errors::{EditorError, EditorResult};
use crate::transforms::node::{self, NodeOptions};
use quire_model::{Node, NodeRef, NodesOptions, Path, Properties, Text};
use tracing::{instrument, trace, warn};

impl Editor {
    /// Drain the dirty path stack through the schema hook.
    pub fn normalize(&mut self) -> EditorResult<()> {
        if !self.is_normalizing() || self.dirty.is_empty() {
            return Ok(());
        }
        self.run_normalization()
    }

    /// Mark every path dirty and normalize the whole document.
    pub fn normalize_force(&mut self) -> EditorResult<()> {
        if !self.is_normalizing() {
            return Ok(());
        }
        let all: Vec<Path> = self
            .document()
            .nodes(NodesOptions::default())
            .map(|(_, p)| p)
            .collect();
        self.dirty.reset(all);
        self.run_normalization()
    }

    #[instrument(skip(self), fields(dirty = self.dirty.len()))]
    fn run_normalization(&mut self) -> EditorResult<()> {
        let factor = self.config().normalize.iteration_factor;

        self.without_normalizing(|editor| {
            // Empty elements first, so later hooks never see a childless element.
            for path in editor.dirty.snapshot() {
                let empty = editor
                    .document()
                    .get_if(&path)
                    .and_then(|n| n.as_element())
                    .is_some_and(|e| e.children.is_empty());
                if empty {
                    let schema = editor.schema();
                    schema.normalize_node(editor, &path)?;
                }
            }

            let max = editor.dirty.len() * factor;
            let mut iterations = 0;
            while let Some(path) = editor.dirty.pop() {
                if iterations > max {
                    warn!(iterations, "normalization did not converge");
                    return Err(EditorError::NormalizationLimit { iterations: max });
                }
                trace!(path = ?path, "normalizing");
                if editor.document().has(&path) {
                    let schema = editor.schema();
                    schema.normalize_node(editor, &path)?;
                }
                iterations += 1;
            }
            Ok(())
        })
    }
}

/// What the core normalizer needs to know about a child before any
/// operation shifts it.
struct ChildSummary {
    inline_or_text: bool,
    inline_element: bool,
    text: Option<Text>,
}

/// The core schema rules:
///
/// - an element with no children gets an empty text child
/// - children are either all blocks or all inlines and texts, matching the
///   first child; the root only holds blocks
/// - inline elements are surrounded by texts
/// - adjacent texts with equal marks are merged, and empty texts next to
///   other texts are removed
pub fn normalize_node(editor: &mut Editor, path: &[usize]) -> EditorResult<()> {
    let Some(node) = editor.document().get_if(path) else {
        return Ok(());
    };
    if node.is_text() {
        return Ok(());
    }

    if let Some(element) = node.as_element() {
        if element.children.is_empty() {
            let mut at = path.to_vec();
            at.push(0);
            return node::insert_nodes(
                editor,
                vec![Node::text("")],
                NodeOptions::at(at).voids(true),
            );
        }
    }

    let should_have_inlines = match node {
        NodeRef::Root(_) | NodeRef::Text(_) => false,
        NodeRef::Element(element) => {
            editor.is_inline(element)
                || match element.children.first() {
                    Some(Node::Text(_)) | None => true,
                    Some(Node::Element(first)) => editor.is_inline(first),
                }
        }
    };

    let summary: Vec<ChildSummary> = node
        .children()
        .unwrap_or(&[])
        .iter()
        .map(|child| match child {
            Node::Text(text) => ChildSummary {
                inline_or_text: true,
                inline_element: false,
                text: Some(text.clone()),
            },
            Node::Element(element) => {
                let inline = editor.is_inline(element);
                ChildSummary {
                    inline_or_text: inline,
                    inline_element: inline,
                    text: None,
                }
            }
        })
        .collect();

    let child_path = |n: usize| {
        let mut at = path.to_vec();
        at.push(n);
        at
    };

    // `n` tracks the live index of snapshot child `i` as operations land.
    let mut n: isize = 0;
    let count = summary.len();
    for (i, child) in summary.into_iter().enumerate() {
        let current = editor.document().get(path)?;
        let Some(children) = current.children() else {
            break;
        };
        let prev: Option<Properties> = usize::try_from(n - 1)
            .ok()
            .and_then(|p| children.get(p))
            .and_then(Node::as_text)
            .map(|t| t.marks.clone());
        let prev_text_empty = usize::try_from(n - 1)
            .ok()
            .and_then(|p| children.get(p))
            .and_then(Node::as_text)
            .is_some_and(|t| t.text.is_empty());
        let live = usize::try_from(n).unwrap_or_default();
        let is_last = i + 1 == count;

        if child.inline_or_text != should_have_inlines {
            node::remove_nodes(editor, NodeOptions::at(child_path(live)).voids(true))?;
            n -= 1;
        } else if child.text.is_none() {
            if child.inline_element {
                if prev.is_none() {
                    node::insert_nodes(
                        editor,
                        vec![Node::text("")],
                        NodeOptions::at(child_path(live)).voids(true),
                    )?;
                    n += 1;
                } else if is_last {
                    node::insert_nodes(
                        editor,
                        vec![Node::text("")],
                        NodeOptions::at(child_path(live + 1)).voids(true),
                    )?;
                    n += 1;
                }
            }
        } else if let (Some(text), Some(prev_marks)) = (&child.text, prev) {
            if text.marks == prev_marks {
                node::merge_nodes(editor, NodeOptions::at(child_path(live)).voids(true))?;
                n -= 1;
            } else if prev_text_empty {
                node::remove_nodes(editor, NodeOptions::at(child_path(live - 1)).voids(true))?;
                n -= 1;
            } else if text.text.is_empty() {
                node::remove_nodes(editor, NodeOptions::at(child_path(live)).voids(true))?;
                n -= 1;
            }
        }

        n += 1;
    }

    Ok(())
}
