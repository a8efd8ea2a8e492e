//! # Undo/Redo History
//!
//! Records applied operations into batches and replays them backwards and
//! forwards.
//!
//! ## Design
//!
//! - Each batch holds operations in application order plus the selection
//!   as it was before the first of them
//! - Selection-only operations are not recorded unless configured or a
//!   `without_saving`/saving scope says otherwise
//! - An operation joins the top batch when it is part of a larger outer
//!   call, when a merging scope forces it, or when it continues typing or
//!   deleting contiguously on the same leaf
//! - Consecutive recorded selection operations overwrite one another
//! - Both stacks are capped; the oldest batch is evicted first
//! - Recording anything clears the redo stack
//!
//! ## Example
//!
//! ```rust,ignore
//! editor.insert_text("a")?;
//! editor.insert_text("b")?;
//! editor.undo()?; // removes "ab" in one step
//! editor.redo()?;
//! ```

use crate::config::HistoryConfig;
use crate::editor::Editor;
use crate::errors::EditorResult;
use crate::scope::Scoped;
use crate::transforms::selection;
use quire_model::text::char_len;
use quire_model::{Operation, Range};
use tracing::{debug, instrument};

/// Operations undone and redone together.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// In application order
    pub operations: Vec<Operation>,

    /// Selection immediately before the first operation
    pub selection_before: Option<Range>,
}

#[derive(Debug)]
pub struct History {
    undos: Vec<Batch>,
    redos: Vec<Batch>,

    /// Cap for each stack
    max_batches: usize,

    save_selection: bool,

    /// Scoped override of the save decision
    saving: Option<bool>,

    /// Scoped override of the merge decision
    merging: Option<bool>,
}

impl History {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            undos: Vec::new(),
            redos: Vec::new(),
            max_batches: config.max_batches,
            save_selection: config.save_selection,
            saving: None,
            merging: None,
        }
    }

    pub fn undos(&self) -> &[Batch] {
        &self.undos
    }

    pub fn redos(&self) -> &[Batch] {
        &self.redos
    }

    pub fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undos.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redos.len()
    }

    pub fn clear(&mut self) {
        self.undos.clear();
        self.redos.clear();
    }

    /// Decide whether and where `op` is recorded. `in_flight` holds the
    /// operations already applied during the current outer call.
    pub(crate) fn record(&mut self, op: &Operation, in_flight: &[Operation], selection: Option<&Range>) {
        let last_op = self.undos.last().and_then(|batch| batch.operations.last());

        let save = self
            .saving
            .unwrap_or_else(|| self.save_selection || !op.is_selection_operation());
        if !save {
            return;
        }

        let merge = self.merging.unwrap_or_else(|| match last_op {
            None => false,
            Some(_) if !in_flight.is_empty() => true,
            Some(prev) => is_contiguous(op, prev),
        });
        let overwrite = matches!(last_op, Some(prev) if prev.is_selection_operation())
            && op.is_selection_operation();

        match self.undos.last_mut() {
            Some(batch) if merge => {
                if overwrite {
                    batch.operations.pop();
                }
                batch.operations.push(op.clone());
            }
            _ => {
                debug!(op = op.kind(), "starting history batch");
                let batch = Batch {
                    operations: vec![op.clone()],
                    selection_before: selection.cloned(),
                };
                push_capped(&mut self.undos, batch, self.max_batches);
            }
        }

        self.redos.clear();
    }
}

/// Typing forwards or deleting backwards on the same leaf.
fn is_contiguous(op: &Operation, prev: &Operation) -> bool {
    match (op, prev) {
        (
            Operation::InsertText { path, offset, .. },
            Operation::InsertText {
                path: prev_path,
                offset: prev_offset,
                text: prev_text,
            },
        ) => path == prev_path && *offset == prev_offset + char_len(prev_text),
        (
            Operation::RemoveText { path, offset, text },
            Operation::RemoveText {
                path: prev_path,
                offset: prev_offset,
                ..
            },
        ) => path == prev_path && offset + char_len(text) == *prev_offset,
        _ => false,
    }
}

fn push_capped(stack: &mut Vec<Batch>, batch: Batch, max: usize) {
    stack.push(batch);
    while max > 0 && stack.len() > max {
        stack.remove(0);
    }
}

fn get_saving(editor: &Editor) -> Option<bool> {
    editor.history.as_ref().and_then(|h| h.saving)
}

fn set_saving(editor: &mut Editor, value: Option<bool>) {
    if let Some(history) = editor.history.as_mut() {
        history.saving = value;
    }
}

fn get_merging(editor: &Editor) -> Option<bool> {
    editor.history.as_ref().and_then(|h| h.merging)
}

fn set_merging(editor: &mut Editor, value: Option<bool>) {
    if let Some(history) = editor.history.as_mut() {
        history.merging = value;
    }
}

impl Editor {
    pub fn can_undo(&self) -> bool {
        self.history().is_some_and(History::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.history().is_some_and(History::can_redo)
    }

    /// Run `f` without recording any operation it applies.
    pub fn without_saving<T>(
        &mut self,
        f: impl FnOnce(&mut Editor) -> EditorResult<T>,
    ) -> EditorResult<T> {
        let mut scope = Scoped::enter(self, Some(false), get_saving, set_saving);
        f(&mut scope)
    }

    /// Run `f` with every recorded operation starting a new batch.
    pub fn without_merging<T>(
        &mut self,
        f: impl FnOnce(&mut Editor) -> EditorResult<T>,
    ) -> EditorResult<T> {
        let mut scope = Scoped::enter(self, Some(false), get_merging, set_merging);
        f(&mut scope)
    }

    /// Run `f` with every recorded operation joining the top batch.
    pub fn with_merging<T>(
        &mut self,
        f: impl FnOnce(&mut Editor) -> EditorResult<T>,
    ) -> EditorResult<T> {
        let mut scope = Scoped::enter(self, Some(true), get_merging, set_merging);
        f(&mut scope)
    }

    /// Revert the most recent batch. Returns `false` when there is nothing
    /// to undo. The batch leaves the undo stack before any inverse is
    /// applied, so a failure part way through is never replayed.
    #[instrument(skip(self))]
    pub fn undo(&mut self) -> EditorResult<bool> {
        let Some(batch) = self.history.as_mut().and_then(|h| h.undos.pop()) else {
            return Ok(false);
        };

        self.without_saving(|editor| {
            editor.without_normalizing(|editor| {
                for op in batch.operations.iter().rev() {
                    editor.apply(op.inverse())?;
                }
                restore_selection(editor, batch.selection_before.as_ref())
            })
        })?;

        if let Some(history) = self.history.as_mut() {
            let max = history.max_batches;
            push_capped(&mut history.redos, batch, max);
        }
        debug!("undo");
        Ok(true)
    }

    /// Reapply the most recently undone batch. Returns `false` when there
    /// is nothing to redo.
    #[instrument(skip(self))]
    pub fn redo(&mut self) -> EditorResult<bool> {
        let Some(batch) = self.history.as_mut().and_then(|h| h.redos.pop()) else {
            return Ok(false);
        };

        self.without_saving(|editor| {
            editor.without_normalizing(|editor| {
                restore_selection(editor, batch.selection_before.as_ref())?;
                for op in &batch.operations {
                    editor.apply(op.clone())?;
                }
                Ok(())
            })
        })?;

        if let Some(history) = self.history.as_mut() {
            let max = history.max_batches;
            push_capped(&mut history.undos, batch, max);
        }
        debug!("redo");
        Ok(true)
    }
}

fn restore_selection(editor: &mut Editor, before: Option<&Range>) -> EditorResult<()> {
    let Some(range) = before else {
        return Ok(());
    };
    if editor.selection().is_some() {
        selection::set_selection(editor, range.clone().into())
    } else {
        selection::select(editor, range.clone())
    }
}
