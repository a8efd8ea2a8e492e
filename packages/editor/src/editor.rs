//! # Editor core
//!
//! [`Editor`] owns a document, its selection and every side structure that
//! must stay consistent with them: the key index, tracked refs, the dirty
//! path stack and the undo history.
//!
//! ## Apply pipeline
//!
//! ```text
//! apply(op)
//!   ├─ validate against committed state
//!   ├─ history: save / merge decision
//!   ├─ rebase refs and dirty paths
//!   ├─ commit to tree + selection, update key index
//!   ├─ push to the operation log
//!   └─ normalize (unless suspended)
//! ```
//!
//! Calls nest: transforms run inside [`Editor::without_normalizing`] and
//! call `apply` many times. The change handler fires once the outermost
//! call returns, after which the operation log is cleared.

use crate::config::EditorConfig;
use crate::dirty::DirtyPaths;
use crate::errors::{EditorError, EditorResult};
use crate::history::History;
use crate::index::NodeIndex;
use crate::refs::RefRegistry;
use crate::reducer;
use crate::schema::{CoreSchema, Schema};
use crate::scope::Scoped;
use quire_model::{Document, Element, Node, NodeKey, Operation, Path, Properties, Range};
use std::fmt;
use std::rc::Rc;
use tracing::trace;

type ChangeHandler = Box<dyn FnMut(&Editor)>;

pub struct Editor {
    document: Document,
    selection: Option<Range>,
    operations: Vec<Operation>,
    marks: Option<Properties>,
    pub(crate) dirty: DirtyPaths,
    normalizing: bool,
    depth: usize,
    index: NodeIndex,
    refs: RefRegistry,
    schema: Rc<dyn Schema>,
    pub(crate) history: Option<History>,
    on_change: Option<ChangeHandler>,
    config: EditorConfig,
}

/// Builder for [`Editor`].
pub struct EditorBuilder {
    document: Document,
    selection: Option<Range>,
    schema: Rc<dyn Schema>,
    config: EditorConfig,
}

impl EditorBuilder {
    pub fn document(mut self, document: Document) -> Self {
        self.document = document;
        self
    }

    pub fn children(mut self, children: Vec<Node>) -> Self {
        self.document = Document::new(children);
        self
    }

    pub fn selection(mut self, selection: Range) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schema = Rc::new(schema);
        self
    }

    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Editor {
        let mut document = self.document;
        let index = NodeIndex::build(&mut document);
        let history = self
            .config
            .history
            .enabled
            .then(|| History::new(&self.config.history));

        Editor {
            document,
            selection: self.selection,
            operations: Vec::new(),
            marks: None,
            dirty: DirtyPaths::default(),
            normalizing: self.config.normalize.enabled,
            depth: 0,
            index,
            refs: RefRegistry::default(),
            schema: self.schema,
            history,
            on_change: None,
            config: self.config,
        }
    }
}

impl Editor {
    pub fn builder() -> EditorBuilder {
        EditorBuilder {
            document: Document::default(),
            selection: None,
            schema: Rc::new(CoreSchema),
            config: EditorConfig::default(),
        }
    }

    /// An editor with the core schema and default configuration.
    pub fn new(document: Document) -> Self {
        Self::builder().document(document).build()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn children(&self) -> &[Node] {
        &self.document.children
    }

    pub fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    /// Operations applied during the current outermost call.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Marks queued for the next inserted text, if any.
    pub fn cursor_marks(&self) -> Option<&Properties> {
        self.marks.as_ref()
    }

    pub(crate) fn set_cursor_marks(&mut self, marks: Option<Properties>) {
        self.marks = marks;
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn schema(&self) -> Rc<dyn Schema> {
        Rc::clone(&self.schema)
    }

    pub fn history(&self) -> Option<&History> {
        self.history.as_ref()
    }

    pub fn is_normalizing(&self) -> bool {
        self.normalizing
    }

    pub(crate) fn refs(&self) -> &RefRegistry {
        &self.refs
    }

    pub(crate) fn refs_mut(&mut self) -> &mut RefRegistry {
        &mut self.refs
    }

    /// Paths still waiting for normalization.
    pub fn dirty_paths(&self) -> Vec<Path> {
        self.dirty.snapshot()
    }

    /// Register the handler fired after each outermost call that produced
    /// operations.
    pub fn set_on_change(&mut self, handler: impl FnMut(&Editor) + 'static) {
        self.on_change = Some(Box::new(handler));
    }

    pub fn is_inline(&self, element: &Element) -> bool {
        self.schema.is_inline(element)
    }

    pub fn is_void(&self, element: &Element) -> bool {
        self.schema.is_void(element)
    }

    pub fn is_block(&self, element: &Element) -> bool {
        !self.schema.is_inline(element)
    }

    /// Key of the node at `path`.
    pub fn key_at(&self, path: &[usize]) -> Option<NodeKey> {
        self.document.get_if(path).and_then(|node| node.key())
    }

    /// Current path of the node with `key`, answered from the side index.
    pub fn find_path(&self, key: NodeKey) -> Option<Path> {
        self.index.path_of(key)
    }

    /// Apply one primitive operation.
    pub fn apply(&mut self, op: Operation) -> EditorResult<()> {
        self.depth += 1;
        let result = self.apply_inner(op);
        self.depth -= 1;
        self.flush();
        result
    }

    fn apply_inner(&mut self, op: Operation) -> EditorResult<()> {
        reducer::validate(&self.document, self.selection.as_ref(), &op)?;

        if let Some(history) = self.history.as_mut() {
            history.record(&op, &self.operations, self.selection.as_ref());
        }

        self.refs.transform(&op);
        self.dirty.update(&op);

        self.index.before_commit(&self.document, &op);
        reducer::commit(&mut self.document, &mut self.selection, &op)?;
        self.index.after_commit(&mut self.document, &op)?;

        trace!(op = op.kind(), path = ?op.path(), "committed operation");

        if op.is_selection_operation() {
            self.marks = None;
        }
        self.operations.push(op);

        self.normalize()
    }

    /// Run `f` with normalization suspended, then normalize once.
    pub fn without_normalizing<T>(
        &mut self,
        f: impl FnOnce(&mut Editor) -> EditorResult<T>,
    ) -> EditorResult<T> {
        self.depth += 1;
        let result = {
            let mut scope = Scoped::enter(self, false, |e| e.normalizing, |e, v| e.normalizing = v);
            f(&mut scope)
        };
        let result = result.and_then(|value| self.normalize().map(|()| value));
        self.depth -= 1;
        self.flush();
        result
    }

    /// Fire the change handler if no call is in flight.
    pub(crate) fn flush(&mut self) {
        if self.depth > 0 || self.operations.is_empty() {
            return;
        }
        self.notify();
        self.operations.clear();
    }

    /// Fire the change handler now unless a call is in flight.
    pub(crate) fn notify(&mut self) {
        if self.depth > 0 {
            return;
        }
        if let Some(mut handler) = self.on_change.take() {
            handler(self);
            if self.on_change.is_none() {
                self.on_change = Some(handler);
            }
        }
    }

    pub(crate) fn require_selection(&self) -> EditorResult<&Range> {
        self.selection
            .as_ref()
            .ok_or_else(|| EditorError::invalid("the editor has no selection"))
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("document", &self.document)
            .field("selection", &self.selection)
            .field("operations", &self.operations.len())
            .field("dirty", &self.dirty.len())
            .field("normalizing", &self.normalizing)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::Point;
    use std::cell::RefCell;

    fn editor() -> Editor {
        Editor::new(Document::new(vec![Node::element(vec![Node::text("one")])]))
    }

    #[test]
    fn test_apply_fires_change_once_per_call() {
        let mut editor = editor();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        editor.set_on_change(move |editor| sink.borrow_mut().push(editor.operations().len()));

        editor
            .apply(Operation::InsertText {
                path: vec![0, 0],
                offset: 3,
                text: "!".into(),
            })
            .unwrap();
        editor
            .without_normalizing(|editor| {
                editor.apply(Operation::InsertText {
                    path: vec![0, 0],
                    offset: 0,
                    text: "a".into(),
                })?;
                editor.apply(Operation::InsertText {
                    path: vec![0, 0],
                    offset: 0,
                    text: "b".into(),
                })
            })
            .unwrap();

        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert!(editor.operations().is_empty());
        assert_eq!(editor.document().string(&[]).unwrap(), "baone!");
    }

    #[test]
    fn test_failed_apply_keeps_state() {
        let mut editor = editor();
        let before = editor.document().clone();
        let result = editor.apply(Operation::InsertText {
            path: vec![0, 0],
            offset: 9,
            text: "x".into(),
        });
        assert!(result.is_err());
        assert_eq!(editor.document(), &before);
    }

    #[test]
    fn test_set_selection_clears_cursor_marks() {
        let mut editor = editor();
        editor.set_cursor_marks(Some(Properties::new()));
        editor
            .apply(Operation::SetSelection {
                properties: None,
                new_properties: Some(quire_model::SelectionPatch {
                    anchor: Some(Point::new(vec![0, 0], 0)),
                    focus: Some(Point::new(vec![0, 0], 0)),
                }),
            })
            .unwrap();
        assert!(editor.cursor_marks().is_none());
        assert!(editor.selection().is_some());
    }

    #[test]
    fn test_find_path_tracks_moves() {
        let mut editor = Editor::new(Document::new(vec![
            Node::element(vec![Node::text("a")]),
            Node::element(vec![Node::text("b")]),
        ]));
        let key = editor.key_at(&[1, 0]).unwrap();
        editor
            .apply(Operation::MoveNode {
                path: vec![1, 0],
                new_path: vec![0, 0],
            })
            .unwrap();
        assert_eq!(editor.find_path(key), Some(vec![0, 0]));
    }
}
