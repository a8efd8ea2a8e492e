//! # Schema hooks
//!
//! A [`Schema`] is how a collaborator customizes the editor without
//! touching the core: element predicates, the per-path normalization hook
//! and the high-level editing commands.
//!
//! Every hook has a default that implements the core behavior, so an
//! override usually handles its own case and defers to the free function
//! in [`crate::commands`] or [`crate::normalize_node`] otherwise.
//!
//! ```rust,ignore
//! #[derive(Debug)]
//! struct Mentions;
//!
//! impl Schema for Mentions {
//!     fn is_inline(&self, element: &Element) -> bool {
//!         element.property("type") == Some(&json!("mention"))
//!     }
//!
//!     fn is_void(&self, element: &Element) -> bool {
//!         self.is_inline(element)
//!     }
//! }
//! ```

use crate::commands;
use crate::editor::Editor;
use crate::errors::EditorResult;
use crate::location::Unit;
use crate::normalize;
use quire_model::{Element, Node};
use serde_json::Value;

/// Schema predicates and override points consulted by the editor.
pub trait Schema: std::fmt::Debug {
    fn is_inline(&self, _element: &Element) -> bool {
        false
    }

    fn is_void(&self, _element: &Element) -> bool {
        false
    }

    /// Restore schema invariants for the node at `path`. Called once per
    /// dirty path; may apply operations, which dirty further paths.
    fn normalize_node(&self, editor: &mut Editor, path: &[usize]) -> EditorResult<()> {
        normalize::normalize_node(editor, path)
    }

    fn insert_text(&self, editor: &mut Editor, text: &str) -> EditorResult<()> {
        commands::insert_text(editor, text)
    }

    fn insert_node(&self, editor: &mut Editor, node: Node) -> EditorResult<()> {
        commands::insert_node(editor, node)
    }

    fn insert_break(&self, editor: &mut Editor) -> EditorResult<()> {
        commands::insert_break(editor)
    }

    fn delete_backward(&self, editor: &mut Editor, unit: Unit) -> EditorResult<()> {
        commands::delete_backward(editor, unit)
    }

    fn delete_forward(&self, editor: &mut Editor, unit: Unit) -> EditorResult<()> {
        commands::delete_forward(editor, unit)
    }

    fn delete_fragment(&self, editor: &mut Editor, reverse: bool) -> EditorResult<()> {
        commands::delete_fragment(editor, reverse)
    }

    fn add_mark(&self, editor: &mut Editor, key: &str, value: Value) -> EditorResult<()> {
        commands::add_mark(editor, key, value)
    }

    fn remove_mark(&self, editor: &mut Editor, key: &str) -> EditorResult<()> {
        commands::remove_mark(editor, key)
    }
}

/// The schema used when none is supplied: no inlines, no voids, core
/// normalization and commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoreSchema;

impl Schema for CoreSchema {}
