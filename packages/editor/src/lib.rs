//! # Quire Editor
//!
//! Transactional editing core for Quire documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: tree, paths, points, operations      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: apply pipeline                      │
//! │  - Validate and commit primitive operations │
//! │  - Rebase refs, selection and dirty paths   │
//! │  - Normalize through the schema hooks       │
//! │  - Record undo batches                      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ transforms + commands: composite edits      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Operations are the only mutation**: every edit reduces to the nine
//!    primitive operations, each with an exact inverse
//! 2. **Normalize once**: transforms suspend normalization and settle the
//!    document after their last operation
//! 3. **Hooks, not forks**: schemas customize element kinds, normalization
//!    and commands without touching the core
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_editor::transforms::selection;
//! use quire_editor::{Editor, Unit};
//! use quire_model::{Document, Node, Point};
//!
//! let mut editor = Editor::new(Document::new(vec![Node::element(vec![Node::text("")])]));
//! selection::select(&mut editor, Point::new(vec![0, 0], 0))?;
//! editor.insert_text("hello")?;
//! editor.delete_backward(Unit::Character)?;
//! editor.undo()?;
//! ```

pub mod commands;
mod config;
mod dirty;
mod editor;
mod errors;
mod history;
mod index;
mod location;
mod normalize;
mod positions;
mod queries;
mod reducer;
mod refs;
mod schema;
mod scope;
pub mod transforms;

pub use config::{EditorConfig, HistoryConfig, NormalizeConfig, DEFAULT_CONFIG_NAME};
pub use editor::{Editor, EditorBuilder};
pub use errors::{EditorError, EditorResult};
pub use history::{Batch, History};
pub use location::{Edge, Location, Mode, NodeMatch, NodeQuery, SelectionEdge, Span, StepOptions, Unit};
pub use normalize::normalize_node;
pub use refs::{PathRef, PointRef, RangeRef};
pub use schema::{CoreSchema, Schema};
pub use transforms::{MoveOptions, NodeOptions, TextOptions};

#[cfg(test)]
mod tests_transforms;
