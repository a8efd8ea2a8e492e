//! Transforms compose primitive operations into higher-level edits.
//!
//! Every transform runs inside [`Editor::without_normalizing`], so the
//! document is normalized once after the last operation lands. Transforms
//! are not atomic: if one fails partway, operations that already applied
//! stay applied.
//!
//! [`Editor::without_normalizing`]: crate::Editor::without_normalizing

pub mod node;
pub mod selection;
pub mod text;

pub use node::NodeOptions;
pub use selection::MoveOptions;
pub use text::TextOptions;
