//! # Quire Model
//!
//! The document model underneath the Quire editing kernel.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ path / point / range: addressing + rebasing │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ node + tree: Document, Element, Text        │
//! │  - get / parent / first / last / leaf       │
//! │  - pre-order traversal, fragments           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ operation: the nine invertible mutations    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Nothing here holds editor state. Applying operations, normalization and
//! history live in `quire-editor`.

pub mod error;
pub mod key;
pub mod node;
pub mod operation;
pub mod path;
pub mod point;
pub mod range;
pub mod text;
pub mod traversal;
pub mod tree;

pub use error::{ModelError, ModelResult};
pub use key::NodeKey;
pub use node::{Document, Element, Node, NodeRef, Properties, Text};
pub use operation::{Operation, SelectionPatch};
pub use path::{Affinity, Path};
pub use point::Point;
pub use range::{Range, RangeAffinity};
pub use text::Decoration;
pub use traversal::{NodePredicate, Nodes, NodesOptions};
pub use tree::Entry;
