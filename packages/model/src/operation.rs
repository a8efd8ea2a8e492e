//! # Operations
//!
//! The closed set of primitive mutations. Every variant carries enough data
//! to be both applied and inverted, so `op.inverse()` applied after `op`
//! restores the prior tree and selection exactly.
//!
//! ## Wire format
//!
//! ```json
//! { "type": "move_node", "path": [4], "newPath": [2] }
//! { "type": "insert_text", "path": [0, 0], "offset": 3, "text": "abc" }
//! ```

use crate::node::{Node, Properties};
use crate::path::{self, Path};
use crate::point::Point;
use crate::range::Range;
use serde::{Deserialize, Serialize};

/// Partial range used by `set_selection`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<Point>,
}

impl SelectionPatch {
    pub fn is_empty(&self) -> bool {
        self.anchor.is_none() && self.focus.is_none()
    }
}

impl From<Range> for SelectionPatch {
    fn from(range: Range) -> Self {
        Self {
            anchor: Some(range.anchor),
            focus: Some(range.focus),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    InsertNode {
        path: Path,
        node: Node,
    },
    RemoveNode {
        path: Path,
        node: Node,
    },
    /// `properties` holds the previous values of every key touched;
    /// `Null` stands for "absent".
    SetNode {
        path: Path,
        properties: Properties,
        #[serde(rename = "newProperties")]
        new_properties: Properties,
    },
    /// `position` is a character offset for text leaves and a child index
    /// for elements. `properties` are given to the new right-hand node.
    SplitNode {
        path: Path,
        position: usize,
        properties: Properties,
    },
    /// Merges the node at `path` into its previous sibling. `position` is
    /// the size of that previous sibling before the merge.
    MergeNode {
        path: Path,
        position: usize,
        properties: Properties,
    },
    MoveNode {
        path: Path,
        #[serde(rename = "newPath")]
        new_path: Path,
    },
    InsertText {
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        path: Path,
        offset: usize,
        text: String,
    },
    /// `None` on either side stands for a null selection.
    SetSelection {
        properties: Option<SelectionPatch>,
        #[serde(rename = "newProperties")]
        new_properties: Option<SelectionPatch>,
    },
}

impl Operation {
    /// The `type` tag of this operation.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::InsertNode { .. } => "insert_node",
            Operation::RemoveNode { .. } => "remove_node",
            Operation::SetNode { .. } => "set_node",
            Operation::SplitNode { .. } => "split_node",
            Operation::MergeNode { .. } => "merge_node",
            Operation::MoveNode { .. } => "move_node",
            Operation::InsertText { .. } => "insert_text",
            Operation::RemoveText { .. } => "remove_text",
            Operation::SetSelection { .. } => "set_selection",
        }
    }

    /// The primary path of the operation; `None` for `set_selection`.
    pub fn path(&self) -> Option<&[usize]> {
        match self {
            Operation::InsertNode { path, .. }
            | Operation::RemoveNode { path, .. }
            | Operation::SetNode { path, .. }
            | Operation::SplitNode { path, .. }
            | Operation::MergeNode { path, .. }
            | Operation::MoveNode { path, .. }
            | Operation::InsertText { path, .. }
            | Operation::RemoveText { path, .. } => Some(path),
            Operation::SetSelection { .. } => None,
        }
    }

    pub fn is_node_operation(&self) -> bool {
        matches!(
            self,
            Operation::InsertNode { .. }
                | Operation::RemoveNode { .. }
                | Operation::SetNode { .. }
                | Operation::SplitNode { .. }
                | Operation::MergeNode { .. }
                | Operation::MoveNode { .. }
        )
    }

    pub fn is_text_operation(&self) -> bool {
        matches!(
            self,
            Operation::InsertText { .. } | Operation::RemoveText { .. }
        )
    }

    pub fn is_selection_operation(&self) -> bool {
        matches!(self, Operation::SetSelection { .. })
    }

    /// The operation that undoes this one.
    pub fn inverse(&self) -> Operation {
        match self {
            Operation::InsertNode { path, node } => Operation::RemoveNode {
                path: path.clone(),
                node: node.clone(),
            },
            Operation::RemoveNode { path, node } => Operation::InsertNode {
                path: path.clone(),
                node: node.clone(),
            },
            Operation::InsertText { path, offset, text } => Operation::RemoveText {
                path: path.clone(),
                offset: *offset,
                text: text.clone(),
            },
            Operation::RemoveText { path, offset, text } => Operation::InsertText {
                path: path.clone(),
                offset: *offset,
                text: text.clone(),
            },
            Operation::SetNode {
                path,
                properties,
                new_properties,
            } => Operation::SetNode {
                path: path.clone(),
                properties: new_properties.clone(),
                new_properties: properties.clone(),
            },
            Operation::SetSelection {
                properties,
                new_properties,
            } => Operation::SetSelection {
                properties: new_properties.clone(),
                new_properties: properties.clone(),
            },
            Operation::SplitNode {
                path: at,
                position,
                properties,
            } => Operation::MergeNode {
                path: path::next(at).unwrap_or_else(|_| at.clone()),
                position: *position,
                properties: properties.clone(),
            },
            Operation::MergeNode {
                path: at,
                position,
                properties,
            } => Operation::SplitNode {
                path: path::previous(at).unwrap_or_else(|_| at.clone()),
                position: *position,
                properties: properties.clone(),
            },
            Operation::MoveNode { path: from, new_path: to } => {
                if from == to {
                    return self.clone();
                }
                if path::is_sibling(from, to) {
                    return Operation::MoveNode {
                        path: to.clone(),
                        new_path: from.clone(),
                    };
                }
                // The node now lives where `from` ends up after the move, and
                // must return to the slot that followed it originally.
                let inverse_path = path::transform(from, self, None).unwrap_or_else(|| to.clone());
                let inverse_new_path = path::next(from)
                    .ok()
                    .and_then(|after| path::transform(&after, self, None))
                    .unwrap_or_else(|| from.clone());
                Operation::MoveNode {
                    path: inverse_path,
                    new_path: inverse_new_path,
                }
            }
        }
    }
}
