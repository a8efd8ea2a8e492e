use crate::operation::Operation;
use crate::path::{self, Affinity, Path};
use crate::text::char_len;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A path to a text leaf plus a character offset into its text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }

    /// Order by path, then by offset when the paths are prefix-equal.
    pub fn compare(&self, other: &Point) -> Ordering {
        match path::compare(&self.path, &other.path) {
            Ordering::Equal => self.offset.cmp(&other.offset),
            ordering => ordering,
        }
    }

    pub fn is_before(&self, other: &Point) -> bool {
        self.compare(other) == Ordering::Less
    }

    pub fn is_after(&self, other: &Point) -> bool {
        self.compare(other) == Ordering::Greater
    }

    /// Rebase across `op`. `None` means the point no longer resolves.
    pub fn transform(&self, op: &Operation, affinity: Option<Affinity>) -> Option<Point> {
        let mut p = self.clone();

        match op {
            Operation::InsertNode { .. } | Operation::MoveNode { .. } => {
                p.path = path::transform(&self.path, op, affinity)?;
            }

            Operation::InsertText {
                path: at,
                offset,
                text,
            } => {
                if *at == self.path
                    && (*offset < self.offset
                        || (*offset == self.offset && affinity == Some(Affinity::Forward)))
                {
                    p.offset += char_len(text);
                }
            }

            Operation::RemoveText {
                path: at,
                offset,
                text,
            } => {
                if *at == self.path && *offset <= self.offset {
                    p.offset -= (self.offset - offset).min(char_len(text));
                }
            }

            Operation::MergeNode {
                path: at, position, ..
            } => {
                if *at == self.path {
                    p.offset += position;
                }
                p.path = path::transform(&self.path, op, affinity)?;
            }

            Operation::RemoveNode { path: at, .. } => {
                if *at == self.path || path::is_ancestor(at, &self.path) {
                    return None;
                }
                p.path = path::transform(&self.path, op, affinity)?;
            }

            Operation::SplitNode {
                path: at, position, ..
            } => {
                if *at == self.path {
                    if *position == self.offset && affinity.is_none() {
                        return None;
                    }
                    if *position < self.offset
                        || (*position == self.offset && affinity == Some(Affinity::Forward))
                    {
                        p.offset -= position;
                        p.path = path::transform(&self.path, op, Some(Affinity::Forward))?;
                    }
                } else {
                    p.path = path::transform(&self.path, op, affinity)?;
                }
            }

            Operation::SetNode { .. } | Operation::SetSelection { .. } => {}
        }

        Some(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FWD: Option<Affinity> = Some(Affinity::Forward);
    const BWD: Option<Affinity> = Some(Affinity::Backward);

    fn insert_text(path: Path, offset: usize, text: &str) -> Operation {
        Operation::InsertText {
            path,
            offset,
            text: text.into(),
        }
    }

    #[test]
    fn test_compare_uses_offset_as_tiebreak() {
        let a = Point::new(vec![0, 1], 2);
        let b = Point::new(vec![0, 1], 5);
        let c = Point::new(vec![0, 2], 0);
        assert!(a.is_before(&b));
        assert!(b.is_before(&c));
        assert!(c.is_after(&a));
        assert_eq!(a.compare(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_insert_text_at_point_respects_affinity() {
        let point = Point::new(vec![0, 0], 2);
        let op = insert_text(vec![0, 0], 2, "abc");
        assert_eq!(point.transform(&op, FWD).unwrap().offset, 5);
        assert_eq!(point.transform(&op, BWD).unwrap().offset, 2);

        let before = insert_text(vec![0, 0], 1, "é");
        assert_eq!(point.transform(&before, BWD).unwrap().offset, 3);
    }

    #[test]
    fn test_remove_text_clamps_into_removed_span() {
        let point = Point::new(vec![0, 0], 4);
        let op = Operation::RemoveText {
            path: vec![0, 0],
            offset: 2,
            text: "abcdef".into(),
        };
        assert_eq!(point.transform(&op, FWD).unwrap().offset, 2);
    }

    #[test]
    fn test_split_moves_point_into_new_node() {
        let op = Operation::SplitNode {
            path: vec![0, 0],
            position: 3,
            properties: Default::default(),
        };
        let point = Point::new(vec![0, 0], 5);
        assert_eq!(point.transform(&op, BWD), Some(Point::new(vec![0, 1], 2)));

        let edge = Point::new(vec![0, 0], 3);
        assert_eq!(edge.transform(&op, FWD), Some(Point::new(vec![0, 1], 0)));
        assert_eq!(edge.transform(&op, BWD), Some(Point::new(vec![0, 0], 3)));
        assert_eq!(edge.transform(&op, None), None);
    }

    #[test]
    fn test_merge_adds_position_to_offset() {
        let op = Operation::MergeNode {
            path: vec![0, 1],
            position: 4,
            properties: Default::default(),
        };
        let point = Point::new(vec![0, 1], 2);
        assert_eq!(point.transform(&op, FWD), Some(Point::new(vec![0, 0], 6)));
    }

    #[test]
    fn test_remove_node_invalidates_points_inside() {
        let op = Operation::RemoveNode {
            path: vec![1],
            node: crate::node::Node::text(""),
        };
        assert_eq!(Point::new(vec![1, 0], 0).transform(&op, FWD), None);
        assert_eq!(
            Point::new(vec![2, 0], 1).transform(&op, FWD),
            Some(Point::new(vec![1, 0], 1))
        );
    }
}
