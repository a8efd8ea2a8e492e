//! Paths awaiting normalization.

use quire_model::path::{self, Path};
use quire_model::{Document, Node, NodesOptions, Operation};
use std::collections::HashSet;

/// LIFO stack of dirty paths with set semantics.
#[derive(Debug, Default)]
pub(crate) struct DirtyPaths {
    paths: Vec<Path>,
    keys: HashSet<Path>,
}

impl DirtyPaths {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, path: &[usize]) -> bool {
        self.keys.contains(path)
    }

    pub fn snapshot(&self) -> Vec<Path> {
        self.paths.clone()
    }

    pub fn push(&mut self, path: Path) {
        if self.keys.insert(path.clone()) {
            self.paths.push(path);
        }
    }

    pub fn pop(&mut self) -> Option<Path> {
        let path = self.paths.pop()?;
        self.keys.remove(&path);
        Some(path)
    }

    /// Replace the stack wholesale.
    pub fn reset(&mut self, paths: impl IntoIterator<Item = Path>) {
        self.paths.clear();
        self.keys.clear();
        for path in paths {
            self.push(path);
        }
    }

    /// Rebase existing entries across `op`, then mark what `op` touched.
    pub fn update(&mut self, op: &Operation) {
        if path::operation_can_transform_path(op) {
            let old = std::mem::take(&mut self.paths);
            self.keys.clear();
            for p in old {
                if let Some(p) = path::transform(&p, op, Some(path::Affinity::Forward)) {
                    self.push(p);
                }
            }
        }

        for p in dirty_paths(op) {
            self.push(p);
        }
    }
}

/// Paths whose subtrees may violate the schema after `op`.
pub(crate) fn dirty_paths(op: &Operation) -> Vec<Path> {
    match op {
        Operation::InsertText { path: at, .. }
        | Operation::RemoveText { path: at, .. }
        | Operation::SetNode { path: at, .. } => path::levels(at, false),

        Operation::InsertNode { path: at, node } => {
            let mut paths = path::levels(at, false);
            if let Node::Element(element) = node {
                let subtree = Document::new(element.children.clone());
                paths.extend(
                    subtree
                        .nodes(NodesOptions::default())
                        .filter(|(_, p)| !p.is_empty())
                        .map(|(_, p)| {
                            let mut full = at.clone();
                            full.extend(p);
                            full
                        }),
                );
            }
            paths
        }

        Operation::MergeNode { path: at, .. } => {
            let mut paths = path::ancestors(at, false);
            paths.extend(path::previous(at).ok());
            paths
        }

        Operation::MoveNode { path: from, new_path: to } => {
            if from == to {
                return Vec::new();
            }
            let old_ancestors: Vec<Path> = path::ancestors(from, false)
                .iter()
                .filter_map(|p| path::transform(p, op, Some(path::Affinity::Forward)))
                .collect();
            let new_ancestors: Vec<Path> = path::ancestors(to, false)
                .iter()
                .filter_map(|p| path::transform(p, op, Some(path::Affinity::Forward)))
                .collect();
            let mut result = new_ancestors.last().cloned().unwrap_or_default();
            result.extend(to.last().copied());

            let mut paths = old_ancestors;
            paths.extend(new_ancestors);
            paths.push(result);
            paths
        }

        Operation::RemoveNode { path: at, .. } => path::ancestors(at, false),

        Operation::SplitNode { path: at, .. } => {
            let mut paths = path::levels(at, false);
            paths.extend(path::next(at).ok());
            paths
        }

        Operation::SetSelection { .. } => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::Properties;

    #[test]
    fn test_push_dedupes_and_pops_lifo() {
        let mut dirty = DirtyPaths::default();
        dirty.push(vec![0]);
        dirty.push(vec![1]);
        dirty.push(vec![0]);
        assert_eq!(dirty.len(), 2);
        assert_eq!(dirty.pop(), Some(vec![1]));
        assert_eq!(dirty.pop(), Some(vec![0]));
        assert!(dirty.is_empty());
    }

    #[test]
    fn test_insert_node_marks_descendants() {
        let op = Operation::InsertNode {
            path: vec![1],
            node: Node::element(vec![Node::element(vec![Node::text("x")])]),
        };
        assert_eq!(
            dirty_paths(&op),
            vec![vec![], vec![1], vec![1, 0], vec![1, 0, 0]]
        );
    }

    #[test]
    fn test_move_node_marks_both_parents() {
        let op = Operation::MoveNode {
            path: vec![1, 0],
            new_path: vec![0, 1],
        };
        assert_eq!(
            dirty_paths(&op),
            vec![vec![], vec![1], vec![], vec![0], vec![0, 1]]
        );
    }

    #[test]
    fn test_update_rebases_existing_entries() {
        let mut dirty = DirtyPaths::default();
        dirty.push(vec![2, 0]);
        dirty.update(&Operation::SplitNode {
            path: vec![0],
            position: 1,
            properties: Properties::new(),
        });
        assert!(dirty.contains(&[3, 0]));
        assert!(!dirty.contains(&[2, 0]));
        assert!(dirty.contains(&[1]));
        assert!(dirty.contains(&[0]));
        assert!(dirty.contains(&[]));
    }
}
