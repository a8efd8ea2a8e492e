//! Pre-order traversal over a document.
//!
//! [`Nodes`] walks the tree depth-first, yielding `(node, path)` pairs.
//! Iterators borrow the document, so they always see a stable snapshot.

use crate::node::{Document, NodeRef};
use crate::path::{self, Path};

/// Predicate over a visited node.
pub type NodePredicate<'a> = Box<dyn Fn(NodeRef<'a>, &[usize]) -> bool + 'a>;

/// Bounds and direction for [`Nodes`].
#[derive(Default)]
pub struct NodesOptions<'a> {
    /// Start descending toward this path. Defaults to the first (or last,
    /// when reversed) node.
    pub from: Option<Path>,
    /// Stop once traversal passes this path.
    pub to: Option<Path>,
    pub reverse: bool,
    /// Nodes for which this returns `true` are yielded but not descended into.
    pub pass: Option<NodePredicate<'a>>,
}

pub struct Nodes<'a> {
    root: &'a Document,
    path: Path,
    from: Path,
    to: Option<Path>,
    reverse: bool,
    pass: Option<NodePredicate<'a>>,
    /// The current path was reached by climbing out of its children.
    ascended: bool,
    yielded: bool,
    done: bool,
}

impl<'a> Nodes<'a> {
    pub fn new(root: &'a Document, options: NodesOptions<'a>) -> Self {
        Self {
            root,
            path: Vec::new(),
            from: options.from.unwrap_or_default(),
            to: options.to,
            reverse: options.reverse,
            pass: options.pass,
            ascended: false,
            yielded: false,
            done: false,
        }
    }

    fn past_end(&self) -> bool {
        match &self.to {
            Some(to) if self.reverse => path::is_before(&self.path, to),
            Some(to) => path::is_after(&self.path, to),
            None => false,
        }
    }

    fn enter(&mut self, path: Path) {
        self.path = path;
        self.ascended = false;
        self.yielded = false;
    }
}

impl<'a> Iterator for Nodes<'a> {
    type Item = (NodeRef<'a>, Path);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            let Some(node) = self.root.get_if(&self.path) else {
                self.done = true;
                return None;
            };

            if self.past_end() {
                self.done = true;
                return None;
            }

            if !self.ascended && !self.yielded {
                self.yielded = true;
                return Some((node, self.path.clone()));
            }

            if !self.ascended {
                let passed = self
                    .pass
                    .as_ref()
                    .map(|pass| pass(node, &self.path))
                    .unwrap_or(false);
                if let Some(children) = node.children() {
                    if !children.is_empty() && !passed {
                        let index = if path::is_ancestor(&self.path, &self.from) {
                            self.from[self.path.len()]
                        } else if self.reverse {
                            children.len() - 1
                        } else {
                            0
                        };
                        let mut child = self.path.clone();
                        child.push(index);
                        self.enter(child);
                        continue;
                    }
                }
            }

            let Some(depth) = self.path.len().checked_sub(1) else {
                self.done = true;
                return None;
            };
            let last = self.path[depth];

            if !self.reverse {
                let mut sibling = self.path.clone();
                sibling[depth] = last + 1;
                if self.root.has(&sibling) {
                    self.enter(sibling);
                    continue;
                }
            } else if last > 0 {
                let mut sibling = self.path.clone();
                sibling[depth] = last - 1;
                self.enter(sibling);
                continue;
            }

            self.path.pop();
            self.ascended = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, Text};

    fn doc() -> Document {
        Document::new(vec![
            Node::element(vec![Node::text("a"), Node::text("b")]),
            Node::element(vec![Node::element(vec![Node::text("c")])]),
            Node::text("d"),
        ])
    }

    #[test]
    fn test_pre_order() {
        let doc = doc();
        let all: Vec<Path> = Nodes::new(&doc, NodesOptions::default())
            .map(|(_, p)| p)
            .collect();
        assert_eq!(
            all,
            vec![
                vec![],
                vec![0],
                vec![0, 0],
                vec![0, 1],
                vec![1],
                vec![1, 0],
                vec![1, 0, 0],
                vec![2],
            ]
        );
    }

    #[test]
    fn test_reverse_from_to() {
        let doc = doc();
        let found: Vec<Path> = Nodes::new(
            &doc,
            NodesOptions {
                from: Some(vec![1, 0, 0]),
                to: Some(vec![0, 1]),
                reverse: true,
                pass: None,
            },
        )
        .map(|(_, p)| p)
        .collect();
        assert_eq!(
            found,
            vec![vec![], vec![1], vec![1, 0], vec![1, 0, 0], vec![0], vec![0, 1]]
        );
    }

    #[test]
    fn test_bounded_forward() {
        let doc = doc();
        let found: Vec<Path> = Nodes::new(
            &doc,
            NodesOptions {
                from: Some(vec![0, 1]),
                to: Some(vec![1, 0]),
                ..Default::default()
            },
        )
        .map(|(_, p)| p)
        .collect();
        assert_eq!(
            found,
            vec![vec![], vec![0], vec![0, 1], vec![1], vec![1, 0], vec![1, 0, 0]]
        );
    }

    #[test]
    fn test_pass_skips_children() {
        let doc = doc();
        let found: Vec<Path> = Nodes::new(
            &doc,
            NodesOptions {
                pass: Some(Box::new(|node, _| node.is_element())),
                ..Default::default()
            },
        )
        .map(|(_, p)| p)
        .collect();
        assert_eq!(found, vec![vec![], vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_texts_only() {
        let doc = doc();
        let texts: Vec<&Text> = Nodes::new(&doc, NodesOptions::default())
            .filter_map(|(n, _)| n.as_text())
            .collect();
        let joined: String = texts.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, "abcd");
    }
}
