//! Editor-owned side index from stable node keys to tree position.
//!
//! Every element and text carries a [`NodeKey`]. The index maps each key to
//! its parent's key (`None` for children of the root) and its index among
//! its siblings, so a key can be turned back into a path without walking
//! the document. Entries are inserted and removed at the same points the
//! reducer mutates the tree.

use crate::errors::EditorResult;
use quire_model::path::{self, Path};
use quire_model::{Document, Node, NodeKey, Operation};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    parent: Option<NodeKey>,
    index: usize,
}

#[derive(Debug, Default)]
pub(crate) struct NodeIndex {
    slots: HashMap<NodeKey, Slot>,
}

impl NodeIndex {
    /// Index every node, re-keying any that collide.
    pub fn build(document: &mut Document) -> Self {
        let mut index = Self::default();
        for (i, child) in document.children.iter_mut().enumerate() {
            index.admit(child, None, i);
        }
        index
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.slots.contains_key(&key)
    }

    /// Current path of the node with `key`.
    pub fn path_of(&self, key: NodeKey) -> Option<Path> {
        let mut path = Vec::new();
        let mut current = key;
        loop {
            let slot = self.slots.get(&current)?;
            path.push(slot.index);
            match slot.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        Some(path)
    }

    /// Drop keys of nodes about to leave the tree.
    pub fn before_commit(&mut self, document: &Document, op: &Operation) {
        match op {
            Operation::RemoveNode { path: at, .. } => {
                if let Ok(node) = document.node(at) {
                    self.forget(node);
                }
            }
            Operation::MergeNode { path: at, .. } => {
                if let Ok(node) = document.node(at) {
                    self.slots.remove(&node.key());
                }
            }
            _ => {}
        }
    }

    /// Register new nodes and refresh the sibling slots `op` shifted.
    pub fn after_commit(&mut self, document: &mut Document, op: &Operation) -> EditorResult<()> {
        match op {
            Operation::InsertNode { path: at, .. } => {
                let parent = path::parent(at)?;
                let index = at.last().copied().unwrap_or_default();
                let parent_key = parent_key(document, &parent);
                let node = document.node_mut(at)?;
                self.admit(node, parent_key, index);
                self.reindex_children(document, &parent)?;
            }
            Operation::RemoveNode { path: at, .. } => {
                self.reindex_children(document, &path::parent(at)?)?;
            }
            Operation::SplitNode { path: at, .. } => {
                self.reindex_children(document, &path::parent(at)?)?;
                self.reindex_children(document, &path::next(at)?)?;
            }
            Operation::MergeNode { path: at, .. } => {
                let previous = path::previous(at)?;
                self.reindex_children(document, &path::parent(at)?)?;
                self.reindex_children(document, &previous)?;
            }
            Operation::MoveNode { path: from, .. } => {
                let old_parent = path::parent(from)?;
                let new_path = path::transform(from, op, None).unwrap_or_else(|| from.clone());
                let old_parent = path::transform(&old_parent, op, None).unwrap_or(old_parent);
                self.reindex_children(document, &old_parent)?;
                self.reindex_children(document, &path::parent(&new_path)?)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn admit(&mut self, node: &mut Node, parent: Option<NodeKey>, index: usize) {
        if self.slots.contains_key(&node.key()) {
            node.set_key(NodeKey::next());
        }
        let key = node.key();
        self.slots.insert(key, Slot { parent, index });
        if let Some(children) = node.children_mut() {
            for (i, child) in children.iter_mut().enumerate() {
                self.admit(child, Some(key), i);
            }
        }
    }

    fn forget(&mut self, node: &Node) {
        self.slots.remove(&node.key());
        for child in node.children().unwrap_or(&[]) {
            self.forget(child);
        }
    }

    fn reindex_children(&mut self, document: &Document, parent: &[usize]) -> EditorResult<()> {
        let node = document.get(parent)?;
        let parent_key = node.key();
        for (index, child) in node.children().unwrap_or(&[]).iter().enumerate() {
            self.slots.insert(
                child.key(),
                Slot {
                    parent: parent_key,
                    index,
                },
            );
        }
        Ok(())
    }
}

fn parent_key(document: &Document, parent: &[usize]) -> Option<NodeKey> {
    document.get_if(parent).and_then(|node| node.key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::Text;

    #[test]
    fn test_build_rekeys_duplicates() {
        let text = Text::new("a");
        let mut document = Document::new(vec![Node::element(vec![
            Node::Text(text.clone()),
            Node::Text(text),
        ])]);
        let index = NodeIndex::build(&mut document);

        let children = document.children[0].children().unwrap();
        assert_ne!(children[0].key(), children[1].key());
        assert_eq!(index.len(), 3);
        assert_eq!(index.path_of(children[1].key()), Some(vec![0, 1]));
    }

    #[test]
    fn test_remove_forgets_subtree() {
        let mut document = Document::new(vec![
            Node::element(vec![Node::text("a")]),
            Node::element(vec![Node::text("b")]),
        ]);
        let mut index = NodeIndex::build(&mut document);
        let removed = document.children[0].clone();
        let survivor = document.children[1].key();

        let op = Operation::RemoveNode {
            path: vec![0],
            node: removed.clone(),
        };
        index.before_commit(&document, &op);
        document.children.remove(0);
        index.after_commit(&mut document, &op).unwrap();

        assert!(!index.contains(removed.key()));
        assert_eq!(index.path_of(survivor), Some(vec![0]));
        assert_eq!(index.len(), 2);
    }
}
