//! Read and write access to a [`Document`] by path.
//!
//! Read accessors come in a fallible form returning [`ModelResult`] and,
//! where it is useful to callers, an `Option` form suffixed `_if`.

use crate::error::{ModelError, ModelResult};
use crate::node::{Document, Element, Node, NodeRef, Text};
use crate::path::{self, Path};
use crate::range::Range;
use crate::text::slice_chars;
use crate::traversal::{Nodes, NodesOptions};

pub type Entry<'a> = (NodeRef<'a>, Path);

impl Document {
    pub fn get(&self, path: &[usize]) -> ModelResult<NodeRef<'_>> {
        self.get_if(path).ok_or_else(|| ModelError::unresolved(path))
    }

    pub fn get_if(&self, path: &[usize]) -> Option<NodeRef<'_>> {
        let mut node = NodeRef::Root(self);
        for &index in path {
            let child = node.children()?.get(index)?;
            node = NodeRef::from_node(child);
        }
        Some(node)
    }

    pub fn has(&self, path: &[usize]) -> bool {
        self.get_if(path).is_some()
    }

    /// The descendant at `path`; fails for the root path.
    pub fn node(&self, path: &[usize]) -> ModelResult<&Node> {
        let (first, rest) = path
            .split_first()
            .ok_or_else(|| ModelError::root_path("node"))?;
        let mut node = self
            .children
            .get(*first)
            .ok_or_else(|| ModelError::unresolved(path))?;
        for &index in rest {
            node = node
                .children()
                .and_then(|children| children.get(index))
                .ok_or_else(|| ModelError::unresolved(path))?;
        }
        Ok(node)
    }

    /// The node at `path`, which must be the root or an element.
    pub fn ancestor(&self, path: &[usize]) -> ModelResult<NodeRef<'_>> {
        let node = self.get(path)?;
        if node.is_text() {
            return Err(ModelError::not_ancestor(path));
        }
        Ok(node)
    }

    pub fn element(&self, path: &[usize]) -> ModelResult<&Element> {
        self.get(path)?
            .as_element()
            .ok_or_else(|| ModelError::invalid_operation(format!("no element at {path:?}")))
    }

    /// Child `index` of the ancestor at `path`.
    pub fn child(&self, path: &[usize], index: usize) -> ModelResult<NodeRef<'_>> {
        let parent = self.ancestor(path)?;
        parent
            .children()
            .and_then(|children| children.get(index))
            .map(NodeRef::from_node)
            .ok_or_else(|| {
                let mut at = path.to_vec();
                at.push(index);
                ModelError::unresolved(&at)
            })
    }

    pub fn parent(&self, path: &[usize]) -> ModelResult<NodeRef<'_>> {
        let parent_path = path::parent(path)?;
        self.ancestor(&parent_path)
    }

    /// The text leaf at `path`.
    pub fn leaf(&self, path: &[usize]) -> ModelResult<&Text> {
        self.get(path)?
            .as_text()
            .ok_or_else(|| ModelError::not_text(path))
    }

    /// Descend through first children until a leaf or an empty element.
    pub fn first(&self, path: &[usize]) -> ModelResult<Entry<'_>> {
        self.descend(path, |_| 0)
    }

    /// Descend through last children until a leaf or an empty element.
    pub fn last(&self, path: &[usize]) -> ModelResult<Entry<'_>> {
        self.descend(path, |len| len - 1)
    }

    fn descend(&self, path: &[usize], pick: impl Fn(usize) -> usize) -> ModelResult<Entry<'_>> {
        let mut node = self.get(path)?;
        let mut at = path.to_vec();
        while let Some(children) = node.children() {
            if children.is_empty() {
                break;
            }
            let index = pick(children.len());
            at.push(index);
            node = NodeRef::from_node(&children[index]);
        }
        Ok((node, at))
    }

    /// Every ancestor of `path`, root first unless `reverse`.
    pub fn ancestors(&self, path: &[usize], reverse: bool) -> ModelResult<Vec<Entry<'_>>> {
        path::ancestors(path, reverse)
            .into_iter()
            .map(|p| self.ancestor(&p).map(|node| (node, p)))
            .collect()
    }

    /// Every level from the root down to and including `path`.
    pub fn levels(&self, path: &[usize], reverse: bool) -> ModelResult<Vec<Entry<'_>>> {
        path::levels(path, reverse)
            .into_iter()
            .map(|p| self.get(&p).map(|node| (node, p)))
            .collect()
    }

    /// The direct children of the ancestor at `path`.
    pub fn children_of(&self, path: &[usize], reverse: bool) -> ModelResult<Vec<Entry<'_>>> {
        let parent = self.ancestor(path)?;
        let children = parent.children().unwrap_or(&[]);
        let mut entries: Vec<Entry<'_>> = children
            .iter()
            .enumerate()
            .map(|(i, child)| {
                let mut p = path.to_vec();
                p.push(i);
                (NodeRef::from_node(child), p)
            })
            .collect();
        if reverse {
            entries.reverse();
        }
        Ok(entries)
    }

    /// The deepest node that is an ancestor of (or equal to) both paths.
    pub fn common(&self, path: &[usize], another: &[usize]) -> ModelResult<Entry<'_>> {
        let p = path::common(path, another);
        Ok((self.get(&p)?, p))
    }

    /// Concatenated text under `path`.
    pub fn string(&self, path: &[usize]) -> ModelResult<String> {
        Ok(self.get(path)?.string())
    }

    pub fn nodes<'a>(&'a self, options: NodesOptions<'a>) -> Nodes<'a> {
        Nodes::new(self, options)
    }

    /// Every node except the root.
    pub fn descendants<'a>(&'a self, options: NodesOptions<'a>) -> impl Iterator<Item = Entry<'a>> + 'a {
        self.nodes(options).filter(|(_, p)| !p.is_empty())
    }

    pub fn elements<'a>(
        &'a self,
        options: NodesOptions<'a>,
    ) -> impl Iterator<Item = (&'a Element, Path)> + 'a {
        self.nodes(options)
            .filter_map(|(n, p)| n.as_element().map(|e| (e, p)))
    }

    pub fn texts<'a>(&'a self, options: NodesOptions<'a>) -> impl Iterator<Item = (&'a Text, Path)> + 'a {
        self.nodes(options)
            .filter_map(|(n, p)| n.as_text().map(|t| (t, p)))
    }

    /// A copy of the content covered by `range`, with nodes outside the
    /// range dropped and the boundary leaves sliced to the range offsets.
    pub fn fragment(&self, range: &Range) -> ModelResult<Vec<Node>> {
        let (start, end) = range.edges();
        let visited: Vec<Path> = self
            .nodes(NodesOptions {
                reverse: true,
                pass: Some(Box::new(|_, p| !range.includes_path(p))),
                ..Default::default()
            })
            .map(|(_, p)| p)
            .collect();

        let mut copy = self.clone();
        for p in visited {
            if !range.includes_path(&p) {
                if let Some((index, parent)) = p.split_last() {
                    copy.children_mut(parent)?.remove(*index);
                }
                continue;
            }
            if p == end.path {
                let leaf = copy.text_mut(&p)?;
                leaf.text = slice_chars(&leaf.text, 0, end.offset).to_string();
            }
            if p == start.path {
                let leaf = copy.text_mut(&p)?;
                leaf.text = slice_chars(&leaf.text, start.offset, usize::MAX).to_string();
            }
        }

        Ok(copy.children)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> ModelResult<&mut Node> {
        let (first, rest) = path
            .split_first()
            .ok_or_else(|| ModelError::root_path("node"))?;
        let mut node = self
            .children
            .get_mut(*first)
            .ok_or_else(|| ModelError::unresolved(path))?;
        for &index in rest {
            node = node
                .children_mut()
                .and_then(|children| children.get_mut(index))
                .ok_or_else(|| ModelError::unresolved(path))?;
        }
        Ok(node)
    }

    /// Child list of the root or the element at `path`.
    pub fn children_mut(&mut self, path: &[usize]) -> ModelResult<&mut Vec<Node>> {
        if path.is_empty() {
            return Ok(&mut self.children);
        }
        self.node_mut(path)?
            .children_mut()
            .ok_or_else(|| ModelError::not_ancestor(path))
    }

    pub fn text_mut(&mut self, path: &[usize]) -> ModelResult<&mut Text> {
        match self.node_mut(path)? {
            Node::Text(text) => Ok(text),
            Node::Element(_) => Err(ModelError::not_text(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;
    use serde_json::json;

    fn doc() -> Document {
        serde_json::from_value(json!({
            "children": [
                { "type": "p", "children": [{ "text": "one" }, { "text": "two" }] },
                { "type": "p", "children": [{ "text": "three" }] },
                { "type": "p", "children": [{ "text": "four" }] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_get_and_has() {
        let doc = doc();
        assert!(doc.get(&[]).unwrap().is_root());
        assert_eq!(doc.leaf(&[0, 1]).unwrap().text, "two");
        assert!(doc.has(&[2, 0]));
        assert!(!doc.has(&[2, 1]));
        assert!(matches!(
            doc.get(&[0, 1, 0]),
            Err(ModelError::UnresolvedPath { .. })
        ));
        assert!(matches!(doc.leaf(&[0]), Err(ModelError::NotText { .. })));
    }

    #[test]
    fn test_parent_and_child() {
        let doc = doc();
        let parent = doc.parent(&[1, 0]).unwrap();
        assert_eq!(parent.as_element().unwrap().property("type"), Some(&json!("p")));
        assert!(doc.parent(&[]).is_err());
        assert_eq!(doc.child(&[0], 1).unwrap().string(), "two");
        assert!(doc.child(&[0, 0], 0).is_err());
    }

    #[test]
    fn test_first_and_last_descend_to_leaves() {
        let doc = doc();
        assert_eq!(doc.first(&[]).unwrap().1, vec![0, 0]);
        assert_eq!(doc.last(&[]).unwrap().1, vec![2, 0]);
        assert_eq!(doc.last(&[0]).unwrap().1, vec![0, 1]);
    }

    #[test]
    fn test_levels_include_root_and_target() {
        let doc = doc();
        let levels: Vec<Path> = doc.levels(&[0, 1], false).unwrap().into_iter().map(|e| e.1).collect();
        assert_eq!(levels, vec![vec![], vec![0], vec![0, 1]]);
        let ancestors: Vec<Path> = doc
            .ancestors(&[0, 1], true)
            .unwrap()
            .into_iter()
            .map(|e| e.1)
            .collect();
        assert_eq!(ancestors, vec![vec![0], vec![]]);
    }

    #[test]
    fn test_fragment_slices_boundary_leaves() {
        let doc = doc();
        let range = Range::new(Point::new(vec![0, 1], 1), Point::new(vec![1, 0], 3));
        let fragment = doc.fragment(&range).unwrap();

        assert_eq!(
            serde_json::to_value(&fragment).unwrap(),
            json!([
                { "type": "p", "children": [{ "text": "wo" }] },
                { "type": "p", "children": [{ "text": "thr" }] }
            ])
        );
    }

    #[test]
    fn test_fragment_within_one_leaf() {
        let doc = doc();
        let range = Range::new(Point::new(vec![1, 0], 4), Point::new(vec![1, 0], 1));
        let fragment = doc.fragment(&range).unwrap();
        assert_eq!(
            serde_json::to_value(&fragment).unwrap(),
            json!([{ "type": "p", "children": [{ "text": "hre" }] }])
        );
    }

    #[test]
    fn test_texts_and_elements() {
        let doc = doc();
        let texts: Vec<String> = doc.texts(NodesOptions::default()).map(|(t, _)| t.text.clone()).collect();
        assert_eq!(texts, vec!["one", "two", "three", "four"]);
        assert_eq!(doc.elements(NodesOptions::default()).count(), 3);
        assert_eq!(doc.descendants(NodesOptions::default()).count(), 7);
        assert_eq!(doc.string(&[]).unwrap(), "onetwothreefour");
    }

    #[test]
    fn test_mutable_access() {
        let mut doc = doc();
        doc.text_mut(&[0, 0]).unwrap().text.push('!');
        doc.children_mut(&[1]).unwrap().push(Node::text("x"));
        assert_eq!(doc.string(&[0]).unwrap(), "one!two");
        assert_eq!(doc.string(&[1]).unwrap(), "threex");
        assert!(doc.children_mut(&[1, 0]).is_err());
    }
}
