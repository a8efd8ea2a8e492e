//! Read-only queries over the editor's document and selection.
//!
//! Every query that takes a [`Location`] resolves it against the committed
//! tree. Entry queries return `(node, path)` pairs borrowed from the
//! document, so results must be dropped before the next mutation.

use crate::editor::Editor;
use crate::errors::{EditorError, EditorResult};
use crate::location::{Edge, Location, Mode, NodeMatch, NodeQuery, StepOptions};
use quire_model::path;
use quire_model::{Element, Entry, Node, NodeRef, NodesOptions, Path, Point, Properties, Range, Text};
use quire_model::text::slice_chars;

impl Editor {
    /// `at`, or the selection when absent.
    pub(crate) fn resolve_at(&self, at: Option<&Location>) -> Option<Location> {
        at.cloned()
            .or_else(|| self.selection().cloned().map(Location::Range))
    }

    pub fn path(&self, at: impl Into<Location>) -> EditorResult<Path> {
        self.path_with(at, None, None)
    }

    /// Path of a location. A range resolves to the common ancestor of its
    /// edges unless an edge is requested; `depth` truncates the result.
    pub fn path_with(
        &self,
        at: impl Into<Location>,
        edge: Option<Edge>,
        depth: Option<usize>,
    ) -> EditorResult<Path> {
        let mut resolved = match at.into() {
            Location::Path(p) => match edge {
                Some(Edge::Start) => self.document().first(&p)?.1,
                Some(Edge::End) => self.document().last(&p)?.1,
                None => p,
            },
            Location::Range(range) => match edge {
                Some(Edge::Start) => range.start().path,
                Some(Edge::End) => range.end().path,
                None => path::common(&range.anchor.path, &range.focus.path),
            },
            Location::Point(point) => point.path,
        };
        if let Some(depth) = depth {
            resolved.truncate(depth);
        }
        Ok(resolved)
    }

    pub fn node(&self, at: impl Into<Location>) -> EditorResult<Entry<'_>> {
        let path = self.path(at)?;
        let node = self.document().get(&path)?;
        Ok((node, path))
    }

    pub fn node_if(&self, at: impl Into<Location>) -> Option<Entry<'_>> {
        self.node(at).ok()
    }

    /// The start or end point of a location. A path must lead down to a
    /// text leaf on the requested side.
    pub fn point(&self, at: impl Into<Location>, edge: Edge) -> EditorResult<Point> {
        match at.into() {
            Location::Path(p) => {
                let (node, leaf) = match edge {
                    Edge::Start => self.document().first(&p)?,
                    Edge::End => self.document().last(&p)?,
                };
                let Some(text) = node.as_text() else {
                    return Err(EditorError::unresolved(&p));
                };
                let offset = match edge {
                    Edge::Start => 0,
                    Edge::End => text.char_len(),
                };
                Ok(Point::new(leaf, offset))
            }
            Location::Range(range) => Ok(match edge {
                Edge::Start => range.start(),
                Edge::End => range.end(),
            }),
            Location::Point(point) => Ok(point),
        }
    }

    pub fn point_if(&self, at: impl Into<Location>, edge: Edge) -> Option<Point> {
        self.point(at, edge).ok()
    }

    pub fn start(&self, at: impl Into<Location>) -> EditorResult<Point> {
        self.point(at, Edge::Start)
    }

    pub fn end(&self, at: impl Into<Location>) -> EditorResult<Point> {
        self.point(at, Edge::End)
    }

    pub fn edges(&self, at: impl Into<Location>) -> EditorResult<(Point, Point)> {
        let at = at.into();
        Ok((self.start(at.clone())?, self.end(at)?))
    }

    /// A range spanning from the start of `at` to the end of `to` (or of
    /// `at` itself).
    pub fn range(&self, at: impl Into<Location>, to: Option<Location>) -> EditorResult<Range> {
        let at = at.into();
        if let (Location::Range(range), None) = (&at, &to) {
            return Ok(range.clone());
        }
        let start = self.start(at.clone())?;
        let end = self.end(to.unwrap_or(at))?;
        Ok(Range::new(start, end))
    }

    pub fn first(&self, at: impl Into<Location>) -> EditorResult<Entry<'_>> {
        let path = self.path_with(at, Some(Edge::Start), None)?;
        self.node(path)
    }

    pub fn last(&self, at: impl Into<Location>) -> EditorResult<Entry<'_>> {
        let path = self.path_with(at, Some(Edge::End), None)?;
        self.node(path)
    }

    pub fn leaf(&self, at: impl Into<Location>, edge: Option<Edge>) -> EditorResult<(&Text, Path)> {
        let path = self.path_with(at, edge, None)?;
        let text = self.document().leaf(&path)?;
        Ok((text, path))
    }

    pub fn parent(&self, at: impl Into<Location>, edge: Option<Edge>) -> EditorResult<Entry<'_>> {
        let path = self.path_with(at, edge, None)?;
        let parent = path::parent(&path)?;
        self.node(parent)
    }

    /// Matching entries from the root down to `at`. Descent stops at the
    /// first void element unless `voids` is set.
    pub fn levels(&self, query: &NodeQuery) -> EditorResult<Vec<Entry<'_>>> {
        let Some(at) = self.resolve_at(query.at.as_ref()) else {
            return Ok(Vec::new());
        };
        let target = self.path(at)?;
        let mut levels = Vec::new();
        for (node, p) in self.document().levels(&target, false)? {
            if !query.matching.matches(self, node, &p) {
                continue;
            }
            let void = !query.voids && node.as_element().is_some_and(|e| self.is_void(e));
            levels.push((node, p));
            if void {
                break;
            }
        }
        if query.reverse {
            levels.reverse();
        }
        Ok(levels)
    }

    /// The closest matching element above `at` (or the highest one when
    /// `mode` is [`Mode::Highest`]). Texts and `at` itself never match.
    pub fn above(&self, query: &NodeQuery) -> EditorResult<Option<Entry<'_>>> {
        let Some(at) = self.resolve_at(query.at.as_ref()) else {
            return Ok(None);
        };
        let target = self.path(at)?;
        let reverse = query.mode.unwrap_or(Mode::Lowest) == Mode::Lowest;
        let levels = self.levels(&NodeQuery {
            at: Some(Location::Path(target.clone())),
            reverse,
            ..query.clone()
        })?;
        Ok(levels
            .into_iter()
            .find(|(node, p)| !node.is_text() && *p != target))
    }

    pub fn void_above(&self, query: &NodeQuery) -> EditorResult<Option<Entry<'_>>> {
        self.above(&NodeQuery {
            matching: NodeMatch::Void,
            ..query.clone()
        })
    }

    /// Matching entries across a location, in document order (or reverse).
    ///
    /// With [`Mode::Highest`] only the outermost match of each branch is
    /// kept, with [`Mode::Lowest`] only the innermost. `universal` requires
    /// every text branch in the span to contain a match and otherwise yields
    /// nothing.
    pub fn nodes(&self, query: &NodeQuery) -> EditorResult<Vec<Entry<'_>>> {
        let (from, to) = match &query.span {
            Some((from, to)) => (from.clone(), to.clone()),
            None => {
                let Some(at) = self.resolve_at(query.at.as_ref()) else {
                    return Ok(Vec::new());
                };
                let first = self.path_with(at.clone(), Some(Edge::Start), None)?;
                let last = self.path_with(at, Some(Edge::End), None)?;
                if query.reverse {
                    (last, first)
                } else {
                    (first, last)
                }
            }
        };

        let mode = query.mode.unwrap_or(Mode::All);
        let pass: Option<quire_model::NodePredicate<'_>> = if query.voids {
            None
        } else {
            Some(Box::new(move |node: NodeRef<'_>, _: &[usize]| {
                node.as_element().is_some_and(|e| self.is_void(e))
            }))
        };
        let walk = self.document().nodes(NodesOptions {
            from: Some(from),
            to: Some(to),
            reverse: query.reverse,
            pass,
        });

        let mut matches = Vec::new();
        let mut hit: Option<Entry<'_>> = None;
        for (node, p) in walk {
            let is_lower = hit
                .as_ref()
                .is_some_and(|(_, hit_path)| path::is_ancestor(hit_path, &p));

            if mode == Mode::Highest && is_lower {
                continue;
            }

            if !query.matching.matches(self, node, &p) {
                if query.universal && !is_lower && node.is_text() {
                    return Ok(Vec::new());
                }
                continue;
            }

            if mode == Mode::Lowest && is_lower {
                hit = Some((node, p));
                continue;
            }

            let emit = if mode == Mode::Lowest {
                hit.take()
            } else {
                Some((node, p.clone()))
            };
            matches.extend(emit);
            hit = Some((node, p));
        }

        if mode == Mode::Lowest {
            matches.extend(hit);
        }
        Ok(matches)
    }

    /// Default predicate for sibling stepping: the children of the parent
    /// of a path target. Anything else keeps the query's predicate.
    fn sibling_match(&self, at: &Location, matching: &NodeMatch) -> EditorResult<NodeMatch> {
        match (at, matching) {
            (Location::Path(p), NodeMatch::Any) => {
                let (parent, _) = self.parent(p.clone(), None)?;
                let keys = parent
                    .children()
                    .unwrap_or(&[])
                    .iter()
                    .map(Node::key)
                    .collect();
                Ok(NodeMatch::Keys(keys))
            }
            _ => Ok(matching.clone()),
        }
    }

    /// The first matching entry after `at`. With a path target and no
    /// predicate, only siblings of `at` match.
    pub fn next(&self, query: &NodeQuery) -> EditorResult<Option<Entry<'_>>> {
        let Some(at) = self.resolve_at(query.at.as_ref()) else {
            return Ok(None);
        };
        if at.as_path().is_some_and(|p| p.is_empty()) {
            return Err(EditorError::invalid("the root node has no next node"));
        }
        let Some(from) = self.after(at.clone(), StepOptions::default().voids(query.voids))? else {
            return Ok(None);
        };
        let (_, to) = self.last(Location::root())?;
        let matching = self.sibling_match(&at, &query.matching)?;
        let found = self.nodes(&NodeQuery {
            at: None,
            span: Some((from.path, to)),
            matching,
            mode: Some(query.mode.unwrap_or(Mode::Lowest)),
            reverse: false,
            ..query.clone()
        })?;
        Ok(found.into_iter().next())
    }

    /// The first matching entry before `at`, searching backward.
    pub fn previous(&self, query: &NodeQuery) -> EditorResult<Option<Entry<'_>>> {
        let Some(at) = self.resolve_at(query.at.as_ref()) else {
            return Ok(None);
        };
        if at.as_path().is_some_and(|p| p.is_empty()) {
            return Err(EditorError::invalid("the root node has no previous node"));
        }
        let Some(from) = self.before(at.clone(), StepOptions::default().voids(query.voids))? else {
            return Ok(None);
        };
        let (_, to) = self.first(Location::root())?;
        let matching = self.sibling_match(&at, &query.matching)?;
        let found = self.nodes(&NodeQuery {
            at: None,
            span: Some((from.path, to)),
            matching,
            mode: Some(query.mode.unwrap_or(Mode::Lowest)),
            reverse: true,
            ..query.clone()
        })?;
        Ok(found.into_iter().next())
    }

    /// The point `distance` positions before `at`. Stops at the start of
    /// the document.
    pub fn before(&self, at: impl Into<Location>, options: StepOptions) -> EditorResult<Option<Point>> {
        let focus = self.start(at)?;
        let anchor = self.start(Location::root())?;
        let range = Range::new(anchor, focus);
        let positions = self.positions(
            Some(Location::Range(range)),
            StepOptions {
                reverse: true,
                ..options
            },
        )?;
        Ok(step(positions, options.distance))
    }

    /// The point `distance` positions after `at`. Stops at the end of the
    /// document.
    pub fn after(&self, at: impl Into<Location>, options: StepOptions) -> EditorResult<Option<Point>> {
        let anchor = self.end(at)?;
        let focus = self.end(Location::root())?;
        let range = Range::new(anchor, focus);
        let positions = self.positions(
            Some(Location::Range(range)),
            StepOptions {
                reverse: false,
                ..options
            },
        )?;
        Ok(step(positions, options.distance))
    }

    /// Concatenated text across a location. Void contents are skipped
    /// unless `voids` is set.
    pub fn string(&self, at: impl Into<Location>, voids: bool) -> EditorResult<String> {
        let range = self.range(at, None)?;
        let (start, end) = range.edges();
        let query = NodeQuery::new()
            .at(range)
            .matching(NodeMatch::Text)
            .voids(voids);

        let mut out = String::new();
        for (node, p) in self.nodes(&query)? {
            let Some(text) = node.as_text() else {
                continue;
            };
            let mut piece = text.text.as_str();
            if p == end.path {
                piece = slice_chars(piece, 0, end.offset);
            }
            if p == start.path {
                piece = slice_chars(piece, start.offset, usize::MAX);
            }
            out.push_str(piece);
        }
        Ok(out)
    }

    /// Copy of the nodes covered by `at`, trimmed to its edges.
    pub fn fragment(&self, at: impl Into<Location>) -> EditorResult<Vec<Node>> {
        let range = self.range(at, None)?;
        Ok(self.document().fragment(&range)?)
    }

    /// Marks that text typed now would receive: the cursor marks if set,
    /// else the marks of the leaf under the selection.
    pub fn marks(&self) -> EditorResult<Option<Properties>> {
        let Some(selection) = self.selection() else {
            return Ok(None);
        };
        if let Some(marks) = self.cursor_marks() {
            return Ok(Some(marks.clone()));
        }

        if selection.is_expanded() {
            let texts = self.nodes(&NodeQuery::new().matching(NodeMatch::Text))?;
            let marks = texts
                .into_iter()
                .find_map(|(node, _)| node.as_text())
                .map(|text| text.marks.clone())
                .unwrap_or_default();
            return Ok(Some(marks));
        }

        let anchor = selection.anchor.clone();
        let (leaf, _) = self.leaf(anchor.path.clone(), None)?;
        let mut marks = leaf.marks.clone();

        // At the start of a leaf, continue the previous leaf's formatting
        // as long as it belongs to the same block.
        if anchor.offset == 0 {
            let prev = self.previous(
                &NodeQuery::new()
                    .at(anchor.path.clone())
                    .matching(NodeMatch::Text),
            )?;
            let block = self.above(
                &NodeQuery::new()
                    .at(anchor.path)
                    .matching(NodeMatch::Block),
            )?;
            if let (Some((prev_node, prev_path)), Some((_, block_path))) = (prev, block) {
                if path::is_ancestor(&block_path, &prev_path) {
                    if let Some(text) = prev_node.as_text() {
                        marks = text.marks.clone();
                    }
                }
            }
        }
        Ok(Some(marks))
    }

    /// Pull the end of a range that hangs at offset 0 of the next block back
    /// to the end of the last non-empty text before it.
    pub fn unhang_range(&self, range: &Range, voids: bool) -> EditorResult<Range> {
        let (start, mut end) = range.edges();
        if start.offset != 0 || end.offset != 0 || range.is_collapsed() {
            return Ok(range.clone());
        }

        let block_path = self
            .above(
                &NodeQuery::new()
                    .at(end.clone())
                    .matching(NodeMatch::Block),
            )?
            .map(|(_, p)| p)
            .unwrap_or_default();
        let before = Range::new(self.start(Location::root())?, end.clone());
        let texts = self.nodes(
            &NodeQuery::new()
                .at(before)
                .matching(NodeMatch::Text)
                .reverse(true)
                .voids(voids),
        )?;

        for (node, p) in texts.into_iter().skip(1) {
            let Some(text) = node.as_text() else {
                continue;
            };
            if !text.text.is_empty() || path::is_before(&p, &block_path) {
                end = Point::new(p, text.char_len());
                break;
            }
        }
        Ok(Range::new(start, end))
    }

    /// No children, or a single empty text in a non-void element.
    pub fn is_empty(&self, element: &Element) -> bool {
        match element.children.as_slice() {
            [] => true,
            [Node::Text(text)] => text.text.is_empty() && !self.is_void(element),
            _ => false,
        }
    }

    pub fn is_start(&self, point: &Point, at: impl Into<Location>) -> EditorResult<bool> {
        if point.offset != 0 {
            return Ok(false);
        }
        Ok(*point == self.start(at)?)
    }

    pub fn is_end(&self, point: &Point, at: impl Into<Location>) -> EditorResult<bool> {
        Ok(*point == self.end(at)?)
    }

    pub fn is_edge(&self, point: &Point, at: impl Into<Location>) -> EditorResult<bool> {
        let at = at.into();
        Ok(self.is_start(point, at.clone())? || self.is_end(point, at)?)
    }

    pub fn has_blocks(&self, element: &Element) -> bool {
        element
            .children
            .iter()
            .any(|n| n.as_element().is_some_and(|e| self.is_block(e)))
    }

    pub fn has_inlines(&self, element: &Element) -> bool {
        element
            .children
            .iter()
            .any(|n| n.is_text() || n.as_element().is_some_and(|e| self.is_inline(e)))
    }

    pub fn has_texts(&self, element: &Element) -> bool {
        element.children.iter().all(Node::is_text)
    }
}

/// The position `distance` steps along, or the furthest one reachable.
fn step(positions: Vec<Point>, distance: usize) -> Option<Point> {
    positions.into_iter().take(distance + 1).skip(1).last()
}
