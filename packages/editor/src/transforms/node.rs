//! Node transforms: structural edits composed from primitive operations.
//!
//! Each transform runs inside [`Editor::without_normalizing`], so the
//! document is normalized once after the whole edit. Transforms are not
//! atomic: if an operation fails midway, the operations already applied
//! stay applied and the error is returned.
//!
//! Targets default to the selection. A path target matches exactly the
//! node at that path; any other target matches blocks unless a predicate
//! is given.

use crate::editor::Editor;
use crate::errors::{EditorError, EditorResult};
use crate::location::{Edge, Location, Mode, NodeMatch, NodeQuery, StepOptions};
use crate::refs::PathRef;
use crate::transforms::selection;
use crate::transforms::text::{self, TextOptions};
use quire_model::path;
use quire_model::{
    Affinity, Element, Node, NodeKey, NodeRef, Operation, Path, Point, Properties, Range,
    RangeAffinity,
};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, instrument};

const FORWARD: Option<Affinity> = Some(Affinity::Forward);

/// Options shared by the node transforms. Each transform reads the fields
/// that apply to it.
#[derive(Debug, Clone, Default)]
pub struct NodeOptions {
    pub at: Option<Location>,
    pub matching: Option<NodeMatch>,
    pub mode: Option<Mode>,
    /// Destination for [`move_nodes`].
    pub to: Option<Path>,
    /// Split at the range edges before setting or wrapping.
    pub split: bool,
    /// Split even when the point sits on a node edge.
    pub always: bool,
    pub voids: bool,
    /// Leave ranges that end at offset 0 of a following block as they are.
    pub hanging: bool,
    pub select: Option<bool>,
    /// Extra levels to split above the lowest match.
    pub height: usize,
}

impl NodeOptions {
    pub fn at(at: impl Into<Location>) -> Self {
        Self {
            at: Some(at.into()),
            ..Self::default()
        }
    }

    pub fn matching(mut self, matching: NodeMatch) -> Self {
        self.matching = Some(matching);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn to(mut self, to: Path) -> Self {
        self.to = Some(to);
        self
    }

    pub fn split(mut self, split: bool) -> Self {
        self.split = split;
        self
    }

    pub fn always(mut self, always: bool) -> Self {
        self.always = always;
        self
    }

    pub fn voids(mut self, voids: bool) -> Self {
        self.voids = voids;
        self
    }

    pub fn hanging(mut self, hanging: bool) -> Self {
        self.hanging = hanging;
        self
    }

    pub fn select(mut self, select: bool) -> Self {
        self.select = Some(select);
        self
    }

    pub fn height(mut self, height: usize) -> Self {
        self.height = height;
        self
    }
}

/// Matches exactly the node now at `at`.
fn match_path(editor: &Editor, at: &[usize]) -> EditorResult<NodeMatch> {
    let (node, _) = editor.node(at.to_vec())?;
    Ok(node.key().map_or(NodeMatch::Root, NodeMatch::Key))
}

fn default_match(editor: &Editor, at: &Location) -> EditorResult<NodeMatch> {
    match at {
        Location::Path(p) => match_path(editor, p),
        _ => Ok(NodeMatch::Block),
    }
}

/// Matches the current children of `node`.
fn children_match(node: NodeRef<'_>) -> NodeMatch {
    let keys: HashSet<NodeKey> = node.children().unwrap_or(&[]).iter().map(Node::key).collect();
    NodeMatch::Keys(keys)
}

fn query(at: Location, matching: NodeMatch, mode: Mode, voids: bool) -> NodeQuery {
    NodeQuery {
        at: Some(at),
        matching,
        mode: Some(mode),
        voids,
        ..NodeQuery::default()
    }
}

fn matched_paths(editor: &Editor, query: &NodeQuery) -> EditorResult<Vec<Path>> {
    Ok(editor.nodes(query)?.into_iter().map(|(_, p)| p).collect())
}

fn track(editor: &mut Editor, paths: Vec<Path>) -> Vec<PathRef> {
    paths
        .into_iter()
        .map(|p| editor.path_ref(p, FORWARD))
        .collect()
}

/// Element properties or text marks.
fn extract_props(node: NodeRef<'_>) -> Properties {
    match node {
        NodeRef::Element(element) => element.properties.clone(),
        NodeRef::Text(text) => text.marks.clone(),
        NodeRef::Root(_) => Properties::new(),
    }
}

/// Whether `at` or any of its ancestors is a void element.
fn in_void(editor: &Editor, at: &[usize]) -> EditorResult<bool> {
    Ok(editor
        .document()
        .levels(at, false)?
        .into_iter()
        .any(|(node, _)| node.as_element().is_some_and(|e| editor.is_void(e))))
}

/// Delete an expanded range and return where its end landed.
fn delete_range(editor: &mut Editor, range: Range) -> EditorResult<Option<Point>> {
    if range.is_collapsed() {
        return Ok(Some(range.anchor));
    }
    let end = editor.point_ref(range.end(), FORWARD);
    text::delete(editor, TextOptions::at(range))?;
    Ok(end.unref(editor))
}

/// Where nodes inserted at `point` should go: after the lowest match when
/// the point is at its end, in its place otherwise, splitting as needed.
fn insertion_path(
    editor: &mut Editor,
    point: Point,
    matching: NodeMatch,
    mode: Mode,
    voids: bool,
) -> EditorResult<Option<Path>> {
    let found = matched_paths(
        editor,
        &query(Location::Path(point.path.clone()), matching.clone(), mode, voids),
    )?;
    let Some(match_path) = found.into_iter().next() else {
        return Ok(None);
    };
    let path_ref = editor.path_ref(match_path.clone(), FORWARD);
    let is_at_end = editor.is_end(&point, match_path)?;
    split_nodes(
        editor,
        NodeOptions {
            at: Some(Location::Point(point)),
            matching: Some(matching),
            mode: Some(mode),
            voids,
            ..NodeOptions::default()
        },
    )?;
    let Some(path) = path_ref.unref(editor) else {
        return Ok(None);
    };
    Ok(Some(if is_at_end { path::next(&path)? } else { path }))
}

/// Insert `nodes` at a path, or at a point after splitting down to it.
/// Without a target the nodes go at the selection (or the end of the
/// document) and the selection moves to the end of the last one.
#[instrument(skip_all, fields(count = nodes.len()))]
pub fn insert_nodes(editor: &mut Editor, nodes: Vec<Node>, options: NodeOptions) -> EditorResult<()> {
    let Some(first) = nodes.first() else {
        return Ok(());
    };
    let point_match = match first {
        Node::Text(_) => NodeMatch::Text,
        Node::Element(e) if editor.is_inline(e) => {
            NodeMatch::AnyOf(vec![NodeMatch::Text, NodeMatch::Inline])
        }
        Node::Element(_) => NodeMatch::Block,
    };

    editor.without_normalizing(|editor| {
        let mode = options.mode.unwrap_or(Mode::Lowest);
        let voids = options.voids;
        let (at, select) = match options.at.clone() {
            Some(at) => (at, options.select.unwrap_or(false)),
            None => {
                let at = if let Some(selection) = editor.selection() {
                    Location::Range(selection.clone())
                } else if !editor.children().is_empty() {
                    Location::Point(editor.end(Location::root())?)
                } else {
                    Location::Path(vec![0])
                };
                (at, true)
            }
        };
        let matching = options.matching.clone().unwrap_or(point_match);

        let target = match at {
            Location::Path(p) => p,
            Location::Point(point) => match insertion_path(editor, point, matching, mode, voids)? {
                Some(p) => p,
                None => return Ok(()),
            },
            Location::Range(range) => {
                let range = if options.hanging {
                    range
                } else {
                    editor.unhang_range(&range, voids)?
                };
                let Some(point) = delete_range(editor, range)? else {
                    return Ok(());
                };
                match insertion_path(editor, point, matching, mode, voids)? {
                    Some(p) => p,
                    None => return Ok(()),
                }
            }
        };

        let (index, parent) = target
            .split_last()
            .map(|(index, parent)| (*index, parent.to_vec()))
            .ok_or_else(|| EditorError::invalid("cannot insert nodes at the root path"))?;
        if !voids && in_void(editor, &parent)? {
            debug!(parent = ?parent, "skipping insert into void");
            return Ok(());
        }

        let mut last = target.clone();
        for (i, node) in nodes.into_iter().enumerate() {
            let mut p = parent.clone();
            p.push(index + i);
            editor.apply(Operation::InsertNode {
                path: p.clone(),
                node,
            })?;
            last = p;
        }

        if select {
            if let Some(point) = editor.point_if(last, Edge::End) {
                selection::select(editor, point)?;
            }
        }
        Ok(())
    })
}

/// Remove every matching node.
#[instrument(skip_all)]
pub fn remove_nodes(editor: &mut Editor, options: NodeOptions) -> EditorResult<()> {
    editor.without_normalizing(|editor| {
        let Some(mut at) = editor.resolve_at(options.at.as_ref()) else {
            return Ok(());
        };
        let matching = match options.matching.clone() {
            Some(m) => m,
            None => default_match(editor, &at)?,
        };
        if let (Location::Range(range), false) = (&at, options.hanging) {
            at = Location::Range(editor.unhang_range(range, options.voids)?);
        }

        let mode = options.mode.unwrap_or(Mode::Lowest);
        let paths = matched_paths(editor, &query(at, matching, mode, options.voids))?;
        for path_ref in track(editor, paths) {
            let Some(p) = path_ref.unref(editor) else {
                continue;
            };
            let node = editor.document().node(&p)?.clone();
            editor.apply(Operation::RemoveNode { path: p, node })?;
        }
        Ok(())
    })
}

/// Move every matching node to `options.to`, keeping their order.
#[instrument(skip_all, fields(to = ?options.to))]
pub fn move_nodes(editor: &mut Editor, options: NodeOptions) -> EditorResult<()> {
    let Some(to) = options.to.clone() else {
        return Err(EditorError::invalid("moving nodes requires a destination path"));
    };
    editor.without_normalizing(|editor| {
        let Some(at) = editor.resolve_at(options.at.as_ref()) else {
            return Ok(());
        };
        let matching = match options.matching.clone() {
            Some(m) => m,
            None => default_match(editor, &at)?,
        };
        let mode = options.mode.unwrap_or(Mode::Lowest);
        let to_ref = editor.path_ref(to, FORWARD);
        let paths = matched_paths(editor, &query(at, matching, mode, options.voids))?;

        for path_ref in track(editor, paths) {
            let Some(p) = path_ref.unref(editor) else {
                continue;
            };
            let Some(new_path) = to_ref.current(editor) else {
                break;
            };
            if !p.is_empty() && p != new_path {
                editor.apply(Operation::MoveNode {
                    path: p.clone(),
                    new_path: new_path.clone(),
                })?;
            }
            // Moving forward among siblings leaves the destination pointing
            // before the node just moved.
            if path::is_sibling(&new_path, &p) && path::is_after(&new_path, &p) {
                if let Some(current) = to_ref.current(editor) {
                    to_ref.set(editor, path::next(&current)?);
                }
            }
        }
        to_ref.unref(editor);
        Ok(())
    })
}

/// Whether `node` is a chain of only children ending in a text or void.
fn has_single_child_nest(editor: &Editor, node: NodeRef<'_>) -> bool {
    match node {
        NodeRef::Element(element) => {
            editor.is_void(element)
                || match element.children.as_slice() {
                    [only] => has_single_child_nest(editor, NodeRef::from_node(only)),
                    _ => false,
                }
        }
        NodeRef::Text(_) => true,
        NodeRef::Root(_) => false,
    }
}

struct MergePlan {
    path: Path,
    prev_path: Path,
    position: usize,
    properties: Properties,
    /// The previous node is empty and is removed instead of merged into.
    drop_prev: bool,
}

/// Merge the matching node into the previous matching node, moving it
/// alongside first when the two are not siblings. Ancestors left with no
/// content by the move are removed.
#[instrument(skip_all)]
pub fn merge_nodes(editor: &mut Editor, options: NodeOptions) -> EditorResult<()> {
    editor.without_normalizing(|editor| {
        let Some(mut at) = editor.resolve_at(options.at.as_ref()) else {
            return Ok(());
        };
        let voids = options.voids;
        let mode = options.mode.unwrap_or(Mode::Lowest);
        let matching = match (options.matching.clone(), &at) {
            (Some(m), _) => m,
            (None, Location::Path(p)) => {
                let (parent, _) = editor.parent(p.clone(), None)?;
                children_match(parent)
            }
            (None, _) => NodeMatch::Block,
        };

        if let Location::Range(range) = &at {
            let range = if options.hanging {
                range.clone()
            } else {
                editor.unhang_range(range, voids)?
            };
            let collapsed = range.is_collapsed();
            let Some(point) = delete_range(editor, range)? else {
                return Ok(());
            };
            if !collapsed && options.at.is_none() {
                selection::select(editor, point.clone())?;
            }
            at = Location::Point(point);
        }

        let q = query(at, matching, mode, voids);
        let plan = {
            let Some((node, p)) = editor.nodes(&q)?.into_iter().next() else {
                return Ok(());
            };
            let Some((prev, prev_path)) = editor.previous(&q)? else {
                return Ok(());
            };
            if p.is_empty() || prev_path.is_empty() {
                return Ok(());
            }
            let (position, properties) = match (node, prev) {
                (NodeRef::Text(text), NodeRef::Text(prev)) => (prev.char_len(), text.marks.clone()),
                (NodeRef::Element(element), NodeRef::Element(prev)) => {
                    (prev.children.len(), element.properties.clone())
                }
                _ => {
                    return Err(EditorError::invalid(format!(
                        "cannot merge the node at {p:?} into the node at {prev_path:?} because they are of different kinds"
                    )))
                }
            };
            let drop_prev = match prev {
                NodeRef::Element(prev) => editor.is_empty(prev),
                NodeRef::Text(prev) => prev.text.is_empty() && prev_path.last() != Some(&0),
                NodeRef::Root(_) => false,
            };
            MergePlan {
                path: p,
                prev_path,
                position,
                properties,
                drop_prev,
            }
        };

        // Ancestors of the merged node below the common ancestor that hold
        // nothing else.
        let common = path::common(&plan.path, &plan.prev_path);
        let mut between: Vec<Path> = editor
            .levels(&NodeQuery::new().at(plan.path.clone()))?
            .into_iter()
            .skip(common.len())
            .map(|(_, p)| p)
            .collect();
        between.pop();
        let keys: HashSet<NodeKey> = between.iter().filter_map(|p| editor.key_at(p)).collect();
        let empty_ancestor = editor
            .above(
                &NodeQuery::new()
                    .at(plan.path.clone())
                    .mode(Mode::Highest)
                    .matching(NodeMatch::custom(move |editor, node, _| {
                        node.key().is_some_and(|k| keys.contains(&k))
                            && has_single_child_nest(editor, node)
                    })),
            )?
            .map(|(_, p)| p);
        let empty_ref = empty_ancestor.map(|p| editor.path_ref(p, FORWARD));

        let new_path = path::next(&plan.prev_path)?;
        if !path::is_sibling(&plan.path, &plan.prev_path) {
            move_nodes(
                editor,
                NodeOptions::at(plan.path.clone())
                    .to(new_path.clone())
                    .voids(voids),
            )?;
        }

        if let Some(empty) = empty_ref.as_ref().and_then(|r| r.current(editor)) {
            remove_nodes(editor, NodeOptions::at(empty).voids(voids))?;
        }

        if plan.drop_prev {
            remove_nodes(editor, NodeOptions::at(plan.prev_path).voids(voids))?;
        } else {
            editor.apply(Operation::MergeNode {
                path: new_path,
                position: plan.position,
                properties: plan.properties,
            })?;
        }

        if let Some(empty_ref) = empty_ref {
            empty_ref.unref(editor);
        }
        Ok(())
    })
}

/// Split matching nodes at a point, from the lowest matching level up to
/// the highest. Nodes are only split where the point is not already at
/// one of their edges, unless `always` is set.
#[instrument(skip_all, fields(always = options.always, height = options.height))]
pub fn split_nodes(editor: &mut Editor, options: NodeOptions) -> EditorResult<()> {
    editor.without_normalizing(|editor| {
        let mode = options.mode.unwrap_or(Mode::Lowest);
        let voids = options.voids;
        let mut matching = options.matching.clone().unwrap_or(NodeMatch::Block);
        let mut height = options.height;
        let mut always = options.always;

        let Some(at) = editor.resolve_at(options.at.as_ref()) else {
            return Ok(());
        };
        let mut at = match at {
            Location::Range(range) => match delete_range(editor, range)? {
                Some(point) => point,
                None => return Ok(()),
            },
            Location::Path(p) => {
                let point = editor.start(p.clone())?;
                matching = match_path(editor, &path::parent(&p)?)?;
                height = point.path.len() - p.len() + 1;
                always = true;
                point
            }
            Location::Point(point) => point,
        };

        let before_ref = editor.point_ref(at.clone(), Some(Affinity::Backward));
        let mut after_ref = None;

        let mut run = || -> EditorResult<()> {
            let highest = matched_paths(
                editor,
                &query(Location::Point(at.clone()), matching.clone(), mode, voids),
            )?;
            let Some(highest_path) = highest.into_iter().next() else {
                return Ok(());
            };

            if !voids {
                let void_match = editor
                    .void_above(&NodeQuery::new().at(at.clone()).mode(Mode::Highest))?
                    .map(|(node, p)| (node.as_element().is_some_and(|e| editor.is_inline(e)), p));
                if let Some((inline, void_path)) = void_match {
                    // Split beside an inline void rather than inside it.
                    if inline {
                        at = match editor.after(void_path.clone(), StepOptions::default())? {
                            Some(after) => after,
                            None => {
                                let after_path = path::next(&void_path)?;
                                insert_nodes(
                                    editor,
                                    vec![Node::text("")],
                                    NodeOptions::at(after_path.clone()).voids(voids),
                                )?;
                                editor.start(after_path)?
                            }
                        };
                    }
                    height = at.path.len() - void_path.len() + 1;
                    always = true;
                }
            }

            after_ref = Some(editor.point_ref(at.clone(), FORWARD));
            let depth = at.path.len().checked_sub(height).ok_or_else(|| {
                EditorError::invalid(format!(
                    "cannot split {height} levels above the point at {:?}",
                    at.path
                ))
            })?;
            let lowest_path = at.path[..depth].to_vec();
            let mut position = if height == 0 {
                at.offset
            } else {
                at.path[depth]
            };

            let levels: Vec<(Path, bool, Properties)> = editor
                .levels(&NodeQuery::new().at(lowest_path).reverse(true).voids(voids))?
                .into_iter()
                .map(|(node, p)| {
                    let void = node.as_element().is_some_and(|e| editor.is_void(e));
                    (p, void, extract_props(node))
                })
                .collect();

            for (p, void, properties) in levels {
                if p.len() < highest_path.len() || p.is_empty() || (!voids && void) {
                    break;
                }
                let Some(point) = before_ref.current(editor) else {
                    return Err(EditorError::invalid("the split point no longer resolves"));
                };
                let is_end = editor.is_end(&point, p.clone())?;
                let split = always || !editor.is_edge(&point, p.clone())?;
                if split {
                    editor.apply(Operation::SplitNode {
                        path: p.clone(),
                        position,
                        properties,
                    })?;
                }
                position = p.last().copied().unwrap_or_default() + usize::from(split || is_end);
            }

            if options.at.is_none() {
                let point = match after_ref.as_ref().and_then(|r| r.current(editor)) {
                    Some(point) => point,
                    None => editor.end(Location::root())?,
                };
                selection::select(editor, point)?;
            }
            Ok(())
        };
        let result = run();

        before_ref.unref(editor);
        if let Some(after_ref) = after_ref {
            after_ref.unref(editor);
        }
        result
    })
}

/// Split a range's edges so that only its interior is matched.
fn split_range_edges(
    editor: &mut Editor,
    range: Range,
    matching: &NodeMatch,
    mode: Mode,
    voids: bool,
    edge_aware: bool,
) -> EditorResult<Option<Range>> {
    let range_ref = editor.range_ref(range.clone(), Some(RangeAffinity::Inward));
    let (start, end) = range.edges();
    let end_always = !edge_aware || !editor.is_end(&end, end.path.clone())?;
    split_nodes(
        editor,
        NodeOptions::at(end)
            .matching(matching.clone())
            .mode(mode)
            .voids(voids)
            .always(edge_aware && end_always),
    )?;
    let start_always = !edge_aware || !editor.is_start(&start, start.path.clone())?;
    split_nodes(
        editor,
        NodeOptions::at(start)
            .matching(matching.clone())
            .mode(mode)
            .voids(voids)
            .always(edge_aware && start_always),
    )?;
    Ok(range_ref.unref(editor))
}

/// Set properties (or marks, for texts) on every matching node. A `Null`
/// value removes the key. Keys named `text` or `children` are ignored.
#[instrument(skip_all)]
pub fn set_nodes(editor: &mut Editor, props: Properties, options: NodeOptions) -> EditorResult<()> {
    editor.without_normalizing(|editor| {
        let Some(mut at) = editor.resolve_at(options.at.as_ref()) else {
            return Ok(());
        };
        let voids = options.voids;
        let mode = options.mode.unwrap_or(Mode::Lowest);
        let matching = match options.matching.clone() {
            Some(m) => m,
            None => default_match(editor, &at)?,
        };
        if let (Location::Range(range), false) = (&at, options.hanging) {
            at = Location::Range(editor.unhang_range(range, voids)?);
        }

        if let (Location::Range(range), true) = (&at, options.split) {
            let range = range.clone();
            if range.is_collapsed() && editor.leaf(range.anchor.clone(), None)?.0.char_len() > 0 {
                return Ok(());
            }
            let split_mode = if mode == Mode::Lowest {
                Mode::Lowest
            } else {
                Mode::Highest
            };
            let Some(range) = split_range_edges(editor, range, &matching, split_mode, voids, true)?
            else {
                return Ok(());
            };
            if options.at.is_none() {
                selection::select(editor, range.clone())?;
            }
            at = Location::Range(range);
        }

        let targets: Vec<(Path, Properties)> = editor
            .nodes(&query(at, matching, mode, voids))?
            .into_iter()
            .filter(|(_, p)| !p.is_empty())
            .map(|(node, p)| (p, extract_props(node)))
            .collect();

        for (p, current) in targets {
            let mut properties = Properties::new();
            let mut new_properties = Properties::new();
            for (key, value) in &props {
                if key == "children" || key == "text" {
                    continue;
                }
                let old = current.get(key);
                if old.unwrap_or(&Value::Null) == value {
                    continue;
                }
                if let Some(old) = old {
                    properties.insert(key.clone(), old.clone());
                }
                if !value.is_null() {
                    new_properties.insert(key.clone(), value.clone());
                }
            }
            if properties.is_empty() && new_properties.is_empty() {
                continue;
            }
            editor.apply(Operation::SetNode {
                path: p,
                properties,
                new_properties,
            })?;
        }
        Ok(())
    })
}

/// Remove the given property keys from every matching node.
pub fn unset_nodes(editor: &mut Editor, keys: &[&str], options: NodeOptions) -> EditorResult<()> {
    let props: Properties = keys
        .iter()
        .map(|key| (key.to_string(), Value::Null))
        .collect();
    set_nodes(editor, props, options)
}

/// Wrap the matching nodes in a copy of `element`. Inline wrappers wrap
/// within each block; block wrappers wrap the whole span at once.
#[instrument(skip_all)]
pub fn wrap_nodes(editor: &mut Editor, element: Element, options: NodeOptions) -> EditorResult<()> {
    editor.without_normalizing(|editor| {
        let Some(mut at) = editor.resolve_at(options.at.as_ref()) else {
            return Ok(());
        };
        let voids = options.voids;
        let mode = options.mode.unwrap_or(Mode::Lowest);
        let inline = editor.is_inline(&element);
        let matching = match (options.matching.clone(), &at) {
            (Some(m), _) => m,
            (None, Location::Path(p)) => match_path(editor, p)?,
            (None, _) if inline => NodeMatch::AnyOf(vec![NodeMatch::Inline, NodeMatch::Text]),
            (None, _) => NodeMatch::Block,
        };

        if let (Location::Range(range), true) = (&at, options.split) {
            let Some(range) =
                split_range_edges(editor, range.clone(), &matching, Mode::Lowest, voids, false)?
            else {
                return Ok(());
            };
            if options.at.is_none() {
                selection::select(editor, range.clone())?;
            }
            at = Location::Range(range);
        }

        let root_match = if inline { NodeMatch::Block } else { NodeMatch::Root };
        let roots = matched_paths(editor, &query(at.clone(), root_match, Mode::Lowest, voids))?;

        for root in roots {
            let scoped = match &at {
                Location::Range(range) => {
                    match range.intersection(&editor.range(root.clone(), None)?) {
                        Some(overlap) => Location::Range(overlap),
                        None => continue,
                    }
                }
                other => other.clone(),
            };
            let matches = matched_paths(editor, &query(scoped, matching.clone(), mode, voids))?;
            let (Some(first), Some(last)) = (matches.first(), matches.last()) else {
                continue;
            };
            if first.is_empty() && last.is_empty() {
                continue;
            }

            let common = if first == last {
                path::parent(first)?
            } else {
                path::common(first, last)
            };
            let range = editor.range(first.clone(), Some(Location::Path(last.clone())))?;
            let siblings = children_match(editor.node(common.clone())?.0);
            let wrapper_path = path::next(&last[..common.len() + 1])?;

            insert_nodes(
                editor,
                vec![Node::Element(element.with_children(Vec::new()))],
                NodeOptions::at(wrapper_path.clone()).voids(voids),
            )?;
            let mut to = wrapper_path;
            to.push(0);
            move_nodes(
                editor,
                NodeOptions::at(range)
                    .matching(siblings)
                    .to(to)
                    .voids(voids),
            )?;
        }
        Ok(())
    })
}

/// Replace each matching element with its children.
#[instrument(skip_all)]
pub fn unwrap_nodes(editor: &mut Editor, options: NodeOptions) -> EditorResult<()> {
    editor.without_normalizing(|editor| {
        let Some(at) = editor.resolve_at(options.at.as_ref()) else {
            return Ok(());
        };
        let voids = options.voids;
        let mode = options.mode.unwrap_or(Mode::Lowest);
        let matching = match options.matching.clone() {
            Some(m) => m,
            None => default_match(editor, &at)?,
        };
        let at = match at {
            Location::Path(p) => Location::Range(editor.range(p, None)?),
            other => other,
        };
        let range_ref = at
            .as_range()
            .cloned()
            .map(|range| editor.range_ref(range, Some(RangeAffinity::Forward)));
        let paths = matched_paths(editor, &query(at, matching, mode, voids))?;
        let mut refs = track(editor, paths);
        refs.reverse();

        let run = || -> EditorResult<()> {
            for path_ref in refs {
                let Some(p) = path_ref.unref(editor) else {
                    continue;
                };
                let children = children_match(editor.node(p.clone())?.0);
                let mut range = editor.range(p, None)?;
                if options.split {
                    if let Some(current) = range_ref.as_ref().and_then(|r| r.current(editor)) {
                        match current.intersection(&range) {
                            Some(overlap) => range = overlap,
                            None => continue,
                        }
                    }
                }
                lift_nodes(
                    editor,
                    NodeOptions::at(range).matching(children).voids(voids),
                )?;
            }
            Ok(())
        };
        let result = run();

        if let Some(range_ref) = range_ref {
            range_ref.unref(editor);
        }
        result
    })
}

/// Move each matching node up one level, splitting its parent when the
/// node sits in the middle.
#[instrument(skip_all)]
pub fn lift_nodes(editor: &mut Editor, options: NodeOptions) -> EditorResult<()> {
    editor.without_normalizing(|editor| {
        let Some(at) = editor.resolve_at(options.at.as_ref()) else {
            return Ok(());
        };
        let voids = options.voids;
        let mode = options.mode.unwrap_or(Mode::Lowest);
        let matching = match options.matching.clone() {
            Some(m) => m,
            None => default_match(editor, &at)?,
        };
        let paths = matched_paths(editor, &query(at, matching, mode, voids))?;

        for path_ref in track(editor, paths) {
            let Some(p) = path_ref.unref(editor) else {
                continue;
            };
            if p.len() < 2 {
                return Err(EditorError::invalid(format!(
                    "cannot lift the node at {p:?} because it has a depth of less than 2"
                )));
            }
            let parent_path = path::parent(&p)?;
            let length = editor
                .document()
                .get(&parent_path)?
                .children()
                .map_or(0, <[Node]>::len);
            let index = p[p.len() - 1];
            let after_parent = path::next(&parent_path)?;

            if length == 1 {
                move_nodes(editor, NodeOptions::at(p).to(after_parent).voids(voids))?;
                remove_nodes(editor, NodeOptions::at(parent_path).voids(voids))?;
            } else if index == 0 {
                move_nodes(editor, NodeOptions::at(p).to(parent_path).voids(voids))?;
            } else if index == length - 1 {
                move_nodes(editor, NodeOptions::at(p).to(after_parent).voids(voids))?;
            } else {
                split_nodes(editor, NodeOptions::at(path::next(&p)?).voids(voids))?;
                move_nodes(editor, NodeOptions::at(p).to(after_parent).voids(voids))?;
            }
        }
        Ok(())
    })
}
