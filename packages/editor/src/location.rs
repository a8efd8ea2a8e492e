//! Targets and node predicates shared by queries and transforms.

use crate::editor::Editor;
use quire_model::{NodeKey, NodeRef, Path, Point, Range};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Anything a query or transform can be aimed at.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Path(Path),
    Point(Point),
    Range(Range),
}

impl Location {
    /// The root path.
    pub fn root() -> Self {
        Location::Path(Vec::new())
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Location::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<&Point> {
        match self {
            Location::Point(point) => Some(point),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<&Range> {
        match self {
            Location::Range(range) => Some(range),
            _ => None,
        }
    }
}

impl From<Path> for Location {
    fn from(path: Path) -> Self {
        Location::Path(path)
    }
}

impl From<&[usize]> for Location {
    fn from(path: &[usize]) -> Self {
        Location::Path(path.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Location {
    fn from(path: [usize; N]) -> Self {
        Location::Path(path.to_vec())
    }
}

impl From<Point> for Location {
    fn from(point: Point) -> Self {
        Location::Point(point)
    }
}

impl From<Range> for Location {
    fn from(range: Range) -> Self {
        Location::Range(range)
    }
}

/// A pair of paths bounding a traversal, first to last in walk order.
pub type Span = (Path, Path);

/// Which of several matches along one branch to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    All,
    Highest,
    Lowest,
}

/// Which end of a location to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// Selection endpoint addressed by selection transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEdge {
    Anchor,
    Focus,
    Start,
    End,
}

/// Movement granularity for positions, `before`/`after` and deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Unit {
    #[default]
    Offset,
    Character,
    Word,
    Line,
    Block,
}

/// Predicate over `(node, path)` entries.
#[derive(Clone, Default)]
pub enum NodeMatch {
    #[default]
    Any,
    Root,
    Text,
    Element,
    /// Elements the schema does not consider inline.
    Block,
    Inline,
    Void,
    Key(NodeKey),
    Keys(HashSet<NodeKey>),
    AnyOf(Vec<NodeMatch>),
    Custom(Rc<dyn Fn(&Editor, NodeRef<'_>, &[usize]) -> bool>),
}

impl NodeMatch {
    pub fn custom(f: impl Fn(&Editor, NodeRef<'_>, &[usize]) -> bool + 'static) -> Self {
        NodeMatch::Custom(Rc::new(f))
    }

    pub fn matches(&self, editor: &Editor, node: NodeRef<'_>, path: &[usize]) -> bool {
        match self {
            NodeMatch::Any => true,
            NodeMatch::Root => node.is_root(),
            NodeMatch::Text => node.is_text(),
            NodeMatch::Element => node.is_element(),
            NodeMatch::Block => node.as_element().is_some_and(|e| editor.is_block(e)),
            NodeMatch::Inline => node.as_element().is_some_and(|e| editor.is_inline(e)),
            NodeMatch::Void => node.as_element().is_some_and(|e| editor.is_void(e)),
            NodeMatch::Key(key) => node.key() == Some(*key),
            NodeMatch::Keys(keys) => node.key().is_some_and(|key| keys.contains(&key)),
            NodeMatch::AnyOf(all) => all.iter().any(|m| m.matches(editor, node, path)),
            NodeMatch::Custom(f) => f(editor, node, path),
        }
    }
}

impl fmt::Debug for NodeMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeMatch::Any => write!(f, "Any"),
            NodeMatch::Root => write!(f, "Root"),
            NodeMatch::Text => write!(f, "Text"),
            NodeMatch::Element => write!(f, "Element"),
            NodeMatch::Block => write!(f, "Block"),
            NodeMatch::Inline => write!(f, "Inline"),
            NodeMatch::Void => write!(f, "Void"),
            NodeMatch::Key(key) => write!(f, "Key({key})"),
            NodeMatch::Keys(keys) => write!(f, "Keys({})", keys.len()),
            NodeMatch::AnyOf(all) => f.debug_tuple("AnyOf").field(all).finish(),
            NodeMatch::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Options for [`Editor::nodes`] and the other entry queries.
///
/// `at` defaults to the current selection. `span` overrides `at` with an
/// explicit pair of traversal bounds.
#[derive(Debug, Clone, Default)]
pub struct NodeQuery {
    pub at: Option<Location>,
    pub span: Option<Span>,
    pub matching: NodeMatch,
    pub mode: Option<Mode>,
    pub universal: bool,
    pub reverse: bool,
    pub voids: bool,
}

impl NodeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, at: impl Into<Location>) -> Self {
        self.at = Some(at.into());
        self
    }

    pub fn span(mut self, from: Path, to: Path) -> Self {
        self.span = Some((from, to));
        self
    }

    pub fn matching(mut self, matching: NodeMatch) -> Self {
        self.matching = matching;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn universal(mut self, universal: bool) -> Self {
        self.universal = universal;
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn voids(mut self, voids: bool) -> Self {
        self.voids = voids;
        self
    }
}

/// Step options for [`Editor::before`], [`Editor::after`] and
/// [`Editor::positions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOptions {
    pub distance: usize,
    pub unit: Unit,
    pub reverse: bool,
    pub voids: bool,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            distance: 1,
            unit: Unit::Offset,
            reverse: false,
            voids: false,
        }
    }
}

impl StepOptions {
    pub fn unit(unit: Unit) -> Self {
        Self {
            unit,
            ..Self::default()
        }
    }

    pub fn distance(mut self, distance: usize) -> Self {
        self.distance = distance;
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn voids(mut self, voids: bool) -> Self {
        self.voids = voids;
        self
    }
}
