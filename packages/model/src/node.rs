//! # Document nodes
//!
//! The tree has three kinds of node: the root [`Document`], [`Element`]
//! containers and [`Text`] leaves. Elements and texts together form the
//! [`Node`] (descendant) type; the root is never a descendant.
//!
//! ## Wire shape
//!
//! ```text
//! Element: { "children": [...], ...properties }
//! Text:    { "text": "...",     ...marks }
//! ```
//!
//! Every element and text carries a [`NodeKey`] that is assigned at
//! construction, skipped by serde and ignored by equality.

use crate::key::NodeKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema-defined element properties or text marks.
pub type Properties = serde_json::Map<String, Value>;

/// Root of a document tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }
}

/// Container node with ordered children and arbitrary properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    #[serde(skip, default = "NodeKey::next")]
    pub key: NodeKey,
    pub children: Vec<Node>,
    #[serde(flatten)]
    pub properties: Properties,
}

impl Element {
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            key: NodeKey::next(),
            children,
            properties: Properties::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// A copy of this element with its children replaced.
    pub fn with_children(&self, children: Vec<Node>) -> Self {
        Self {
            key: NodeKey::next(),
            children,
            properties: self.properties.clone(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.children == other.children && self.properties == other.properties
    }
}

/// Text leaf with a string and mark properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    #[serde(skip, default = "NodeKey::next")]
    pub key: NodeKey,
    pub text: String,
    #[serde(flatten)]
    pub marks: Properties,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            key: NodeKey::next(),
            text: text.into(),
            marks: Properties::new(),
        }
    }

    /// Builder-style mark setter.
    pub fn with(mut self, mark: impl Into<String>, value: impl Into<Value>) -> Self {
        self.marks.insert(mark.into(), value.into());
        self
    }

    pub fn mark(&self, name: &str) -> Option<&Value> {
        self.marks.get(name)
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.marks == other.marks
    }
}

/// Any descendant of the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Text(Text),
    Element(Element),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(Text::new(text))
    }

    pub fn element(children: Vec<Node>) -> Self {
        Node::Element(Element::new(children))
    }

    pub fn key(&self) -> NodeKey {
        match self {
            Node::Text(t) => t.key,
            Node::Element(e) => e.key,
        }
    }

    pub fn set_key(&mut self, key: NodeKey) {
        match self {
            Node::Text(t) => t.key = key,
            Node::Element(e) => e.key = key,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Element(e) => Some(&e.children),
            Node::Text(_) => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element(e) => Some(&mut e.children),
            Node::Text(_) => None,
        }
    }

    /// Element properties or text marks.
    pub fn properties(&self) -> &Properties {
        match self {
            Node::Text(t) => &t.marks,
            Node::Element(e) => &e.properties,
        }
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        match self {
            Node::Text(t) => &mut t.marks,
            Node::Element(e) => &mut e.properties,
        }
    }

    /// Concatenated text content of every leaf under this node.
    pub fn string(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Assign fresh keys to this node and all of its descendants.
    pub fn rekey(&mut self) {
        self.set_key(NodeKey::next());
        if let Some(children) = self.children_mut() {
            for child in children {
                child.rekey();
            }
        }
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) => out.push_str(&t.text),
        Node::Element(e) => {
            for child in &e.children {
                collect_text(child, out);
            }
        }
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// Borrowed view of any node in the tree, including the root.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Root(&'a Document),
    Element(&'a Element),
    Text(&'a Text),
}

impl<'a> NodeRef<'a> {
    pub fn from_node(node: &'a Node) -> Self {
        match node {
            Node::Text(t) => NodeRef::Text(t),
            Node::Element(e) => NodeRef::Element(e),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, NodeRef::Root(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self, NodeRef::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeRef::Text(_))
    }

    pub fn as_element(&self) -> Option<&'a Element> {
        match self {
            NodeRef::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&'a Text> {
        match self {
            NodeRef::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Children of the root or an element; `None` for text leaves.
    pub fn children(&self) -> Option<&'a [Node]> {
        match self {
            NodeRef::Root(doc) => Some(&doc.children),
            NodeRef::Element(e) => Some(&e.children),
            NodeRef::Text(_) => None,
        }
    }

    /// The root has no key.
    pub fn key(&self) -> Option<NodeKey> {
        match self {
            NodeRef::Root(_) => None,
            NodeRef::Element(e) => Some(e.key),
            NodeRef::Text(t) => Some(t.key),
        }
    }

    /// Owned copy of a descendant; `None` for the root.
    pub fn to_node(&self) -> Option<Node> {
        match self {
            NodeRef::Root(_) => None,
            NodeRef::Element(e) => Some(Node::Element((*e).clone())),
            NodeRef::Text(t) => Some(Node::Text((*t).clone())),
        }
    }

    pub fn string(&self) -> String {
        match self {
            NodeRef::Root(doc) => doc.children.iter().map(Node::string).collect(),
            NodeRef::Element(e) => e.children.iter().map(Node::string).collect(),
            NodeRef::Text(t) => t.text.clone(),
        }
    }
}
