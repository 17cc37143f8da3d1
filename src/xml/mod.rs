//! Generic attributed XML tree.
//!
//! This is the small tree abstraction the RTML decoders walk and the encoders
//! build. Parsing and rendering are delegated to `quick-xml` in the
//! [`reader`] and [`writer`] submodules; the tree itself knows nothing about
//! RTML.

pub mod reader;
pub mod writer;

pub use reader::{parse_reader, parse_str};
pub use writer::{to_string, write};

use std::fmt;

/// Kind of a tree node, as seen by the decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    Comment,
    DocumentType,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Document => "document",
            NodeKind::Element => "element",
            NodeKind::Text => "text",
            NodeKind::Comment => "comment",
            NodeKind::DocumentType => "doctype",
        };
        f.write_str(name)
    }
}

/// A child node of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
}

impl XmlNode {
    /// Creates a text node.
    pub fn text(value: impl Into<String>) -> Self {
        XmlNode::Text(value.into())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            XmlNode::Element(_) => NodeKind::Element,
            XmlNode::Text(_) => NodeKind::Text,
            XmlNode::Comment(_) => NodeKind::Comment,
        }
    }

    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Text content; defined only for text nodes.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlNode::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Short human readable description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            XmlNode::Element(e) => e.describe(),
            XmlNode::Text(t) => format!("text '{}'", abbreviate(t)),
            XmlNode::Comment(c) => format!("comment '{}'", abbreviate(c)),
        }
    }
}

/// An element: tag name, attributes in insertion order, ordered children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Sets an attribute, replacing any existing value with the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    pub fn append_child(&mut self, child: XmlNode) {
        self.children.push(child);
    }

    pub fn append_element(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }

    pub fn append_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Text(text.into()));
    }

    /// Builder-style helper: appends a text child and returns self.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.append_text(text);
        self
    }

    pub fn with_child(mut self, element: XmlElement) -> Self {
        self.append_element(element);
        self
    }

    /// Builder-style helper: sets an attribute and returns self.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Element children in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Element children with the given tag.
    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.child_elements().filter(move |e| e.name == name)
    }

    /// First element child with the given tag.
    pub fn first_element(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|e| e.name == name)
    }

    /// Value of the last text child, or `None` if the element has no text.
    pub fn last_text(&self) -> Option<&str> {
        self.children.iter().rev().find_map(XmlNode::as_text)
    }

    pub fn describe(&self) -> String {
        let mut out = format!("<{}", self.name);
        for (k, v) in &self.attributes {
            out.push_str(&format!(" {}=\"{}\"", k, abbreviate(v)));
        }
        out.push('>');
        out
    }
}

/// A whole document: optional DOCTYPE plus the root element.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Raw DOCTYPE content, e.g. `RTML SYSTEM "http://.../rtml2.2.dtd"`.
    pub doctype: Option<String>,
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self {
            doctype: None,
            root,
        }
    }

    pub fn with_doctype(root: XmlElement, doctype: impl Into<String>) -> Self {
        Self {
            doctype: Some(doctype.into()),
            root,
        }
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Document
    }

    /// The SYSTEM identifier of the DOCTYPE, if any.
    pub fn doctype_system_id(&self) -> Option<&str> {
        let doctype = self.doctype.as_deref()?;
        let rest = &doctype[doctype.find("SYSTEM")? + "SYSTEM".len()..];
        let rest = rest.trim_start();
        let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let inner = &rest[1..];
        inner.find(quote).map(|end| &inner[..end])
    }
}

fn abbreviate(s: &str) -> String {
    const MAX: usize = 40;
    let trimmed = s.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX).collect();
        format!("{}...", head)
    }
}
