//! Element backends for tree and JSON data
//!
//! A [`Backend`] names the family of values extractors consume and produce.
//! Selector matches, configured defaults, plural results and assembled items
//! all share the backend's element type, so the output of one extractor can be
//! fed straight into another one.
//!
//! Three backends are provided:
//!
//! - [`Json`] works on `serde_json::Value` documents
//! - [`Xml`] works on `sxd-document` trees and supports XPath and CSS selectors
//! - [`Html`] works on `scraper` documents and supports CSS selectors

use std::fmt;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;
use sxd_xpath::nodeset::Node as XPathNode;

/// Longest rendering (in characters) used for elements in error traces
const DESCRIBE_LIMIT: usize = 120;

/// A family of elements that extractors can be evaluated against
///
/// Implementations are zero-sized marker types. The element type carries a
/// lifetime so tree backends can hand out nodes borrowed from their document.
pub trait Backend: fmt::Debug + Sized + 'static {
    /// The value type extractors of this backend read and produce
    type Element<'a>: Clone + fmt::Debug + PartialEq;

    /// Convert an element-independent JSON value into an element
    ///
    /// Used for configured defaults and for the output of typed conversions.
    fn lift<'a>(value: Value) -> Self::Element<'a>;

    /// Wrap the results of a plural extraction
    fn list<'a>(items: Vec<Self::Element<'a>>) -> Self::Element<'a>;

    /// Wrap the values assembled by an item, in declaration order
    fn map<'a>(entries: IndexMap<String, Self::Element<'a>>) -> Self::Element<'a>;

    /// View the element as a sequence when it already is one
    fn as_sequence<'a, 'b>(element: &'b Self::Element<'a>) -> Option<&'b [Self::Element<'a>]>;

    /// Textual value of the element, if it has one
    fn text(element: &Self::Element<'_>) -> Option<String>;

    /// Bounded human-readable rendering used in error traces
    fn describe(element: &Self::Element<'_>) -> String;
}

/// A node of a parsed document tree
pub trait TreeNode: Copy + fmt::Debug + PartialEq {
    /// Concatenated text content of the node
    fn text(&self) -> String;

    /// Value of an attribute, `None` if the node has no such attribute
    fn attribute(&self, name: &str) -> Option<String>;

    /// Short description such as `<li>`
    fn describe(&self) -> String;
}

/// JSON documents decoded into `serde_json::Value`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Json;

impl Backend for Json {
    type Element<'a> = Value;

    fn lift<'a>(value: Value) -> Self::Element<'a> {
        value
    }

    fn list<'a>(items: Vec<Self::Element<'a>>) -> Self::Element<'a> {
        Value::Array(items)
    }

    fn map<'a>(entries: IndexMap<String, Self::Element<'a>>) -> Self::Element<'a> {
        Value::Object(entries.into_iter().collect())
    }

    fn as_sequence<'a, 'b>(element: &'b Self::Element<'a>) -> Option<&'b [Self::Element<'a>]> {
        element.as_array().map(Vec::as_slice)
    }

    fn text(element: &Self::Element<'_>) -> Option<String> {
        match element {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    fn describe(element: &Self::Element<'_>) -> String {
        truncate(element.to_string())
    }
}

/// XML (or well-formed XHTML) trees parsed with `sxd-document`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Xml;

/// Element type of the [`Xml`] backend
pub type XmlValue<'d> = NodeValue<XPathNode<'d>>;

impl Backend for Xml {
    type Element<'a> = XmlValue<'a>;

    fn lift<'a>(value: Value) -> Self::Element<'a> {
        NodeValue::from_json(value)
    }

    fn list<'a>(items: Vec<Self::Element<'a>>) -> Self::Element<'a> {
        NodeValue::List(items)
    }

    fn map<'a>(entries: IndexMap<String, Self::Element<'a>>) -> Self::Element<'a> {
        NodeValue::Map(entries)
    }

    fn as_sequence<'a, 'b>(element: &'b Self::Element<'a>) -> Option<&'b [Self::Element<'a>]> {
        element.as_list()
    }

    fn text(element: &Self::Element<'_>) -> Option<String> {
        element.text()
    }

    fn describe(element: &Self::Element<'_>) -> String {
        element.describe()
    }
}

/// HTML documents parsed with `scraper`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Html;

/// Element type of the [`Html`] backend
pub type HtmlValue<'a> = NodeValue<scraper::ElementRef<'a>>;

impl Backend for Html {
    type Element<'a> = HtmlValue<'a>;

    fn lift<'a>(value: Value) -> Self::Element<'a> {
        NodeValue::from_json(value)
    }

    fn list<'a>(items: Vec<Self::Element<'a>>) -> Self::Element<'a> {
        NodeValue::List(items)
    }

    fn map<'a>(entries: IndexMap<String, Self::Element<'a>>) -> Self::Element<'a> {
        NodeValue::Map(entries)
    }

    fn as_sequence<'a, 'b>(element: &'b Self::Element<'a>) -> Option<&'b [Self::Element<'a>]> {
        element.as_list()
    }

    fn text(element: &Self::Element<'_>) -> Option<String> {
        element.text()
    }

    fn describe(element: &Self::Element<'_>) -> String {
        element.describe()
    }
}

/// A value produced while extracting from a document tree
///
/// Selectors yield nodes or strings; items and plural fields wrap their
/// results in `Map` and `List`; defaults and typed conversions produce scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue<N> {
    Node(N),
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<NodeValue<N>>),
    Map(IndexMap<String, NodeValue<N>>),
}

impl<N: TreeNode> NodeValue<N> {
    /// Build a value from JSON; objects keep their key order
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => match number.as_i64() {
                Some(integer) => Self::Integer(integer),
                None => Self::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(text) => Self::String(text),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from_json(value)))
                    .collect(),
            ),
        }
    }

    pub fn as_node(&self) -> Option<N> {
        match self {
            Self::Node(node) => Some(*node),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Self>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Textual value: node text content, strings, and rendered scalars
    pub fn text(&self) -> Option<String> {
        match self {
            Self::Node(node) => Some(node.text()),
            Self::String(text) => Some(text.clone()),
            Self::Bool(flag) => Some(flag.to_string()),
            Self::Integer(integer) => Some(integer.to_string()),
            Self::Float(float) => Some(float.to_string()),
            Self::Null | Self::List(_) | Self::Map(_) => None,
        }
    }

    /// Convert into JSON, rendering nodes as their text content
    pub fn to_json(&self) -> Value {
        // serializing a NodeValue never fails: keys are strings and nodes render as text
        serde_json::to_value(self).unwrap_or_default()
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Node(node) => node.describe(),
            other => truncate(other.to_json().to_string()),
        }
    }
}

impl<N: TreeNode> Serialize for NodeValue<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Node(node) => serializer.serialize_str(&node.text()),
            Self::Null => serializer.serialize_unit(),
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Integer(integer) => serializer.serialize_i64(*integer),
            Self::Float(float) => serializer.serialize_f64(*float),
            Self::String(text) => serializer.serialize_str(text),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<N> From<&str> for NodeValue<N> {
    fn from(text: &str) -> Self {
        Self::String(text.to_string())
    }
}

impl<N> From<String> for NodeValue<N> {
    fn from(text: String) -> Self {
        Self::String(text)
    }
}

impl<N> From<i64> for NodeValue<N> {
    fn from(integer: i64) -> Self {
        Self::Integer(integer)
    }
}

impl<N> From<f64> for NodeValue<N> {
    fn from(float: f64) -> Self {
        Self::Float(float)
    }
}

impl<N> From<bool> for NodeValue<N> {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl<'d> TreeNode for XPathNode<'d> {
    fn text(&self) -> String {
        self.string_value()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match self {
            XPathNode::Element(element) => element.attribute_value(name).map(str::to_owned),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            XPathNode::Root(_) => "<#document>".to_string(),
            XPathNode::Element(element) => format!("<{}>", element.name().local_part()),
            other => truncate(other.string_value()),
        }
    }
}

impl<'d> From<sxd_document::dom::Root<'d>> for XmlValue<'d> {
    fn from(root: sxd_document::dom::Root<'d>) -> Self {
        NodeValue::Node(XPathNode::Root(root))
    }
}

impl<'d> From<sxd_document::dom::Element<'d>> for XmlValue<'d> {
    fn from(element: sxd_document::dom::Element<'d>) -> Self {
        NodeValue::Node(XPathNode::Element(element))
    }
}

impl<'a> TreeNode for scraper::ElementRef<'a> {
    fn text(&self) -> String {
        scraper::ElementRef::text(self).collect()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_owned)
    }

    fn describe(&self) -> String {
        format!("<{}>", self.value().name())
    }
}

impl<'a> From<scraper::ElementRef<'a>> for HtmlValue<'a> {
    fn from(element: scraper::ElementRef<'a>) -> Self {
        NodeValue::Node(element)
    }
}

fn truncate(mut text: String) -> String {
    if let Some((index, _)) = text.char_indices().nth(DESCRIBE_LIMIT) {
        text.truncate(index);
        text.push_str("...");
    }
    text
}
