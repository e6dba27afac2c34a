//! XPath 1.0 selector extractor
//!
//! XML trees are evaluated directly. HTML trees are mirrored into an
//! `sxd-document` package for the duration of one evaluation, and element
//! matches are mapped back to the `scraper` elements they were copied from.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Node as HtmlNode};
use sxd_document::Package;
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Document, Element};
use sxd_xpath::nodeset::Node as XPathNode;
use sxd_xpath::{Context, Factory, Value as XPathValue, XPath};
use tracing::debug;

use crate::backend::{Backend, Html, HtmlValue, NodeValue, Xml, XmlValue};
use crate::error::{Error, ExprError, NotANode};
use crate::selector::{Matches, SimpleExtractor};

#[derive(Debug, thiserror::Error)]
#[error("empty XPath expression")]
struct EmptyExpression;

/// The expression uses a namespace prefix that was never registered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no namespace registered for prefix {prefix:?}")]
pub struct UnknownPrefix {
    pub prefix: String,
}

/// Evaluates an XPath expression against an XML node
///
/// Node-set results come back in document order. Elements and the document
/// root stay nodes so they can be fed to further extractors; attribute, text,
/// comment and processing-instruction nodes become their string value.
/// String, number and boolean results are [`Matches::Scalar`].
///
/// [`HtmlXPathExtractor`] runs the same expressions on [`Html`] trees.
///
/// # Examples
///
/// ```ignore
/// use data_extractor::{SimpleExtractor, XPathExtractor, XmlValue};
///
/// let package = sxd_document::parser::parse("<ul><li>a</li><li>b</li></ul>")?;
/// let root = XmlValue::from(package.as_document().root());
///
/// let items = XPathExtractor::new("//li/text()").extract(&root)?;
/// assert_eq!(items.len(), 2);
/// ```
#[derive(Clone)]
pub struct XPathExtractor {
    expr: String,
    namespaces: Vec<(String, String)>,
    compiled: OnceCell<Rc<XPath>>,
}

impl XPathExtractor {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            namespaces: Vec::new(),
            compiled: OnceCell::new(),
        }
    }

    /// Create the extractor and compile it immediately
    pub fn build(expr: impl Into<String>) -> Result<Self, ExprError> {
        let extractor = Self::new(expr);
        extractor.compile()?;
        Ok(extractor)
    }

    /// Register a namespace prefix usable in the expression
    ///
    /// Prefixes are resolved when the expression runs, so an unknown prefix is
    /// reported by `extract`, not by `compile`.
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.push((prefix.into(), uri.into()));
        self
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    fn matcher(&self) -> Result<&XPath, ExprError> {
        self.matcher_for(self)
    }

    /// Compiled expression; errors name `reporter` as the failing extractor
    fn matcher_for(&self, reporter: &impl fmt::Debug) -> Result<&XPath, ExprError> {
        if let Some(xpath) = self.compiled.get() {
            return Ok(&**xpath);
        }

        let xpath = Factory::new()
            .build(&self.expr)
            .map_err(|err| ExprError::compile(reporter, err))?
            .ok_or_else(|| ExprError::compile(reporter, EmptyExpression))?;
        debug!(expr = %self.expr, "compiled XPath expression");

        Ok(&**self.compiled.get_or_init(|| Rc::new(xpath)))
    }

    /// Evaluation context holding the registered namespaces
    ///
    /// Fails if the expression uses a prefix that is not registered.
    fn context<'d>(&self, reporter: &impl fmt::Debug) -> Result<Context<'d>, ExprError> {
        if let Some(prefix) = prefixes(&self.expr)
            .into_iter()
            .find(|prefix| {
                !self
                    .namespaces
                    .iter()
                    .any(|(known, _)| known.as_str() == *prefix)
            })
        {
            return Err(ExprError::evaluate(
                reporter,
                UnknownPrefix {
                    prefix: prefix.to_string(),
                },
            ));
        }

        let mut context = Context::new();
        for (prefix, uri) in &self.namespaces {
            context.set_namespace(prefix, uri);
        }
        Ok(context)
    }

    fn run<'d>(
        &self,
        node: XPathNode<'d>,
        reporter: &impl fmt::Debug,
    ) -> Result<XPathValue<'d>, ExprError> {
        let xpath = self.matcher_for(reporter)?;
        let context = self.context(reporter)?;
        xpath
            .evaluate(&context, node)
            .map_err(|err| ExprError::evaluate(reporter, err))
    }

    /// Evaluate against a node value
    pub fn evaluate<'d>(&self, element: &XmlValue<'d>) -> Result<Matches<XmlValue<'d>>, ExprError> {
        self.matcher()?;
        let Some(node) = element.as_node() else {
            return Err(ExprError::evaluate(
                self,
                NotANode {
                    found: element.describe(),
                },
            ));
        };

        Ok(into_matches(self.run(node, self)?, |node| match node {
            XPathNode::Root(_) | XPathNode::Element(_) => NodeValue::Node(node),
            other => NodeValue::String(other.string_value()),
        }))
    }
}

fn into_matches<'d, N>(
    value: XPathValue<'d>,
    mut node: impl FnMut(XPathNode<'d>) -> NodeValue<N>,
) -> Matches<NodeValue<N>> {
    match value {
        XPathValue::Nodeset(nodes) => {
            Matches::Many(nodes.document_order().into_iter().map(&mut node).collect())
        }
        XPathValue::String(text) => Matches::Scalar(NodeValue::String(text)),
        XPathValue::Number(number) => Matches::Scalar(NodeValue::Float(number)),
        XPathValue::Boolean(flag) => Matches::Scalar(NodeValue::Bool(flag)),
    }
}

/// Namespace prefixes of the qualified names used in an XPath expression
///
/// String literals and `::` axis separators are skipped.
fn prefixes(expr: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut quote = None;
    let mut start = None;
    let mut previous = None;

    for (index, c) in expr.char_indices() {
        if let Some(open) = quote {
            if c == open {
                quote = None;
            }
            previous = Some(c);
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                start = None;
            }
            ':' => {
                let axis = previous == Some(':') || expr[index + 1..].starts_with(':');
                if let Some(begin) = start.take() {
                    if !axis && !found.contains(&&expr[begin..index]) {
                        found.push(&expr[begin..index]);
                    }
                }
            }
            c if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') => {
                if start.is_none() && (c.is_alphabetic() || c == '_') && previous != Some('$') {
                    start = Some(index);
                }
            }
            _ => start = None,
        }
        previous = Some(c);
    }

    found
}

/// Copy of a `scraper` tree in an `sxd-document` package
struct Mirror<'d> {
    elements: HashMap<NodeId, Element<'d>>,
    ids: HashMap<Element<'d>, NodeId>,
}

impl<'d> Mirror<'d> {
    fn build(document: Document<'d>, root: NodeRef<'_, HtmlNode>) -> Self {
        let mut mirror = Self {
            elements: HashMap::new(),
            ids: HashMap::new(),
        };

        for child in root.children() {
            match mirror.copy(document, child) {
                Some(ChildOfElement::Element(element)) => {
                    document.root().append_child(ChildOfRoot::Element(element))
                }
                Some(ChildOfElement::Comment(comment)) => {
                    document.root().append_child(ChildOfRoot::Comment(comment))
                }
                _ => {}
            }
        }

        mirror
    }

    fn copy(
        &mut self,
        document: Document<'d>,
        node: NodeRef<'_, HtmlNode>,
    ) -> Option<ChildOfElement<'d>> {
        match node.value() {
            HtmlNode::Element(source) => {
                let element = document.create_element(source.name());
                for (name, value) in source.attrs() {
                    element.set_attribute_value(name, value);
                }
                for child in node.children() {
                    if let Some(copy) = self.copy(document, child) {
                        element.append_child(copy);
                    }
                }
                self.elements.insert(node.id(), element);
                self.ids.insert(element, node.id());
                Some(ChildOfElement::Element(element))
            }
            HtmlNode::Text(text) => Some(ChildOfElement::Text(document.create_text(text))),
            HtmlNode::Comment(comment) => {
                Some(ChildOfElement::Comment(document.create_comment(comment)))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for XPathExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("XPathExtractor").field(&self.expr).finish()
    }
}

impl SimpleExtractor<Xml> for XPathExtractor {
    fn expr(&self) -> &str {
        &self.expr
    }

    fn set_expr(&mut self, expr: String) {
        self.expr = expr;
        self.compiled.take();
    }

    fn compile(&self) -> Result<(), ExprError> {
        self.matcher().map(|_| ())
    }

    fn extract<'a>(
        &self,
        element: &<Xml as Backend>::Element<'a>,
    ) -> Result<Matches<<Xml as Backend>::Element<'a>>, Error<'a, Xml>> {
        Ok(self.evaluate(element)?)
    }

    fn box_clone(&self) -> Box<dyn SimpleExtractor<Xml>> {
        Box::new(self.clone())
    }
}

/// Evaluates an XPath expression against an HTML element
///
/// The `scraper` document holding the element is copied into an
/// `sxd-document` package for each evaluation. Element matches are the
/// `scraper` elements they were copied from; every other node, the document
/// root included, becomes its string value. Element and attribute names are
/// the lowercase HTML names without a namespace, so `//div/@class` selects as
/// it would on an lxml HTML tree.
///
/// # Examples
///
/// ```ignore
/// use data_extractor::{HtmlValue, HtmlXPathExtractor, SimpleExtractor};
///
/// let document = scraper::Html::parse_document("<ul><li>a</li><li>b</li></ul>");
/// let root = HtmlValue::from(document.root_element());
///
/// let items = HtmlXPathExtractor::new("//li/text()").extract(&root)?;
/// assert_eq!(items.len(), 2);
/// ```
#[derive(Clone)]
pub struct HtmlXPathExtractor {
    xpath: XPathExtractor,
}

impl HtmlXPathExtractor {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            xpath: XPathExtractor::new(expr),
        }
    }

    /// Create the extractor and compile it immediately
    pub fn build(expr: impl Into<String>) -> Result<Self, ExprError> {
        let extractor = Self::new(expr);
        extractor.compile()?;
        Ok(extractor)
    }

    /// Register a namespace prefix usable in the expression
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.xpath = self.xpath.with_namespace(prefix, uri);
        self
    }

    pub fn is_compiled(&self) -> bool {
        self.xpath.is_compiled()
    }

    /// Evaluate against an HTML element value
    pub fn evaluate<'a>(&self, element: &HtmlValue<'a>) -> Result<Matches<HtmlValue<'a>>, ExprError> {
        self.xpath.matcher_for(self)?;
        let Some(origin) = element.as_node() else {
            return Err(ExprError::evaluate(
                self,
                NotANode {
                    found: element.describe(),
                },
            ));
        };

        let tree = origin.tree();
        let package = Package::new();
        let mirror = Mirror::build(package.as_document(), tree.root());
        let Some(&context) = mirror.elements.get(&origin.id()) else {
            return Err(ExprError::evaluate(
                self,
                NotANode {
                    found: element.describe(),
                },
            ));
        };

        let value = self.xpath.run(XPathNode::Element(context), self)?;
        Ok(into_matches(value, |node| {
            let found = match node {
                XPathNode::Element(copy) => mirror
                    .ids
                    .get(&copy)
                    .and_then(|&id| tree.get(id))
                    .and_then(ElementRef::wrap),
                _ => None,
            };
            match found {
                Some(element) => NodeValue::Node(element),
                None => NodeValue::String(node.string_value()),
            }
        }))
    }
}

impl From<XPathExtractor> for HtmlXPathExtractor {
    fn from(xpath: XPathExtractor) -> Self {
        Self { xpath }
    }
}

impl fmt::Debug for HtmlXPathExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HtmlXPathExtractor")
            .field(&self.xpath.expr)
            .finish()
    }
}

impl SimpleExtractor<Html> for HtmlXPathExtractor {
    fn expr(&self) -> &str {
        &self.xpath.expr
    }

    fn set_expr(&mut self, expr: String) {
        SimpleExtractor::<Xml>::set_expr(&mut self.xpath, expr);
    }

    fn compile(&self) -> Result<(), ExprError> {
        self.xpath.matcher_for(self).map(|_| ())
    }

    fn extract<'a>(
        &self,
        element: &<Html as Backend>::Element<'a>,
    ) -> Result<Matches<<Html as Backend>::Element<'a>>, Error<'a, Html>> {
        Ok(self.evaluate(element)?)
    }

    fn box_clone(&self) -> Box<dyn SimpleExtractor<Html>> {
        Box::new(self.clone())
    }
}
