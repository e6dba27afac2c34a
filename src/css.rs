//! CSS selector extractors for the tree backends
//!
//! On [`Xml`] trees a CSS selector is translated to XPath with
//! [`css_to_xpath`] and evaluated by an [`XPathExtractor`]. On [`Html`]
//! documents it is compiled with `scraper`. Either way the context element
//! itself is a candidate match, followed by its descendants in document order.

use std::cell::OnceCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use scraper::Selector;
use serde_json::Value;
use tracing::debug;

use crate::backend::{Backend, Html, NodeValue, TreeNode, Xml};
use crate::css_translate::css_to_xpath;
use crate::error::{BoxError, Error, ExprError, NotANode};
use crate::selector::{Matches, SimpleExtractor};
use crate::xpath::XPathExtractor;

/// A backend whose elements can be matched by CSS selectors
pub trait CssBackend: Backend {
    /// Compiled form of a selector
    type Compiled: 'static;

    fn compile_css(expr: &str) -> Result<Self::Compiled, BoxError>;

    /// Matching elements, the context element first when it matches
    fn select<'a>(
        compiled: &Self::Compiled,
        element: &Self::Element<'a>,
    ) -> Result<Vec<Self::Element<'a>>, BoxError>;

    fn attribute(element: &Self::Element<'_>, name: &str) -> Option<String>;
}

impl CssBackend for Xml {
    type Compiled = XPathExtractor;

    fn compile_css(expr: &str) -> Result<Self::Compiled, BoxError> {
        let xpath = XPathExtractor::new(css_to_xpath(expr)?);
        xpath.compile().map_err(|err| err.source)?;
        Ok(xpath)
    }

    fn select<'a>(
        compiled: &Self::Compiled,
        element: &Self::Element<'a>,
    ) -> Result<Vec<Self::Element<'a>>, BoxError> {
        match compiled.evaluate(element) {
            Ok(matches) => Ok(matches.into_vec()),
            Err(err) => Err(err.source),
        }
    }

    fn attribute(element: &Self::Element<'_>, name: &str) -> Option<String> {
        TreeNode::attribute(&element.as_node()?, name)
    }
}

impl CssBackend for Html {
    type Compiled = Selector;

    fn compile_css(expr: &str) -> Result<Self::Compiled, BoxError> {
        Selector::parse(expr).map_err(|err| err.to_string().into())
    }

    fn select<'a>(
        compiled: &Self::Compiled,
        element: &Self::Element<'a>,
    ) -> Result<Vec<Self::Element<'a>>, BoxError> {
        let Some(node) = element.as_node() else {
            return Err(NotANode {
                found: element.describe(),
            }
            .into());
        };

        let mut found = Vec::new();
        if compiled.matches(&node) {
            found.push(NodeValue::Node(node));
        }
        found.extend(node.select(compiled).map(NodeValue::Node));
        Ok(found)
    }

    fn attribute(element: &Self::Element<'_>, name: &str) -> Option<String> {
        TreeNode::attribute(&element.as_node()?, name)
    }
}

/// Lazily compiled selector shared by the CSS extractors
struct CssMatcher<B: CssBackend> {
    expr: String,
    compiled: OnceCell<Rc<B::Compiled>>,
}

impl<B: CssBackend> CssMatcher<B> {
    fn new(expr: String) -> Self {
        Self {
            expr,
            compiled: OnceCell::new(),
        }
    }

    fn set_expr(&mut self, expr: String) {
        self.expr = expr;
        self.compiled.take();
    }

    fn compiled(&self, owner: &impl fmt::Debug) -> Result<&B::Compiled, ExprError> {
        if let Some(compiled) = self.compiled.get() {
            return Ok(&**compiled);
        }

        let compiled = B::compile_css(&self.expr).map_err(|err| ExprError::compile(owner, err))?;
        debug!(expr = %self.expr, "compiled CSS selector");
        Ok(&**self.compiled.get_or_init(|| Rc::new(compiled)))
    }

    fn select<'a>(
        &self,
        owner: &impl fmt::Debug,
        element: &B::Element<'a>,
    ) -> Result<Vec<B::Element<'a>>, ExprError> {
        let compiled = self.compiled(owner)?;
        B::select(compiled, element).map_err(|err| ExprError::evaluate(owner, err))
    }
}

impl<B: CssBackend> Clone for CssMatcher<B> {
    fn clone(&self) -> Self {
        Self {
            expr: self.expr.clone(),
            compiled: self.compiled.clone(),
        }
    }
}

/// Selects the elements matching a CSS selector
pub struct CssExtractor<B: CssBackend> {
    matcher: CssMatcher<B>,
    _backend: PhantomData<B>,
}

impl<B: CssBackend> CssExtractor<B> {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            matcher: CssMatcher::new(expr.into()),
            _backend: PhantomData,
        }
    }
}

impl<B: CssBackend> Clone for CssExtractor<B> {
    fn clone(&self) -> Self {
        Self {
            matcher: self.matcher.clone(),
            _backend: PhantomData,
        }
    }
}

impl<B: CssBackend> fmt::Debug for CssExtractor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CssExtractor").field(&self.matcher.expr).finish()
    }
}

impl<B: CssBackend> SimpleExtractor<B> for CssExtractor<B> {
    fn expr(&self) -> &str {
        &self.matcher.expr
    }

    fn set_expr(&mut self, expr: String) {
        self.matcher.set_expr(expr);
    }

    fn compile(&self) -> Result<(), ExprError> {
        self.matcher.compiled(self).map(|_| ())
    }

    fn extract<'a>(&self, element: &B::Element<'a>) -> Result<Matches<B::Element<'a>>, Error<'a, B>> {
        Ok(Matches::Many(self.matcher.select(self, element)?))
    }

    fn box_clone(&self) -> Box<dyn SimpleExtractor<B>> {
        Box::new(self.clone())
    }
}

/// Selects the text content of the elements matching a CSS selector
///
/// The text of an element includes the text of all its descendants.
pub struct TextCssExtractor<B: CssBackend> {
    matcher: CssMatcher<B>,
    _backend: PhantomData<B>,
}

impl<B: CssBackend> TextCssExtractor<B> {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            matcher: CssMatcher::new(expr.into()),
            _backend: PhantomData,
        }
    }
}

impl<B: CssBackend> Clone for TextCssExtractor<B> {
    fn clone(&self) -> Self {
        Self {
            matcher: self.matcher.clone(),
            _backend: PhantomData,
        }
    }
}

impl<B: CssBackend> fmt::Debug for TextCssExtractor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextCssExtractor").field(&self.matcher.expr).finish()
    }
}

impl<B: CssBackend> SimpleExtractor<B> for TextCssExtractor<B> {
    fn expr(&self) -> &str {
        &self.matcher.expr
    }

    fn set_expr(&mut self, expr: String) {
        self.matcher.set_expr(expr);
    }

    fn compile(&self) -> Result<(), ExprError> {
        self.matcher.compiled(self).map(|_| ())
    }

    fn extract<'a>(&self, element: &B::Element<'a>) -> Result<Matches<B::Element<'a>>, Error<'a, B>> {
        let texts = self
            .matcher
            .select(self, element)?
            .iter()
            .filter_map(|found| B::text(found))
            .map(|text| B::lift(Value::String(text)))
            .collect();
        Ok(Matches::Many(texts))
    }

    fn box_clone(&self) -> Box<dyn SimpleExtractor<B>> {
        Box::new(self.clone())
    }
}

/// Selects one attribute of the elements matching a CSS selector
///
/// Matching elements without the attribute are skipped.
pub struct AttrCssExtractor<B: CssBackend> {
    matcher: CssMatcher<B>,
    attr: String,
    _backend: PhantomData<B>,
}

impl<B: CssBackend> AttrCssExtractor<B> {
    pub fn new(expr: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            matcher: CssMatcher::new(expr.into()),
            attr: attr.into(),
            _backend: PhantomData,
        }
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }

    pub fn set_attr(&mut self, attr: impl Into<String>) {
        self.attr = attr.into();
    }
}

impl<B: CssBackend> Clone for AttrCssExtractor<B> {
    fn clone(&self) -> Self {
        Self {
            matcher: self.matcher.clone(),
            attr: self.attr.clone(),
            _backend: PhantomData,
        }
    }
}

impl<B: CssBackend> fmt::Debug for AttrCssExtractor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AttrCssExtractor(expr={:?}, attr={:?})",
            self.matcher.expr, self.attr
        )
    }
}

impl<B: CssBackend> SimpleExtractor<B> for AttrCssExtractor<B> {
    fn expr(&self) -> &str {
        &self.matcher.expr
    }

    fn set_expr(&mut self, expr: String) {
        self.matcher.set_expr(expr);
    }

    fn compile(&self) -> Result<(), ExprError> {
        self.matcher.compiled(self).map(|_| ())
    }

    fn extract<'a>(&self, element: &B::Element<'a>) -> Result<Matches<B::Element<'a>>, Error<'a, B>> {
        let values = self
            .matcher
            .select(self, element)?
            .iter()
            .filter_map(|found| B::attribute(found, &self.attr))
            .map(|value| B::lift(Value::String(value)))
            .collect();
        Ok(Matches::Many(values))
    }

    fn box_clone(&self) -> Box<dyn SimpleExtractor<B>> {
        Box::new(self.clone())
    }
}
