//! Items used as plain selector extractors

use std::fmt;

use serde_json::Value;

use crate::backend::Backend;
use crate::error::{Error, ExprError};
use crate::item::{Item, Outcome};
use crate::selector::{Matches, SimpleExtractor};

/// An [`Item`] exposed through the [`SimpleExtractor`] interface
///
/// Built by [`Item::simplify`]. The wrapper owns a copy of the item, so later
/// changes to the original item do not affect it, and the other way around.
///
/// - [`extract`](SimpleExtractor::extract) always returns every assembled
///   mapping, ignoring the item's `is_many` and default.
/// - [`extract_first`](SimpleExtractor::extract_first) returns the first
///   mapping, else `default`, else the item's own default.
///
/// The selector expression is the one of the wrapped item, or empty when the
/// item has no selector.
///
/// # Examples
///
/// ```ignore
/// let users = Item::many(&user, JsonExtractor::new("data.users[*]")).simplify();
/// assert_eq!(format!("{users:?}"), r#"UserSimplified("data.users[*]")"#);
///
/// let first = users.extract_first(&data, None)?;
/// ```
pub struct Simplified<B: Backend> {
    item: Item<B>,
    expr: String,
}

impl<B: Backend> Simplified<B> {
    pub(crate) fn new(item: Item<B>) -> Self {
        Self {
            item,
            expr: String::new(),
        }
    }

    /// The wrapped copy of the item
    pub fn item(&self) -> &Item<B> {
        &self.item
    }

    pub fn into_item(self) -> Item<B> {
        self.item
    }
}

impl<B: Backend> Clone for Simplified<B> {
    fn clone(&self) -> Self {
        Self {
            item: self.item.clone(),
            expr: self.expr.clone(),
        }
    }
}

impl<B: Backend> fmt::Debug for Simplified<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Simplified({:?})", self.item.schema().name(), self.expr())
    }
}

impl<B: Backend> SimpleExtractor<B> for Simplified<B> {
    fn expr(&self) -> &str {
        match self.item.extractor() {
            Some(extractor) => extractor.expr(),
            None => &self.expr,
        }
    }

    fn set_expr(&mut self, expr: String) {
        match self.item.extractor_mut() {
            Some(extractor) => extractor.set_expr(expr),
            None => self.expr = expr,
        }
    }

    fn compile(&self) -> Result<(), ExprError> {
        match self.item.extractor() {
            Some(extractor) => extractor.compile(),
            None => Ok(()),
        }
    }

    fn extract<'a>(&self, element: &B::Element<'a>) -> Result<Matches<B::Element<'a>>, Error<'a, B>> {
        match self.item.collect(element, true, None)? {
            Outcome::Many(items) => Ok(Matches::Many(items)),
            Outcome::One(found) => Ok(Matches::Many(vec![found])),
        }
    }

    fn extract_first<'a>(
        &self,
        element: &B::Element<'a>,
        default: Option<Value>,
    ) -> Result<B::Element<'a>, Error<'a, B>> {
        let default = default.or_else(|| self.item.default().cloned());
        match self.item.collect(element, false, default.as_ref())? {
            Outcome::One(found) => Ok(found),
            Outcome::Many(items) => Ok(B::list(items)),
        }
    }

    fn box_clone(&self) -> Box<dyn SimpleExtractor<B>> {
        Box::new(self.clone())
    }
}
