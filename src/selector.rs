//! The selector extractor contract
//!
//! A [`SimpleExtractor`] wraps one selector expression and evaluates it
//! against one element. Expressions compile lazily on first use; changing the
//! expression with [`SimpleExtractor::set_expr`] discards the compiled form.

use std::fmt;

use serde_json::Value;

use crate::backend::Backend;
use crate::error::{Error, ExprError, ExtractError};
use crate::item::Extractor;

/// Result of evaluating a selector expression
#[derive(Debug, Clone, PartialEq)]
pub enum Matches<E> {
    /// Zero or more matches in the engine's native order
    Many(Vec<E>),
    /// An inherently scalar result, such as an XPath `count(...)` or `string(...)`
    Scalar(E),
}

impl<E> Matches<E> {
    pub fn len(&self) -> usize {
        match self {
            Matches::Many(items) => items.len(),
            Matches::Scalar(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Matches::Scalar(_))
    }

    /// The first match; the scalar itself for scalar results
    pub fn first(self) -> Option<E> {
        match self {
            Matches::Many(items) => items.into_iter().next(),
            Matches::Scalar(value) => Some(value),
        }
    }

    /// All matches; a scalar result becomes its only match
    pub fn into_vec(self) -> Vec<E> {
        match self {
            Matches::Many(items) => items,
            Matches::Scalar(value) => vec![value],
        }
    }
}

impl<E> From<Vec<E>> for Matches<E> {
    fn from(items: Vec<E>) -> Self {
        Matches::Many(items)
    }
}

/// A single selector expression evaluated against one element
pub trait SimpleExtractor<B: Backend>: fmt::Debug {
    /// The selector text
    fn expr(&self) -> &str;

    /// Replace the selector text; the next use recompiles it
    fn set_expr(&mut self, expr: String);

    /// Compile the expression now if it is not compiled yet
    fn compile(&self) -> Result<(), ExprError>;

    /// Evaluate the expression against `element`
    fn extract<'a>(&self, element: &B::Element<'a>) -> Result<Matches<B::Element<'a>>, Error<'a, B>>;

    /// The first match
    ///
    /// Falls back to `default` when nothing matched, and fails with an
    /// [`ExtractError`] carrying this extractor when there is no default
    /// either. Scalar results are returned as they are.
    fn extract_first<'a>(
        &self,
        element: &B::Element<'a>,
        default: Option<Value>,
    ) -> Result<B::Element<'a>, Error<'a, B>> {
        match self.extract(element)?.first() {
            Some(found) => Ok(found),
            None => match default {
                Some(default) => Ok(B::lift(default)),
                None => Err(ExtractError::new(
                    Extractor::Simple(self.box_clone()),
                    element.clone(),
                )
                .into()),
            },
        }
    }

    fn box_clone(&self) -> Box<dyn SimpleExtractor<B>>;
}

impl<B: Backend> Clone for Box<dyn SimpleExtractor<B>> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}
