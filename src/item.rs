//! Declarative fields and items
//!
//! A [`Field`] binds a selector extractor to an extraction policy: singular
//! or plural, an optional default and an optional typed conversion. An
//! [`Item`] is a field whose extracted elements are assembled into mappings
//! by the children declared in its [`Schema`].
//!
//! # Extraction rules
//!
//! - Without a selector, the input element itself is the match (or its items
//!   when it already is a sequence).
//! - A plural field returns every match, possibly none.
//! - A singular field returns its first match, else its default, else fails
//!   with an [`ExtractError`] naming the field and the element.
//!
//! # Examples
//!
//! ```ignore
//! use data_extractor::{Field, Item, Json, JsonExtractor, Schema};
//! use serde_json::json;
//!
//! let user = Schema::<Json>::builder("User")
//!     .field("uid", Field::new(JsonExtractor::new("id")))
//!     .field("username", Field::builder().extractor(JsonExtractor::new("name")).name("name").build()?)
//!     .build()?;
//!
//! let users = Item::many(&user, JsonExtractor::new("data.users[*]"));
//! let data = json!({"data": {"users": [{"id": 0, "name": "Vang Stout"}]}});
//! assert_eq!(users.extract(&data)?, json!([{"uid": 0, "name": "Vang Stout"}]));
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::backend::Backend;
use crate::error::{ConfigError, Error, ExtractError, ParseError};
use crate::extract::{Converter, FromText, converter};
use crate::schema::Schema;
use crate::selector::{Matches, SimpleExtractor};
use crate::simplify::Simplified;

/// What a singular or plural extraction produced
pub(crate) enum Outcome<E> {
    One(E),
    Many(Vec<E>),
}

/// The extraction algorithm shared by fields, items and simplified items
///
/// `trace` names the extractor recorded when a singular extraction finds
/// nothing and has no default. `transform` is applied to each match kept.
pub(crate) fn collect<'a, B: Backend>(
    extractor: Option<&dyn SimpleExtractor<B>>,
    element: &B::Element<'a>,
    is_many: bool,
    default: Option<&Value>,
    trace: impl FnOnce() -> Extractor<B>,
    mut transform: impl FnMut(B::Element<'a>) -> Result<B::Element<'a>, Error<'a, B>>,
) -> Result<Outcome<B::Element<'a>>, Error<'a, B>> {
    let matches = match extractor {
        Some(extractor) => extractor.extract(element)?,
        None => match B::as_sequence(element) {
            Some(items) => Matches::Many(items.to_vec()),
            None => Matches::Many(vec![element.clone()]),
        },
    };

    if is_many {
        if matches.is_scalar() {
            warn!(
                ?extractor,
                "plural extraction got a scalar result, treating it as the only match"
            );
        }
        let items = matches
            .into_vec()
            .into_iter()
            .map(&mut transform)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Outcome::Many(items));
    }

    match matches.first() {
        Some(found) => transform(found).map(Outcome::One),
        None => match default {
            Some(default) => Ok(Outcome::One(B::lift(default.clone()))),
            None => Err(ExtractError::new(trace(), element.clone()).into()),
        },
    }
}

fn wrap<'a, B: Backend>(outcome: Outcome<B::Element<'a>>) -> B::Element<'a> {
    match outcome {
        Outcome::One(found) => found,
        Outcome::Many(items) => B::list(items),
    }
}

fn check_default(default: Option<&Value>, is_many: bool) -> Result<(), ConfigError> {
    match default {
        Some(default) if is_many => Err(ConfigError::DefaultWithMany {
            default: default.clone(),
        }),
        _ => Ok(()),
    }
}

/// The atomic declarative extraction unit
pub struct Field<B: Backend> {
    extractor: Option<Box<dyn SimpleExtractor<B>>>,
    name: Option<String>,
    default: Option<Value>,
    is_many: bool,
    converter: Option<Converter>,
}

impl<B: Backend> Field<B> {
    /// A singular field without default
    pub fn new(extractor: impl SimpleExtractor<B> + 'static) -> Self {
        Self {
            extractor: Some(Box::new(extractor)),
            ..Self::bare()
        }
    }

    /// A plural field
    pub fn many(extractor: impl SimpleExtractor<B> + 'static) -> Self {
        Self {
            is_many: true,
            ..Self::new(extractor)
        }
    }

    /// A field without selector, operating on the input element itself
    pub fn bare() -> Self {
        Self {
            extractor: None,
            name: None,
            default: None,
            is_many: false,
            converter: None,
        }
    }

    pub fn builder() -> FieldBuilder<B> {
        FieldBuilder::new()
    }

    pub fn extractor(&self) -> Option<&dyn SimpleExtractor<B>> {
        self.extractor.as_deref()
    }

    /// Mutable access to the selector, e.g. to change its expression
    pub fn extractor_mut(&mut self) -> Option<&mut (dyn SimpleExtractor<B> + 'static)> {
        self.extractor.as_deref_mut()
    }

    pub fn set_extractor(&mut self, extractor: Option<Box<dyn SimpleExtractor<B>>>) {
        self.extractor = extractor;
    }

    /// Output key override used when nested in an item
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// The configured default; `None` means no default, not a `null` default
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn set_default(&mut self, default: Option<Value>) -> Result<(), ConfigError> {
        check_default(default.as_ref(), self.is_many)?;
        self.default = default;
        Ok(())
    }

    pub fn is_many(&self) -> bool {
        self.is_many
    }

    pub fn set_many(&mut self, is_many: bool) -> Result<(), ConfigError> {
        check_default(self.default.as_ref(), is_many)?;
        self.is_many = is_many;
        Ok(())
    }

    pub fn set_converter(&mut self, converter: Option<Converter>) {
        self.converter = converter;
    }

    /// Extract from `element`
    ///
    /// Plural fields return a list of every match.
    pub fn extract<'a>(&self, element: &B::Element<'a>) -> Result<B::Element<'a>, Error<'a, B>> {
        collect(
            self.extractor(),
            element,
            self.is_many,
            self.default.as_ref(),
            || Extractor::Field(self.clone()),
            |found| self.transform(found),
        )
        .map(wrap::<B>)
    }

    fn transform<'a>(&self, found: B::Element<'a>) -> Result<B::Element<'a>, Error<'a, B>> {
        let Some(converter) = &self.converter else {
            return Ok(found);
        };

        let Some(text) = B::text(&found) else {
            return Err(Error::Parse {
                field: format!("{self:?}"),
                text: String::new(),
                source: ParseError::MissingText {
                    value: B::describe(&found),
                },
            });
        };

        match converter(&text) {
            Ok(value) => Ok(B::lift(value)),
            Err(source) => Err(Error::Parse {
                field: format!("{self:?}"),
                text,
                source,
            }),
        }
    }

    fn fmt_args(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut args = Vec::new();
        if let Some(extractor) = &self.extractor {
            args.push(format!("{extractor:?}"));
        }
        if let Some(name) = &self.name {
            args.push(format!("name={name:?}"));
        }
        if let Some(default) = &self.default {
            args.push(format!("default={default}"));
        }
        if self.is_many {
            args.push("is_many=true".to_string());
        }
        write!(f, "({})", args.join(", "))
    }
}

impl<B: Backend> Clone for Field<B> {
    fn clone(&self) -> Self {
        Self {
            extractor: self.extractor.clone(),
            name: self.name.clone(),
            default: self.default.clone(),
            is_many: self.is_many,
            converter: self.converter.clone(),
        }
    }
}

impl<B: Backend> fmt::Debug for Field<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Field")?;
        self.fmt_args(f)
    }
}

/// Builder for fields with a name override, a default or a conversion
///
/// # Examples
///
/// ```ignore
/// let price = Field::<Xml>::builder()
///     .extractor(XPathExtractor::new("//span[@class='price']/text()"))
///     .default(0.0)
///     .parse::<f64>()
///     .build()?;
/// ```
pub struct FieldBuilder<B: Backend> {
    field: Field<B>,
}

impl<B: Backend> FieldBuilder<B> {
    pub fn new() -> Self {
        Self {
            field: Field::bare(),
        }
    }

    pub fn extractor(mut self, extractor: impl SimpleExtractor<B> + 'static) -> Self {
        self.field.extractor = Some(Box::new(extractor));
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.field.name = Some(name.into());
        self
    }

    /// Value returned when a singular field finds nothing
    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.field.default = Some(default.into());
        self
    }

    pub fn many(self) -> Self {
        self.is_many(true)
    }

    pub fn is_many(mut self, is_many: bool) -> Self {
        self.field.is_many = is_many;
        self
    }

    /// Parse the text of each match as `T`
    pub fn parse<T: FromText + Serialize>(mut self) -> Self {
        self.field.converter = Some(converter::<T>());
        self
    }

    /// Convert the text of each match with a closure
    pub fn convert(mut self, convert: impl Fn(&str) -> Result<Value, ParseError> + 'static) -> Self {
        self.field.converter = Some(std::rc::Rc::new(convert));
        self
    }

    /// Validate and build the field
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DefaultWithMany`] if a default is set on a
    /// plural field.
    pub fn build(self) -> Result<Field<B>, ConfigError> {
        check_default(self.field.default.as_ref(), self.field.is_many)?;
        Ok(self.field)
    }
}

/// A field assembling a mapping from the children of its schema
pub struct Item<B: Backend> {
    field: Field<B>,
    schema: Schema<B>,
}

impl<B: Backend> Item<B> {
    /// A singular item
    pub fn new(schema: &Schema<B>, extractor: impl SimpleExtractor<B> + 'static) -> Self {
        Self {
            field: Field::new(extractor),
            schema: schema.clone(),
        }
    }

    /// A plural item
    pub fn many(schema: &Schema<B>, extractor: impl SimpleExtractor<B> + 'static) -> Self {
        Self {
            field: Field::many(extractor),
            schema: schema.clone(),
        }
    }

    /// An item assembled from the input element itself
    pub fn bare(schema: &Schema<B>) -> Self {
        Self {
            field: Field::bare(),
            schema: schema.clone(),
        }
    }

    pub fn builder(schema: &Schema<B>) -> ItemBuilder<B> {
        ItemBuilder {
            item: Self::bare(schema),
        }
    }

    pub fn schema(&self) -> &Schema<B> {
        &self.schema
    }

    /// Names of the declared children, in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.schema.field_names()
    }

    pub fn field(&self, key: &str) -> Option<&Child<B>> {
        self.schema.get(key)
    }

    /// Mutable access to a child
    ///
    /// The schema is copied first if other items share it, so the change
    /// only affects this item.
    pub fn field_mut(&mut self, key: &str) -> Option<&mut Child<B>> {
        self.schema.get_mut(key)
    }

    pub fn extractor(&self) -> Option<&dyn SimpleExtractor<B>> {
        self.field.extractor()
    }

    pub fn extractor_mut(&mut self) -> Option<&mut (dyn SimpleExtractor<B> + 'static)> {
        self.field.extractor_mut()
    }

    pub fn set_extractor(&mut self, extractor: Option<Box<dyn SimpleExtractor<B>>>) {
        self.field.set_extractor(extractor);
    }

    pub fn name(&self) -> Option<&str> {
        self.field.name()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.field.set_name(name);
    }

    pub fn default(&self) -> Option<&Value> {
        self.field.default()
    }

    pub fn set_default(&mut self, default: Option<Value>) -> Result<(), ConfigError> {
        self.field.set_default(default)
    }

    pub fn is_many(&self) -> bool {
        self.field.is_many()
    }

    pub fn set_many(&mut self, is_many: bool) -> Result<(), ConfigError> {
        self.field.set_many(is_many)
    }

    /// Extract one mapping, or a list of mappings for a plural item
    ///
    /// When a child fails with an [`ExtractError`], this item is appended to
    /// the error's trace before it propagates.
    pub fn extract<'a>(&self, element: &B::Element<'a>) -> Result<B::Element<'a>, Error<'a, B>> {
        self.collect(element, self.is_many(), self.default())
            .map(wrap::<B>)
    }

    /// The first mapping, regardless of `is_many`
    ///
    /// Falls back to `default` (or the item's own default) when the selector
    /// matches nothing.
    pub fn extract_first<'a>(
        &self,
        element: &B::Element<'a>,
        default: Option<Value>,
    ) -> Result<B::Element<'a>, Error<'a, B>> {
        self.simplify().extract_first(element, default)
    }

    /// A selector extractor backed by a copy of this item
    ///
    /// See [`Simplified`].
    pub fn simplify(&self) -> Simplified<B> {
        Simplified::new(self.clone())
    }

    pub(crate) fn collect<'a>(
        &self,
        element: &B::Element<'a>,
        is_many: bool,
        default: Option<&Value>,
    ) -> Result<Outcome<B::Element<'a>>, Error<'a, B>> {
        collect(
            self.extractor(),
            element,
            is_many,
            default,
            || Extractor::Item(self.clone()),
            |found| self.assemble(found),
        )
    }

    fn assemble<'a>(&self, element: B::Element<'a>) -> Result<B::Element<'a>, Error<'a, B>> {
        let mut entries = IndexMap::with_capacity(self.schema.len());
        for (key, child) in self.schema.children() {
            let value = child
                .extract(&element)
                .map_err(|err| err.traced(|| Extractor::Item(self.clone())))?;
            entries.insert(child.name().unwrap_or(key).to_string(), value);
        }
        Ok(B::map(entries))
    }
}

impl<B: Backend> Clone for Item<B> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            schema: self.schema.clone(),
        }
    }
}

impl<B: Backend> fmt::Debug for Item<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema.name())?;
        self.field.fmt_args(f)
    }
}

/// Builder for items with a name override or a default
pub struct ItemBuilder<B: Backend> {
    item: Item<B>,
}

impl<B: Backend> ItemBuilder<B> {
    pub fn extractor(mut self, extractor: impl SimpleExtractor<B> + 'static) -> Self {
        self.item.field.extractor = Some(Box::new(extractor));
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.item.field.name = Some(name.into());
        self
    }

    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.item.field.default = Some(default.into());
        self
    }

    pub fn many(self) -> Self {
        self.is_many(true)
    }

    pub fn is_many(mut self, is_many: bool) -> Self {
        self.item.field.is_many = is_many;
        self
    }

    pub fn build(self) -> Result<Item<B>, ConfigError> {
        check_default(self.item.default(), self.item.is_many())?;
        Ok(self.item)
    }
}

/// A child declared in a schema
pub enum Child<B: Backend> {
    Field(Field<B>),
    Item(Item<B>),
}

impl<B: Backend> Child<B> {
    pub fn extract<'a>(&self, element: &B::Element<'a>) -> Result<B::Element<'a>, Error<'a, B>> {
        match self {
            Child::Field(field) => field.extract(element),
            Child::Item(item) => item.extract(element),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Child::Field(field) => field.name(),
            Child::Item(item) => item.name(),
        }
    }

    pub fn is_many(&self) -> bool {
        match self {
            Child::Field(field) => field.is_many(),
            Child::Item(item) => item.is_many(),
        }
    }

    pub fn as_field(&self) -> Option<&Field<B>> {
        match self {
            Child::Field(field) => Some(field),
            Child::Item(_) => None,
        }
    }

    pub fn as_field_mut(&mut self) -> Option<&mut Field<B>> {
        match self {
            Child::Field(field) => Some(field),
            Child::Item(_) => None,
        }
    }

    pub fn as_item(&self) -> Option<&Item<B>> {
        match self {
            Child::Item(item) => Some(item),
            Child::Field(_) => None,
        }
    }

    pub fn as_item_mut(&mut self) -> Option<&mut Item<B>> {
        match self {
            Child::Item(item) => Some(item),
            Child::Field(_) => None,
        }
    }
}

impl<B: Backend> Clone for Child<B> {
    fn clone(&self) -> Self {
        match self {
            Child::Field(field) => Child::Field(field.clone()),
            Child::Item(item) => Child::Item(item.clone()),
        }
    }
}

impl<B: Backend> fmt::Debug for Child<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Field(field) => field.fmt(f),
            Child::Item(item) => item.fmt(f),
        }
    }
}

impl<B: Backend> From<Field<B>> for Child<B> {
    fn from(field: Field<B>) -> Self {
        Child::Field(field)
    }
}

impl<B: Backend> From<Item<B>> for Child<B> {
    fn from(item: Item<B>) -> Self {
        Child::Item(item)
    }
}

/// Any extractor that can appear in an [`ExtractError`] trace
pub enum Extractor<B: Backend> {
    Simple(Box<dyn SimpleExtractor<B>>),
    Field(Field<B>),
    Item(Item<B>),
}

impl<B: Backend> Extractor<B> {
    pub fn as_field(&self) -> Option<&Field<B>> {
        match self {
            Extractor::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<&Item<B>> {
        match self {
            Extractor::Item(item) => Some(item),
            _ => None,
        }
    }
}

impl<B: Backend> Clone for Extractor<B> {
    fn clone(&self) -> Self {
        match self {
            Extractor::Simple(simple) => Extractor::Simple(simple.clone()),
            Extractor::Field(field) => Extractor::Field(field.clone()),
            Extractor::Item(item) => Extractor::Item(item.clone()),
        }
    }
}

impl<B: Backend> fmt::Debug for Extractor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extractor::Simple(simple) => simple.fmt(f),
            Extractor::Field(field) => field.fmt(f),
            Extractor::Item(item) => item.fmt(f),
        }
    }
}
