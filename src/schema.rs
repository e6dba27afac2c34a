//! Schema declaration
//!
//! A [`Schema`] is the ordered set of children an [`Item`] assembles. It is
//! declared once, either at runtime with [`SchemaBuilder`] or at compile time
//! with `#[derive(ItemSchema)]`, and shared by every item built from it.
//!
//! # Examples
//!
//! ```ignore
//! use data_extractor::{Field, Json, JsonExtractor, Schema};
//!
//! let user = Schema::<Json>::builder("User")
//!     .field("uid", Field::new(JsonExtractor::new("id")))
//!     .field("username", Field::new(JsonExtractor::new("name")))
//!     .build()?;
//!
//! // Inherit the parent's children, override one and drop another
//! let admin = Schema::<Json>::builder("Admin")
//!     .extends(&user)
//!     .field("uid", Field::new(JsonExtractor::new("admin_id")))
//!     .remove("username")
//!     .build()?;
//!
//! assert_eq!(admin.field_names().collect::<Vec<_>>(), ["uid"]);
//! ```

use std::fs;
use std::panic::Location;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::backend::Backend;
use crate::error::DeclarationError;
use crate::item::{Child, Field, Item};

/// Keys that would shadow a parameter of `Field` and `Item` constructors
pub const RESERVED_PARAMETERS: [&str; 4] = ["extractor", "name", "default", "is_many"];

/// Keys that would shadow a method of `Item`
pub const RESERVED_METHODS: [&str; 6] = [
    "extract",
    "extract_first",
    "simplify",
    "field_names",
    "field",
    "schema",
];

/// Whether `key` is one of [`RESERVED_PARAMETERS`] or [`RESERVED_METHODS`]
///
/// Usable in constant evaluation; `#[derive(ItemSchema)]` checks member
/// names with it at compile time.
pub const fn is_reserved_key(key: &str) -> bool {
    listed(&RESERVED_PARAMETERS, key) || listed(&RESERVED_METHODS, key)
}

const fn listed(keys: &[&str], key: &str) -> bool {
    let mut index = 0;
    while index < keys.len() {
        if same(keys[index].as_bytes(), key.as_bytes()) {
            return true;
        }
        index += 1;
    }
    false
}

const fn same(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut index = 0;
    while index < left.len() {
        if left[index] != right[index] {
            return false;
        }
        index += 1;
    }
    true
}

/// How many lines after the call site are searched for the declared key
const SOURCE_LOOKAHEAD: usize = 8;

/// Ordered children of an item, shared between items built from it
pub struct Schema<B: Backend> {
    inner: Rc<SchemaInner<B>>,
}

struct SchemaInner<B: Backend> {
    name: String,
    fields: IndexMap<String, Child<B>>,
}

impl<B: Backend> Clone for SchemaInner<B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl<B: Backend> Schema<B> {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder<B> {
        SchemaBuilder::new(name)
    }

    /// Display name used when rendering items
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn len(&self) -> usize {
        self.inner.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.fields.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.fields.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Child<B>> {
        self.inner.fields.get(key)
    }

    /// Declared keys, in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.fields.keys().map(String::as_str)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &Child<B>)> + '_ {
        self.inner
            .fields
            .iter()
            .map(|(key, child)| (key.as_str(), child))
    }

    /// Copy-on-write access to a child
    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Child<B>> {
        Rc::make_mut(&mut self.inner).fields.get_mut(key)
    }
}

impl<B: Backend> Clone for Schema<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B: Backend> std::fmt::Debug for Schema<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.inner.fields.iter())
            .finish()
    }
}

/// Collects declared children into a [`Schema`]
///
/// Declaration order is preserved. Declaring a key again replaces the
/// previous child at its original position. The first reserved key declared
/// is reported by [`build`](SchemaBuilder::build).
pub struct SchemaBuilder<B: Backend> {
    name: String,
    fields: IndexMap<String, Child<B>>,
    removed: Vec<String>,
    error: Option<DeclarationError>,
}

impl<B: Backend> SchemaBuilder<B> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            removed: Vec::new(),
            error: None,
        }
    }

    /// Inherit the children of `parent`
    ///
    /// Inherited children come first, in the parent's order. Children
    /// declared earlier on this builder override inherited ones in place,
    /// and keys removed earlier stay removed.
    pub fn extends(mut self, parent: &Schema<B>) -> Self {
        let mut fields: IndexMap<String, Child<B>> = parent
            .inner
            .fields
            .iter()
            .filter(|(key, _)| !self.removed.contains(key))
            .map(|(key, child)| (key.clone(), child.clone()))
            .collect();
        for (key, child) in self.fields.drain(..) {
            fields.insert(key, child);
        }
        self.fields = fields;
        self
    }

    #[track_caller]
    pub fn field(self, key: &str, field: Field<B>) -> Self {
        let location = Location::caller();
        self.insert(key, Child::Field(field), location)
    }

    #[track_caller]
    pub fn item(self, key: &str, item: Item<B>) -> Self {
        let location = Location::caller();
        self.insert(key, Child::Item(item), location)
    }

    /// Declare anything implementing [`Declare`]; `None` removes the key
    #[track_caller]
    pub fn declare(self, key: &str, declaration: impl Declare<Backend = B>) -> Self {
        let location = Location::caller();
        match declaration.into_child() {
            Some(child) => self.insert(key, child, location),
            None => self.remove(key),
        }
    }

    /// Drop an inherited or previously declared child
    ///
    /// The key is also kept out of parents inherited later, until it is
    /// declared again.
    pub fn remove(mut self, key: &str) -> Self {
        self.fields.shift_remove(key);
        if !self.removed.iter().any(|removed| removed == key) {
            self.removed.push(key.to_string());
        }
        self
    }

    /// # Errors
    ///
    /// Returns a [`DeclarationError`] if a child was declared under a
    /// reserved key, see [`RESERVED_PARAMETERS`] and [`RESERVED_METHODS`].
    pub fn build(self) -> Result<Schema<B>, DeclarationError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        debug!(schema = %self.name, fields = self.fields.len(), "built schema");
        Ok(Schema {
            inner: Rc::new(SchemaInner {
                name: self.name,
                fields: self.fields,
            }),
        })
    }

    fn insert(mut self, key: &str, child: Child<B>, location: &'static Location<'static>) -> Self {
        if self.error.is_none() {
            self.error = check_key(&self.name, key, &child, location);
        }
        self.removed.retain(|removed| removed != key);
        self.fields.insert(key.to_string(), child);
        self
    }
}

/// Values that can be declared as a schema child
///
/// Implemented by [`Field`], [`Item`] and [`Child`]. `Option` declares its
/// content, or removes the key when `None`.
pub trait Declare {
    type Backend: Backend;

    fn into_child(self) -> Option<Child<Self::Backend>>;
}

impl<B: Backend> Declare for Field<B> {
    type Backend = B;

    fn into_child(self) -> Option<Child<B>> {
        Some(Child::Field(self))
    }
}

impl<B: Backend> Declare for Item<B> {
    type Backend = B;

    fn into_child(self) -> Option<Child<B>> {
        Some(Child::Item(self))
    }
}

impl<B: Backend> Declare for Child<B> {
    type Backend = B;

    fn into_child(self) -> Option<Child<B>> {
        Some(self)
    }
}

impl<T: Declare> Declare for Option<T> {
    type Backend = T::Backend;

    fn into_child(self) -> Option<Child<Self::Backend>> {
        self.and_then(Declare::into_child)
    }
}

/// A struct declaring a schema, usually through `#[derive(ItemSchema)]`
///
/// # Examples
///
/// ```ignore
/// use data_extractor::{Field, Item, ItemSchema, Json, JsonExtractor};
///
/// #[derive(ItemSchema)]
/// struct User {
///     uid: Field<Json>,
///     username: Field<Json>,
/// }
///
/// let schema = User {
///     uid: Field::new(JsonExtractor::new("id")),
///     username: Field::new(JsonExtractor::new("name")),
/// }
/// .schema()?;
///
/// let users = Item::many(&schema, JsonExtractor::new("data.users[*]"));
/// ```
pub trait ItemSchema {
    type Backend: Backend;

    fn schema(self) -> Result<Schema<Self::Backend>, DeclarationError>;
}

enum Reserved {
    Parameter,
    Method,
}

fn reserved(key: &str) -> Option<Reserved> {
    if listed(&RESERVED_PARAMETERS, key) {
        Some(Reserved::Parameter)
    } else if listed(&RESERVED_METHODS, key) {
        Some(Reserved::Method)
    } else {
        None
    }
}

fn check_key<B: Backend>(
    schema: &str,
    key: &str,
    child: &Child<B>,
    location: &'static Location<'static>,
) -> Option<DeclarationError> {
    let kind = reserved(key)?;
    let source = locate(location, key);
    let text = match &source {
        Some((_, _, text)) => text.clone(),
        None => format!("{key}={child:?}"),
    };

    let message = match kind {
        Reserved::Parameter => format!(
            "{text:?} overwrites the parameter {key:?} of {schema}. \
             Use the optional parameter name={key:?} in {child:?} to avoid overwriting it."
        ),
        Reserved::Method => format!(
            "{text:?} overwrites the method {key:?} of {schema}. \
             Use the optional parameter name={key:?} in {child:?} to avoid overwriting it."
        ),
    };

    let (line, column) = match &source {
        Some((line, column, _)) => (Some(*line), Some(*column)),
        None => (None, None),
    };

    Some(DeclarationError {
        message,
        schema: schema.to_string(),
        key: key.to_string(),
        file: source.as_ref().map(|_| location.file().to_string()),
        line,
        column,
        text,
    })
}

/// Find the source line declaring `key`, starting at the call site
///
/// Returns the line number, the column of its first non-blank character and
/// the trimmed line.
fn locate(location: &Location<'_>, key: &str) -> Option<(u32, u32, String)> {
    let source = fs::read_to_string(location.file()).ok()?;
    let start = usize::try_from(location.line()).ok()?.checked_sub(1)?;
    let needle = format!("\"{key}\"");

    let lines: Vec<&str> = source.lines().collect();
    let call_site = lines.get(start)?;
    let (index, line) = lines
        .iter()
        .enumerate()
        .skip(start)
        .take(SOURCE_LOOKAHEAD)
        .find(|(_, line)| line.contains(&needle))
        .unwrap_or((start, call_site));

    let number = u32::try_from(index + 1).ok()?;
    let indent = line.len() - line.trim_start().len();
    let column = u32::try_from(indent + 1).ok()?;
    Some((number, column, line.trim().to_string()))
}
