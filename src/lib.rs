//! Declarative data extraction from JSON, XML and HTML
//!
//! Selector extractors ([`JsonExtractor`], [`XPathExtractor`],
//! [`HtmlXPathExtractor`], [`CssExtractor`] and friends) evaluate one expression against one element.
//! [`Field`]s give them an extraction policy and [`Item`]s assemble the
//! results of a [`Schema`] of children into mappings.
//!
//! ```ignore
//! use data_extractor::{Field, Item, Json, JsonExtractor, Schema};
//!
//! let user = Schema::<Json>::builder("User")
//!     .field("uid", Field::new(JsonExtractor::new("id")))
//!     .field("username", Field::new(JsonExtractor::new("name")))
//!     .build()?;
//!
//! let users = Item::many(&user, JsonExtractor::new("data.users[*]"));
//! let found = users.extract(&data)?;
//! ```

// Re-export the ItemSchema derive macro
pub use data_extractor_macros::ItemSchema;

// Core modules
mod backend;
mod css;
mod css_translate;
mod error;
mod extract;
mod item;
mod json;
mod schema;
mod selector;
mod simplify;
mod xpath;

// Public exports
pub use backend::{Backend, Html, HtmlValue, Json, NodeValue, TreeNode, Xml, XmlValue};
pub use css::{AttrCssExtractor, CssBackend, CssExtractor, TextCssExtractor};
pub use css_translate::{css_to_xpath, xpath_literal};
pub use error::{
    BoxError, ConfigError, CssSyntaxError, DeclarationError, EngineError, Error, ExprError,
    ExtractError, NotANode, ParseError, Stage,
};
pub use extract::{Converter, FromText, converter};
pub use item::{Child, Extractor, Field, FieldBuilder, Item, ItemBuilder};
pub use json::{
    ENGINE_ENV_VAR, JsonEngine, JsonExtractor, UnknownEngine, default_engine, normalize_path,
    set_default_engine,
};
pub use schema::{
    Declare, ItemSchema, RESERVED_METHODS, RESERVED_PARAMETERS, Schema, SchemaBuilder,
    is_reserved_key,
};
pub use selector::{Matches, SimpleExtractor};
pub use simplify::Simplified;
pub use xpath::{HtmlXPathExtractor, UnknownPrefix, XPathExtractor};
