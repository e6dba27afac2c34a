use proc_macro_error::{abort, proc_macro_error};
use syn::parse_macro_input;

use schema_derive::SchemaDerive;

mod codegen;
mod parse;
mod schema_derive;
mod types;
mod validate;

/// Derive macro for the ItemSchema trait
///
/// Every member of the struct declares one child of the schema under the
/// member's name, in member order. Members must be `Field<B>`, `Item<B>`, or
/// an `Option` of those; a `None` member removes a child inherited from a
/// parent schema.
///
/// # Container Attributes
///
/// - `#[schema(name = "...")]` - Display name of the schema (defaults to the struct name)
///
/// # Field Attributes
///
/// - `#[field(extends)]` - The member is a parent schema whose children are inherited
/// - `#[field(skip)]` - The member is not part of the schema
///
/// Member names that would shadow a constructor parameter or an item method
/// (see `data_extractor::RESERVED_PARAMETERS` and
/// `data_extractor::RESERVED_METHODS`) are rejected at compile time.
///
/// # Examples
///
/// ## Basic Usage
///
/// ```ignore
/// use data_extractor::{Field, ItemSchema, Json, JsonExtractor};
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
/// ```
///
/// ## Nested Items
///
/// ```ignore
/// #[derive(ItemSchema)]
/// struct Article {
///     title: Field<Xml>,
///     comments: Item<Xml>,
/// }
/// ```
///
/// ## Inheritance
///
/// ```ignore
/// #[derive(ItemSchema)]
/// #[schema(name = "Admin")]
/// struct AdminUser {
///     #[field(extends)]
///     base: User,
///
///     // Removes the inherited child
///     username: Option<Field<Json>>,
///
///     level: Field<Json>,
/// }
/// ```
#[proc_macro_error]
#[proc_macro_derive(ItemSchema, attributes(schema, field))]
pub fn item_schema_derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as syn::DeriveInput);
    match SchemaDerive::try_from(input) {
        Ok(schema) => schema.generate_impl().into(),
        Err(err) => abort!(err.span(), "{}", err),
    }
}
