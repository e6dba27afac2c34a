//! Validation logic for derive macro inputs

use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Data, DeriveInput, Error, Fields, Result};

use crate::parse::{Member, Role};
use crate::types;

/// Validate that the derive macro is only used on structs with named members
pub fn validate_named_struct(input: &DeriveInput) -> Result<&Punctuated<syn::Field, Comma>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            Fields::Unnamed(_) => Err(Error::new_spanned(
                input,
                "ItemSchema can only be derived for structs with named fields, not tuple structs",
            )),
            Fields::Unit => Err(Error::new_spanned(
                input,
                "ItemSchema can only be derived for structs with named fields, not unit structs",
            )),
        },
        Data::Enum(_) => Err(Error::new_spanned(
            input,
            "ItemSchema can only be derived for structs, not enums",
        )),
        Data::Union(_) => Err(Error::new_spanned(
            input,
            "ItemSchema can only be derived for structs, not unions",
        )),
    }
}

/// Validate one member: attributes and type
///
/// Reserved names are checked by the generated code, against the list the
/// runtime builder uses.
pub fn validate_member(field: &syn::Field, member: &Member) -> Result<()> {
    if member.attrs.extends && member.attrs.skip {
        return Err(Error::new_spanned(
            field,
            format!(
                "Field '{}' cannot have both 'extends' and 'skip' attributes",
                member.ident
            ),
        ));
    }

    if member.role() != Role::Declare {
        return Ok(());
    }

    if types::is_plain_data(&member.ty) {
        return Err(Error::new_spanned(
            &member.ty,
            format!(
                "Field '{}' must be a Field<_>, an Item<_> or an Option of those",
                member.ident
            ),
        ));
    }

    Ok(())
}

/// Validate that the backend of the schema can be inferred
pub fn validate_has_declarations(input: &DeriveInput, members: &[Member]) -> Result<()> {
    if members.iter().any(|member| member.role() != Role::Skip) {
        return Ok(());
    }

    Err(Error::new_spanned(
        &input.ident,
        "ItemSchema derive requires at least one declared or #[field(extends)] member",
    ))
}
