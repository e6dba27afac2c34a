//! Attribute parsing for #[schema(...)] and #[field(...)] attributes

use syn::{Attribute, Ident, Lit, Result, Type};

/// Container-level attributes from #[schema(...)]
#[derive(Debug, Default, Clone)]
pub struct ContainerAttrs {
    /// Display name of the schema (e.g., #[schema(name = "User")])
    pub name: Option<String>,
}

/// Field-level attributes from #[field(...)]
#[derive(Debug, Default, Clone)]
pub struct FieldAttrs {
    /// The member holds a parent schema (e.g., #[field(extends)])
    pub extends: bool,

    /// The member is ignored (e.g., #[field(skip)])
    pub skip: bool,
}

/// What a struct member contributes to the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Declare,
    Extends,
    Skip,
}

/// A named struct member with its parsed attributes
#[derive(Debug, Clone)]
pub struct Member {
    pub ident: Ident,
    pub ty: Type,
    pub attrs: FieldAttrs,
}

impl ContainerAttrs {
    /// Parse container attributes from a list of attributes
    pub fn from_attributes(attrs: &[Attribute]) -> Result<Self> {
        let mut container_attrs = ContainerAttrs::default();

        for attr in attrs {
            if !attr.path().is_ident("schema") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value = meta.value()?;
                    let lit: Lit = value.parse()?;
                    if let Lit::Str(s) = lit {
                        container_attrs.name = Some(s.value());
                    } else {
                        return Err(meta.error("name must be a string literal"));
                    }
                    Ok(())
                } else {
                    Err(meta.error("unknown schema attribute"))
                }
            })?;
        }

        Ok(container_attrs)
    }
}

impl FieldAttrs {
    /// Parse field attributes from a list of attributes
    pub fn from_attributes(attrs: &[Attribute]) -> Result<Self> {
        let mut field_attrs = FieldAttrs::default();

        for attr in attrs {
            if !attr.path().is_ident("field") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("extends") {
                    field_attrs.extends = true;
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    field_attrs.skip = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown field attribute, expected `extends` or `skip`"))
                }
            })?;
        }

        Ok(field_attrs)
    }
}

impl Member {
    pub fn from_field(field: &syn::Field) -> Result<Self> {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "schema members must be named"));
        };

        Ok(Self {
            ident,
            ty: field.ty.clone(),
            attrs: FieldAttrs::from_attributes(&field.attrs)?,
        })
    }

    pub fn role(&self) -> Role {
        if self.attrs.skip {
            Role::Skip
        } else if self.attrs.extends {
            Role::Extends
        } else {
            Role::Declare
        }
    }

    /// Key of the declared child, without any raw identifier prefix
    pub fn key(&self) -> String {
        let key = self.ident.to_string();
        match key.strip_prefix("r#") {
            Some(stripped) => stripped.to_string(),
            None => key,
        }
    }
}
