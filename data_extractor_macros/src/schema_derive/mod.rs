use proc_macro2::TokenStream;
use syn::{DeriveInput, Result};

use crate::codegen;
use crate::parse::{ContainerAttrs, Member};
use crate::validate;

#[derive(Debug)]
pub struct SchemaDerive {
    input: DeriveInput,
    container_attrs: ContainerAttrs,
    members: Vec<Member>,
}

impl TryFrom<DeriveInput> for SchemaDerive {
    type Error = syn::Error;

    fn try_from(input: DeriveInput) -> Result<Self> {
        let fields = validate::validate_named_struct(&input)?;

        let container_attrs = ContainerAttrs::from_attributes(&input.attrs)?;

        let mut members = Vec::with_capacity(fields.len());
        for field in fields {
            let member = Member::from_field(field)?;
            validate::validate_member(field, &member)?;
            members.push(member);
        }

        validate::validate_has_declarations(&input, &members)?;

        Ok(Self {
            input,
            container_attrs,
            members,
        })
    }
}

impl SchemaDerive {
    pub fn generate_impl(&self) -> TokenStream {
        codegen::generate_schema_impl(&self.input, &self.container_attrs, &self.members)
    }
}
