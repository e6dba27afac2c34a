//! Code generation for the ItemSchema trait implementation

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::DeriveInput;

use crate::parse::{ContainerAttrs, Member, Role};

/// Generate the complete ItemSchema trait implementation
pub fn generate_schema_impl(
    input: &DeriveInput,
    container_attrs: &ContainerAttrs,
    members: &[Member],
) -> TokenStream {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let schema_name = container_attrs
        .name
        .clone()
        .unwrap_or_else(|| name.to_string());

    let backend = generate_backend(members);

    // Parents first, so declared members override inherited children
    let parents = members
        .iter()
        .filter(|member| member.role() == Role::Extends)
        .map(|member| {
            let ident = &member.ident;
            quote! {
                let builder = builder.extends(&::data_extractor::ItemSchema::schema(self.#ident)?);
            }
        });

    let declarations = members
        .iter()
        .filter(|member| member.role() == Role::Declare)
        .map(|member| {
            let ident = &member.ident;
            let key = member.key();
            quote! {
                let builder = builder.declare(#key, self.#ident);
            }
        });

    let reserved = members
        .iter()
        .filter(|member| member.role() == Role::Declare)
        .map(|member| {
            let key = member.key();
            let message = format!(
                "'{key}' overwrites a reserved parameter or method of Item. \
                 Rename the member and use the optional parameter name=\"{key}\" instead"
            );
            quote_spanned! {member.ident.span()=>
                const _: () = ::core::assert!(!::data_extractor::is_reserved_key(#key), #message);
            }
        });

    quote! {
        #(#reserved)*

        impl #impl_generics ::data_extractor::ItemSchema for #name #ty_generics #where_clause {
            type Backend = #backend;

            fn schema(
                self,
            ) -> ::core::result::Result<
                ::data_extractor::Schema<Self::Backend>,
                ::data_extractor::DeclarationError,
            > {
                let builder = ::data_extractor::Schema::<Self::Backend>::builder(#schema_name);
                #(#parents)*
                #(#declarations)*
                builder.build()
            }
        }
    }
}

/// The backend is taken from the first member that carries one
fn generate_backend(members: &[Member]) -> TokenStream {
    let Some(member) = members.iter().find(|member| member.role() != Role::Skip) else {
        return quote! { ::data_extractor::Json };
    };

    let ty = &member.ty;
    match member.role() {
        Role::Extends => quote! { <#ty as ::data_extractor::ItemSchema>::Backend },
        _ => quote! { <#ty as ::data_extractor::Declare>::Backend },
    }
}
