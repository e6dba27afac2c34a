//! Type analysis utilities for member types

use syn::{GenericArgument, PathArguments, Type, TypePath};

/// Check if a type is Option<T>
pub fn is_option(ty: &Type) -> bool {
    last_ident(ty).is_some_and(|ident| ident == "Option")
}

/// Extract the inner type from Option<T>
pub fn extract_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(TypePath { path, .. }) = ty
        && let Some(segment) = path.segments.last()
        && let PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(GenericArgument::Type(inner)) = args.args.first()
    {
        return Some(inner);
    }
    None
}

/// Check if a type can never declare a schema child
///
/// We can't do trait resolution in proc macros, so this only catches the
/// standard types a member is most likely to be mistyped as. Anything else
/// is left to the `Declare` bound of the generated code.
pub fn is_plain_data(ty: &Type) -> bool {
    let ty = if is_option(ty) {
        extract_inner_type(ty).unwrap_or(ty)
    } else {
        ty
    };

    match ty {
        Type::Reference(_) | Type::Tuple(_) | Type::Array(_) | Type::Slice(_) => true,
        _ => last_ident(ty).is_some_and(|ident| {
            let standard_types = [
                "String", "str", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32",
                "u64", "u128", "usize", "f32", "f64", "bool", "char", "Vec", "HashMap", "Value",
            ];
            standard_types.contains(&ident.as_str())
        }),
    }
}

fn last_ident(ty: &Type) -> Option<String> {
    if let Type::Path(TypePath { path, .. }) = ty
        && let Some(segment) = path.segments.last()
    {
        return Some(segment.ident.to_string());
    }
    None
}
