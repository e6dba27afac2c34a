//! Typed conversion of extracted text
//!
//! A typed field reads the text of each extracted element and converts it
//! with a [`Converter`]. [`FromText`] covers the common scalar types; any
//! closure can be used through [`FieldBuilder::convert`](crate::FieldBuilder::convert).

use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use crate::error::ParseError;

/// Converts the text of an extracted element into a JSON value
pub type Converter = Rc<dyn Fn(&str) -> Result<Value, ParseError>>;

/// Trait for types that can be parsed from extracted text
///
/// # Examples
///
/// ```ignore
/// use data_extractor::FromText;
///
/// let number: i32 = FromText::from_text(" 42 ")?;
/// assert_eq!(number, 42);
/// ```
///
/// # Implementing FromText
///
/// ```ignore
/// use data_extractor::{FromText, ParseError};
///
/// #[derive(serde::Serialize)]
/// struct Price(f64);
///
/// impl FromText for Price {
///     fn from_text(text: &str) -> Result<Self, ParseError> {
///         let amount = text.trim().trim_start_matches('$');
///         f64::from_text(amount).map(Price)
///     }
/// }
/// ```
pub trait FromText: Sized {
    fn from_text(text: &str) -> Result<Self, ParseError>;
}

/// Build a [`Converter`] parsing text as `T`
pub fn converter<T: FromText + Serialize>() -> Converter {
    Rc::new(|text| {
        let value = T::from_text(text)?;
        serde_json::to_value(value).map_err(|err| ParseError::Custom {
            message: err.to_string(),
        })
    })
}

// No parsing needed, just trim whitespace
impl FromText for String {
    fn from_text(text: &str) -> Result<Self, ParseError> {
        Ok(text.trim().to_string())
    }
}

macro_rules! from_text_integer {
    ($($ty:ty),*) => {
        $(
            impl FromText for $ty {
                fn from_text(text: &str) -> Result<Self, ParseError> {
                    text.trim()
                        .parse()
                        .map_err(|error| ParseError::InvalidNumber {
                            text: text.to_string(),
                            error,
                        })
                }
            }
        )*
    };
}

macro_rules! from_text_float {
    ($($ty:ty),*) => {
        $(
            impl FromText for $ty {
                fn from_text(text: &str) -> Result<Self, ParseError> {
                    text.trim()
                        .parse()
                        .map_err(|error| ParseError::InvalidFloat {
                            text: text.to_string(),
                            error,
                        })
                }
            }
        )*
    };
}

from_text_integer!(i32, u32, i64, u64);
from_text_float!(f32, f64);

impl FromText for bool {
    fn from_text(text: &str) -> Result<Self, ParseError> {
        let trimmed = text.trim().to_lowercase();
        match trimmed.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            _ => Err(ParseError::InvalidBool {
                text: text.to_string(),
            }),
        }
    }
}

// Blank or unparsable text becomes None instead of an error
impl<T: FromText> FromText for Option<T> {
    fn from_text(text: &str) -> Result<Self, ParseError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        Ok(T::from_text(text).ok())
    }
}

// Comma-separated values
impl<T: FromText> FromText for Vec<T> {
    fn from_text(text: &str) -> Result<Self, ParseError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        text.split(',')
            .map(|s| T::from_text(s.trim()))
            .collect::<Result<Vec<_>, _>>()
    }
}
