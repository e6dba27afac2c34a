//! Error types for selector evaluation, extraction and schema declaration
//!
//! Errors fall into two groups. Schema definition problems
//! ([`ConfigError`], [`DeclarationError`]) are reported once, while a field
//! or schema is being built. Runtime problems are reported by `extract` calls
//! through [`Error`]:
//!
//! - [`ExprError`] when a selector cannot be compiled or evaluated
//! - [`ExtractError`] when a singular field finds nothing and has no default
//! - [`Error::Parse`] when a typed field cannot convert the extracted text

use std::fmt;

use serde_json::Value;

use crate::backend::Backend;
use crate::item::Extractor;
use crate::json::JsonEngine;

/// Boxed error raised by an underlying selector engine
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// When a selector expression failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The expression could not be parsed
    Compile,
    /// The expression parsed but could not run against the given element
    Evaluate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Compile => f.write_str("compiling"),
            Stage::Evaluate => f.write_str("extracting"),
        }
    }
}

/// A selector expression is invalid or failed against an element
///
/// Always wraps the error raised by the selector engine. The `extractor`
/// field holds the rendering of the extractor that failed.
///
/// # Examples
///
/// ```ignore
/// use data_extractor::{Error, Stage, XPathExtractor, Xml};
///
/// let extractor = XPathExtractor::new("//div[");
/// match extractor.extract(&root) {
///     Err(Error::Expr(err)) => assert_eq!(err.stage, Stage::Compile),
///     other => panic!("unexpected result: {other:?}"),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
#[error("ExprError with {source} raised by {extractor} {stage}")]
pub struct ExprError {
    pub extractor: String,
    pub stage: Stage,
    #[source]
    pub source: BoxError,
}

impl ExprError {
    pub fn compile(extractor: &impl fmt::Debug, source: impl Into<BoxError>) -> Self {
        Self {
            extractor: format!("{extractor:?}"),
            stage: Stage::Compile,
            source: source.into(),
        }
    }

    pub fn evaluate(extractor: &impl fmt::Debug, source: impl Into<BoxError>) -> Self {
        Self {
            extractor: format!("{extractor:?}"),
            stage: Stage::Evaluate,
            source: source.into(),
        }
    }
}

/// A singular extraction found nothing and no default was configured
///
/// `extractors` is accumulated innermost first: `extractors[0]` is the
/// extractor that found no match and the last entry is the outermost item the
/// caller invoked. `element` is the element the innermost extractor was
/// evaluated against.
///
/// `Display` renders the full trace, outermost first:
///
/// ```text
/// ExtractError(Field(JsonExtractor("gender")), element={"id":3,"name":"Janine Gross"})
/// |-User(JsonExtractor("users[*]"), is_many=true)
///   |-Field(JsonExtractor("gender"))
///     |-{"id":3,"name":"Janine Gross"}
/// ```
pub struct ExtractError<'a, B: Backend> {
    pub element: B::Element<'a>,
    pub extractors: Vec<Extractor<B>>,
}

impl<'a, B: Backend> ExtractError<'a, B> {
    pub fn new(extractor: Extractor<B>, element: B::Element<'a>) -> Self {
        Self {
            element,
            extractors: vec![extractor],
        }
    }

    /// Record an enclosing extractor the failure propagated through
    pub fn push(&mut self, extractor: Extractor<B>) {
        self.extractors.push(extractor);
    }

    /// The extractor that found no match
    pub fn origin(&self) -> Option<&Extractor<B>> {
        self.extractors.first()
    }
}

impl<B: Backend> fmt::Debug for ExtractError<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExtractError(")?;
        if let Some(origin) = self.origin() {
            write!(f, "{origin:?}, ")?;
        }
        write!(f, "element={})", B::describe(&self.element))
    }
}

impl<B: Backend> fmt::Display for ExtractError<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self:?}")?;
        for (depth, extractor) in self.extractors.iter().rev().enumerate() {
            writeln!(f, "{}|-{extractor:?}", "  ".repeat(depth))?;
        }
        write!(
            f,
            "{}|-{}",
            "  ".repeat(self.extractors.len()),
            B::describe(&self.element)
        )
    }
}

impl<B: Backend> std::error::Error for ExtractError<'_, B> {}

/// Errors returned by `extract` and `extract_first`
#[derive(Debug, thiserror::Error)]
pub enum Error<'a, B: Backend> {
    #[error(transparent)]
    Expr(#[from] ExprError),

    #[error("{0}")]
    Extract(ExtractError<'a, B>),

    /// A typed field could not convert the text it extracted
    #[error("failed to convert {text:?} extracted by {field}: {source}")]
    Parse {
        field: String,
        text: String,
        #[source]
        source: ParseError,
    },
}

impl<'a, B: Backend> From<ExtractError<'a, B>> for Error<'a, B> {
    fn from(error: ExtractError<'a, B>) -> Self {
        Error::Extract(error)
    }
}

impl<'a, B: Backend> Error<'a, B> {
    /// Append an enclosing extractor to the trace of an [`ExtractError`]
    ///
    /// Other variants pass through untouched.
    pub(crate) fn traced(mut self, extractor: impl FnOnce() -> Extractor<B>) -> Self {
        if let Error::Extract(error) = &mut self {
            error.push(extractor());
        }
        self
    }

    pub fn as_extract(&self) -> Option<&ExtractError<'a, B>> {
        match self {
            Error::Extract(error) => Some(error),
            _ => None,
        }
    }
}

/// Invalid field configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A plural field always defaults to an empty list
    #[error("can't both set default={default} and is_many=true")]
    DefaultWithMany { default: Value },
}

/// A schema declares a field under a reserved name
///
/// The location fields are filled in when the source of the declaring call
/// site can be read. Otherwise they are `None` and `text` holds a
/// reconstructed `key=Field(...)` rendering of the declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}{}", location(.file, .line, .column, .text))]
pub struct DeclarationError {
    pub message: String,
    pub schema: String,
    pub key: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub text: String,
}

fn location(file: &Option<String>, line: &Option<u32>, column: &Option<u32>, text: &str) -> String {
    match (file, line) {
        (Some(file), Some(line)) => format!(
            "\n  --> {file}:{line}:{}\n    {text}",
            column.unwrap_or(1)
        ),
        _ => format!("\n    {text}"),
    }
}

/// Errors that can occur when converting extracted text into Rust types
///
/// # Examples
///
/// ```ignore
/// use data_extractor::{FromText, ParseError};
///
/// match i32::from_text("not a number") {
///     Ok(num) => println!("Parsed: {}", num),
///     Err(ParseError::InvalidNumber { text, error }) => {
///         eprintln!("Failed to parse '{}' as number: {}", text, error);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// Failed to parse an integer
    #[error("Invalid number: {text}")]
    InvalidNumber {
        text: String,
        #[source]
        error: std::num::ParseIntError,
    },

    /// Failed to parse a floating point number
    #[error("Invalid float: {text}")]
    InvalidFloat {
        text: String,
        #[source]
        error: std::num::ParseFloatError,
    },

    /// Failed to parse a boolean value
    ///
    /// Valid boolean values are:
    /// - true: "true", "1", "yes", "on"
    /// - false: "false", "0", "no", "off", ""
    #[error("Invalid boolean: {text}")]
    InvalidBool { text: String },

    /// The extracted value has no textual form (a list, a mapping or null)
    #[error("No text in {value}")]
    MissingText { value: String },

    /// Custom conversion error
    #[error("Custom parse error: {message}")]
    Custom { message: String },
}

/// A CSS selector could not be translated to XPath
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at position {position}")]
pub struct CssSyntaxError {
    pub message: String,
    pub position: usize,
}

/// A tree selector was evaluated against a value that is not a document node
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a document node, got {found}")]
pub struct NotANode {
    pub found: String,
}

/// JSONPath engine failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("no JSONPath engine is available, enable the `serde-json-path` or `jsonpath-lib` feature")]
    NoneAvailable,

    #[error("JSONPath engine {0} is not available in this build")]
    Unavailable(JsonEngine),

    #[error("{0}")]
    Query(String),
}
