//! JSONPath extraction over `serde_json::Value`
//!
//! [`JsonExtractor`] is a facade over interchangeable JSONPath engines, each
//! behind a cargo feature:
//!
//! | engine                      | feature           |
//! |-----------------------------|-------------------|
//! | [`JsonEngine::SerdeJsonPath`] | `serde-json-path` (default) |
//! | [`JsonEngine::JsonpathLib`]   | `jsonpath-lib`    |
//!
//! The engine used by an extractor is, in order: the one given to
//! [`JsonExtractor::with_engine`], the process-wide default set with
//! [`set_default_engine`], the engine named by the
//! `DATA_EXTRACTOR_JSONPATH_ENGINE` environment variable, and finally the
//! first engine compiled into the build. When none is available, the
//! extractor fails on first use with an [`ExprError`].

use std::cell::OnceCell;
use std::env;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{Backend, Json};
use crate::error::{BoxError, EngineError, Error, ExprError};
use crate::selector::{Matches, SimpleExtractor};

/// Environment variable naming the default JSONPath engine
pub const ENGINE_ENV_VAR: &str = "DATA_EXTRACTOR_JSONPATH_ENGINE";

static DEFAULT_ENGINE: RwLock<Option<JsonEngine>> = RwLock::new(None);

/// A JSONPath implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonEngine {
    /// RFC 9535 JSONPath from the `serde_json_path` crate
    SerdeJsonPath,
    /// The `jsonpath_lib` crate
    JsonpathLib,
}

impl JsonEngine {
    /// Every engine, in order of preference
    pub const ALL: [JsonEngine; 2] = [JsonEngine::SerdeJsonPath, JsonEngine::JsonpathLib];

    pub fn name(self) -> &'static str {
        match self {
            JsonEngine::SerdeJsonPath => "serde_json_path",
            JsonEngine::JsonpathLib => "jsonpath_lib",
        }
    }

    /// Whether the engine is compiled into this build
    pub fn is_available(self) -> bool {
        match self {
            JsonEngine::SerdeJsonPath => cfg!(feature = "serde-json-path"),
            JsonEngine::JsonpathLib => cfg!(feature = "jsonpath-lib"),
        }
    }

    /// Engines compiled into this build, in order of preference
    pub fn available() -> impl Iterator<Item = JsonEngine> {
        Self::ALL.into_iter().filter(|engine| engine.is_available())
    }
}

impl fmt::Display for JsonEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown JSONPath engine {0:?}")]
pub struct UnknownEngine(pub String);

impl FromStr for JsonEngine {
    type Err = UnknownEngine;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "serde_json_path" | "serde-json-path" => Ok(JsonEngine::SerdeJsonPath),
            "jsonpath_lib" | "jsonpath-lib" => Ok(JsonEngine::JsonpathLib),
            _ => Err(UnknownEngine(name.to_string())),
        }
    }
}

/// Set (or with `None`, clear) the process-wide default engine
///
/// Affects extractors compiled afterwards that were not given an engine
/// explicitly. Already compiled extractors keep their engine.
pub fn set_default_engine(engine: impl Into<Option<JsonEngine>>) {
    let engine = engine.into();
    debug!(?engine, "setting default JSONPath engine");
    *DEFAULT_ENGINE.write().unwrap_or_else(PoisonError::into_inner) = engine;
}

/// The engine used by extractors without an explicit engine
pub fn default_engine() -> Option<JsonEngine> {
    if let Some(engine) = *DEFAULT_ENGINE.read().unwrap_or_else(PoisonError::into_inner) {
        return Some(engine);
    }

    if let Ok(name) = env::var(ENGINE_ENV_VAR) {
        match name.parse() {
            Ok(engine) => return Some(engine),
            Err(err) => warn!(%err, "ignoring {ENGINE_ENV_VAR}"),
        }
    }

    JsonEngine::available().next()
}

/// Normalize an expression into an absolute JSONPath
///
/// `foo[*].baz` becomes `$.foo[*].baz`, `[0]` becomes `$[0]` and an empty
/// expression selects the root.
pub fn normalize_path(expr: &str) -> String {
    let expr = expr.trim();
    if expr.is_empty() {
        "$".to_string()
    } else if expr.starts_with('$') {
        expr.to_string()
    } else if expr.starts_with('[') {
        format!("${expr}")
    } else {
        format!("$.{expr}")
    }
}

enum CompiledPath {
    #[cfg(feature = "serde-json-path")]
    SerdeJsonPath(serde_json_path::JsonPath),
    #[cfg(feature = "jsonpath-lib")]
    JsonpathLib(jsonpath_lib::Compiled),
}

impl CompiledPath {
    fn compile(engine: JsonEngine, path: &str) -> Result<Self, BoxError> {
        match engine {
            #[cfg(feature = "serde-json-path")]
            JsonEngine::SerdeJsonPath => Ok(Self::SerdeJsonPath(serde_json_path::JsonPath::parse(path)?)),
            #[cfg(feature = "jsonpath-lib")]
            JsonEngine::JsonpathLib => jsonpath_lib::Compiled::compile(path)
                .map(Self::JsonpathLib)
                .map_err(|message| EngineError::Query(message).into()),
            #[allow(unreachable_patterns)]
            unavailable => Err(EngineError::Unavailable(unavailable).into()),
        }
    }

    fn query<'v>(&self, value: &'v Value) -> Result<Vec<&'v Value>, BoxError> {
        match *self {
            #[cfg(feature = "serde-json-path")]
            Self::SerdeJsonPath(ref path) => Ok(path.query(value).all()),
            #[cfg(feature = "jsonpath-lib")]
            Self::JsonpathLib(ref path) => Ok(path.select(value)?),
        }
    }
}

/// Evaluates a JSONPath expression against a JSON value
///
/// # Examples
///
/// ```ignore
/// use data_extractor::{JsonExtractor, Matches, SimpleExtractor};
/// use serde_json::json;
///
/// let data = json!({"foo": [{"baz": 1}, {"baz": 2}]});
/// let found = JsonExtractor::new("foo[*].baz").extract(&data)?;
/// assert_eq!(found, Matches::Many(vec![json!(1), json!(2)]));
/// ```
#[derive(Clone)]
pub struct JsonExtractor {
    expr: String,
    engine: Option<JsonEngine>,
    compiled: OnceCell<Rc<CompiledPath>>,
}

impl JsonExtractor {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            engine: None,
            compiled: OnceCell::new(),
        }
    }

    /// Create the extractor and compile it immediately
    pub fn build(expr: impl Into<String>) -> Result<Self, ExprError> {
        let extractor = Self::new(expr);
        extractor.compile()?;
        Ok(extractor)
    }

    /// Use a specific engine instead of the default one
    pub fn with_engine(mut self, engine: JsonEngine) -> Self {
        self.set_engine(Some(engine));
        self
    }

    pub fn set_engine(&mut self, engine: Option<JsonEngine>) {
        self.engine = engine;
        self.compiled.take();
    }

    /// The engine given explicitly, if any
    pub fn engine(&self) -> Option<JsonEngine> {
        self.engine
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    fn matcher(&self) -> Result<&CompiledPath, ExprError> {
        if let Some(compiled) = self.compiled.get() {
            return Ok(&**compiled);
        }

        let engine = self
            .engine
            .or_else(default_engine)
            .ok_or_else(|| ExprError::compile(self, EngineError::NoneAvailable))?;
        let path = normalize_path(&self.expr);
        let compiled =
            CompiledPath::compile(engine, &path).map_err(|err| ExprError::compile(self, err))?;
        debug!(%path, %engine, "compiled JSONPath expression");

        Ok(&**self.compiled.get_or_init(|| Rc::new(compiled)))
    }
}

impl fmt::Debug for JsonExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JsonExtractor").field(&self.expr).finish()
    }
}

impl SimpleExtractor<Json> for JsonExtractor {
    fn expr(&self) -> &str {
        &self.expr
    }

    fn set_expr(&mut self, expr: String) {
        self.expr = expr;
        self.compiled.take();
    }

    fn compile(&self) -> Result<(), ExprError> {
        self.matcher().map(|_| ())
    }

    fn extract<'a>(
        &self,
        element: &<Json as Backend>::Element<'a>,
    ) -> Result<Matches<<Json as Backend>::Element<'a>>, Error<'a, Json>> {
        let found = self
            .matcher()?
            .query(element)
            .map_err(|err| ExprError::evaluate(self, err))?;
        Ok(Matches::Many(found.into_iter().cloned().collect()))
    }

    fn box_clone(&self) -> Box<dyn SimpleExtractor<Json>> {
        Box::new(self.clone())
    }
}
