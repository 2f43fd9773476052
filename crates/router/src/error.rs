use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while compiling a path pattern.
///
/// These are registration-time failures: they surface from
/// [`RouterBuilder::build`](crate::RouterBuilder::build) and never during request
/// dispatch.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern {pattern:?} must start with '/'")]
    MissingLeadingSlash { pattern: String },

    #[error("pattern {pattern:?} contains an empty segment")]
    EmptySegment { pattern: String },

    #[error("pattern {pattern:?} contains a parameter with an empty name")]
    EmptyParamName { pattern: String },

    #[error("invalid parameter name {name:?} in pattern {pattern:?}")]
    InvalidParamName { pattern: String, name: String },

    #[error("invalid regex pattern: {source}")]
    InvalidRegex {
        #[from]
        source: regex::Error,
    },
}

impl PatternError {
    pub fn missing_leading_slash<S: ToString>(pattern: S) -> Self {
        Self::MissingLeadingSlash { pattern: pattern.to_string() }
    }

    pub fn empty_segment<S: ToString>(pattern: S) -> Self {
        Self::EmptySegment { pattern: pattern.to_string() }
    }

    pub fn empty_param_name<S: ToString>(pattern: S) -> Self {
        Self::EmptyParamName { pattern: pattern.to_string() }
    }

    pub fn invalid_param_name<S: ToString>(pattern: S, name: S) -> Self {
        Self::InvalidParamName { pattern: pattern.to_string(), name: name.to_string() }
    }
}

/// A pattern failed to compile while building a router.
#[derive(Debug, Error)]
#[error("invalid path pattern {path:?}: {source}")]
pub struct RouterBuildError {
    path: String,
    #[source]
    source: PatternError,
}

impl RouterBuildError {
    pub(crate) fn new(path: impl Into<String>, source: PatternError) -> Self {
        Self { path: path.into(), source }
    }

    /// The path string whose pattern failed to compile.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn pattern_error(&self) -> &PatternError {
        &self.source
    }
}

/// The dispatch-time error currency.
///
/// Handlers and parameter hooks fail with a `RouteError`; the router carries it as
/// the pending error across the remaining layer scan, delivering it either to an
/// error-aware middleware or to the caller of [`Router::handle`](crate::Router::handle).
///
/// The error is reference counted so that a memoized parameter-hook failure can be
/// re-raised for a later layer capturing the same value (see the `called` map in the
/// dispatch engine). Cloning is cheap.
#[derive(Clone)]
pub struct RouteError {
    inner: Arc<dyn StdError + Send + Sync>,
}

impl RouteError {
    pub fn new<E: Into<Box<dyn StdError + Send + Sync>>>(source: E) -> Self {
        Self { inner: Arc::from(source.into()) }
    }

    /// Creates an error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }

    /// The underlying error value.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    /// Downcasts the underlying error to a concrete type, if it is one.
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl<E: StdError + Send + Sync + 'static> From<E> for RouteError {
    fn from(source: E) -> Self {
        Self::new(source)
    }
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for MessageError {}
