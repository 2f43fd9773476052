//! A layer binds a compiled pattern to something dispatchable.
//!
//! Layers are long-lived and shared across every in-flight request; matching is
//! pure (see [`Pattern::matches`]) so no per-request state ever touches them.

use crate::handler::{ErrorHandler, Handler};
use crate::pattern::{Pattern, PatternMatch};
use crate::route::Route;
use crate::router::Router;
use std::fmt;

pub(crate) enum LayerKind {
    /// Plain middleware mounted at a path prefix.
    Middleware(Box<dyn Handler>),
    /// Error-aware middleware: runs only while an error is pending.
    ErrorMiddleware(Box<dyn ErrorHandler>),
    /// A terminal route with method-gated handler chains.
    Route(Route),
    /// A mounted child router.
    Scope(Box<Router>),
}

pub(crate) struct Layer {
    pattern: Pattern,
    kind: LayerKind,
}

impl Layer {
    pub(crate) fn new(pattern: Pattern, kind: LayerKind) -> Self {
        Self { pattern, kind }
    }

    #[inline]
    pub(crate) fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    #[inline]
    pub(crate) fn kind(&self) -> &LayerKind {
        &self.kind
    }

    /// Whether this layer participates in error flow. While an error is
    /// pending, only error-aware layers are considered by the scan.
    pub(crate) fn handles_error(&self) -> bool {
        matches!(self.kind, LayerKind::ErrorMiddleware(_))
    }

    pub(crate) fn matches(&self, path: &str) -> Option<PatternMatch> {
        self.pattern.matches(path)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            LayerKind::Middleware(_) => "middleware",
            LayerKind::ErrorMiddleware(_) => "error middleware",
            LayerKind::Route(_) => "route",
            LayerKind::Scope(_) => "scope",
        };
        f.debug_struct("Layer").field("pattern", &self.pattern.raw()).field("kind", &kind).finish()
    }
}
