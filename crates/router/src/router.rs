//! The core dispatcher.
//!
//! A [`Router`] owns an ordered stack of layers: plain middleware, error-aware
//! middleware, terminal routes, and mounted child routers. Dispatch walks the
//! stack in registration order, asking each layer to match the current working
//! path, and invokes the first acceptable match. Handlers steer the walk
//! through their returned [`Flow`]:
//!
//! - [`Flow::Next`] resumes scanning at the next layer,
//! - [`Flow::NextRoute`] skips the rest of a route's chain,
//! - [`Flow::NextRouter`] abandons the current router's remaining stack,
//! - [`Flow::Done`] finishes dispatch.
//!
//! Errors returned by handlers become the pending error: scanning continues,
//! but only error-aware middleware is considered until one of them clears the
//! error. An error that survives the whole stack is returned from
//! [`Router::handle`]; a clean exhaustion is [`Dispatch::Unmatched`], which the
//! caller typically maps to a 404.
//!
//! The router, its layers, and its patterns are immutable once
//! [`RouterBuilder::build`] returns, so one router can serve any number of
//! concurrent requests; every piece of per-request state lives in the
//! [`RequestContext`] or on this function's stack.
//!
//! # Example
//!
//! ```no_run
//! use micro_router::{handler_fn, Dispatch, Flow, RequestContext, ResponseContext, Router};
//! use http::Method;
//!
//! # async fn run() -> Result<(), micro_router::RouteError> {
//! let router = Router::builder()
//!     .middleware_at("/api", handler_fn(|_req, _res| Box::pin(async { Ok(Flow::Next) })))
//!     .get("/api/users/:id", handler_fn(|req, res| {
//!         Box::pin(async move {
//!             let id = req.params().get("id").unwrap_or("unknown").to_string();
//!             res.send(format!("user {id}"));
//!             Ok(Flow::Done)
//!         })
//!     }))
//!     .build()?;
//!
//! let mut req = RequestContext::new(Method::GET, "/api/users/42");
//! let mut res = ResponseContext::new();
//! match router.handle(&mut req, &mut res).await? {
//!     Dispatch::Handled => { /* write res to the transport */ }
//!     Dispatch::Unmatched => { /* render 404 */ }
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{RouteError, RouterBuildError};
use crate::handler::{ErrorHandler, Flow, Handler, ParamHook};
use crate::layer::{Layer, LayerKind};
use crate::params::Params;
use crate::pattern::{PathSpec, Pattern, PatternMatch, PatternOptions};
use crate::request::RequestContext;
use crate::response::ResponseContext;
use crate::route::Route;
use futures::future::BoxFuture;
use http::header::HeaderValue;
use http::{header, Method, StatusCode};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error, trace};

/// Router-wide matching configuration, fixed at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterOptions {
    /// Literal path segments compare case-sensitively.
    pub case_sensitive: bool,
    /// Trailing slashes are significant for route patterns.
    pub strict: bool,
    /// Layer captures merge over the params inherited from the parent router.
    pub merge_params: bool,
}

/// How a router's portion of dispatch ended, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler completed the response.
    Handled,
    /// The stack was exhausted without anyone completing the response.
    Unmatched,
}

/// Internal dispatch result: a mounted router's pending error must flow back
/// into the parent's scan instead of surfacing to the caller.
#[derive(Debug)]
enum DispatchEnd {
    Handled,
    Exhausted(Option<RouteError>),
}

enum ParamsOutcome {
    Proceed,
    Skip,
    Exit,
    Handled,
    Failed(RouteError),
}

/// Param-hook memoization record, scoped to one router activation.
struct CalledParam {
    raw: String,
    resolved: String,
    error: Option<RouteError>,
}

pub struct Router {
    stack: Vec<Layer>,
    param_hooks: HashMap<String, Vec<Box<dyn ParamHook>>>,
    options: RouterOptions,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub fn options(&self) -> RouterOptions {
        self.options
    }

    /// Dispatches one request through this router's stack.
    ///
    /// Resolves exactly once per request: `Ok(Dispatch::Handled)` when a
    /// handler completed the response, `Ok(Dispatch::Unmatched)` when the
    /// stack was exhausted cleanly, `Err` when an error survived every
    /// error-aware middleware.
    pub async fn handle(
        &self,
        req: &mut RequestContext,
        res: &mut ResponseContext,
    ) -> Result<Dispatch, RouteError> {
        debug!(method = %req.method(), path = req.path(), "dispatching request");
        match self.dispatch(req, res).await {
            DispatchEnd::Handled => Ok(Dispatch::Handled),
            DispatchEnd::Exhausted(None) => Ok(Dispatch::Unmatched),
            DispatchEnd::Exhausted(Some(err)) => Err(err),
        }
    }

    /// One router activation: scans the stack once for one request.
    ///
    /// Boxed because mounted routers recurse through here.
    fn dispatch<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseContext,
    ) -> BoxFuture<'a, DispatchEnd> {
        Box::pin(async move {
            let entry_params = req.params().clone();
            let mut pending: Option<RouteError> = None;
            let mut allowed: Vec<Method> = Vec::new();
            let mut called: HashMap<String, CalledParam> = HashMap::new();

            let mut idx = 0;
            'scan: while idx < self.stack.len() {
                let layer = &self.stack[idx];
                idx += 1;

                // While an error is pending only error-aware layers are
                // considered; in normal flow they are invisible.
                if pending.is_some() != layer.handles_error() {
                    continue;
                }

                let Some(matched) = layer.matches(req.path()) else {
                    continue;
                };

                if let LayerKind::Route(route) = layer.kind() {
                    // Every matched route feeds the Allow candidates, so a
                    // fall-through OPTIONS handler still gets the synthesized
                    // response at exhaustion.
                    if req.method() == Method::OPTIONS {
                        for method in route.allowed_methods() {
                            if !allowed.contains(&method) {
                                allowed.push(method);
                            }
                        }
                    }
                    if !route.handles(req.method()) {
                        continue;
                    }
                } else if matched.prefix_len() > 0 && matched.prefix_len() < req.path().len() {
                    // A prefix match must end on a path boundary.
                    let boundary = req.path().as_bytes()[matched.prefix_len()];
                    if boundary != b'/' && boundary != b'.' {
                        continue;
                    }
                }

                trace!(pattern = layer.pattern().raw(), path = req.path(), "layer matched");

                let layer_params = if self.options.merge_params {
                    Params::merge(matched.params(), &entry_params)
                } else {
                    matched.params().clone()
                };
                req.set_params(layer_params);

                match self.process_params(matched.params(), &mut called, req, res).await {
                    ParamsOutcome::Proceed => {}
                    ParamsOutcome::Skip => continue 'scan,
                    ParamsOutcome::Exit => break 'scan,
                    ParamsOutcome::Handled => return DispatchEnd::Handled,
                    ParamsOutcome::Failed(err) => {
                        pending = Some(err);
                        continue 'scan;
                    }
                }

                let flow = match layer.kind() {
                    LayerKind::Route(route) => route.dispatch(req, res).await,
                    LayerKind::Middleware(handler) => {
                        let restore = strip_prefix(req, &matched);
                        let flow = handler.invoke(req, res).await;
                        restore.apply(req);
                        flow
                    }
                    LayerKind::ErrorMiddleware(handler) => match pending.take() {
                        Some(err) => {
                            let restore = strip_prefix(req, &matched);
                            let flow = handler.invoke(err, req, res).await;
                            restore.apply(req);
                            flow
                        }
                        // unreachable: gated on pending above
                        None => continue 'scan,
                    },
                    LayerKind::Scope(router) => {
                        let restore = strip_prefix(req, &matched);
                        let end = router.dispatch(req, res).await;
                        restore.apply(req);
                        match end {
                            DispatchEnd::Handled => return DispatchEnd::Handled,
                            DispatchEnd::Exhausted(child_pending) => {
                                pending = child_pending;
                                continue 'scan;
                            }
                        }
                    }
                };

                match flow {
                    Ok(Flow::Next | Flow::NextRoute) => {}
                    Ok(Flow::NextRouter) => break 'scan,
                    Ok(Flow::Done) => return DispatchEnd::Handled,
                    Err(err) => {
                        debug!(cause = %err, "handler failed, entering error flow");
                        pending = Some(err);
                    }
                }
            }

            req.set_params(entry_params);

            if pending.is_none() && req.method() == Method::OPTIONS && !allowed.is_empty() {
                send_options_response(res, &allowed);
                return DispatchEnd::Handled;
            }

            DispatchEnd::Exhausted(pending)
        })
    }

    /// Runs registered hooks for each captured parameter, in capture order.
    ///
    /// A hook chain runs at most once per raw value per activation: a repeat
    /// observation reuses the memoized resolved value or re-raises the
    /// memoized error without invoking the hooks again.
    async fn process_params(
        &self,
        captured: &Params,
        called: &mut HashMap<String, CalledParam>,
        req: &mut RequestContext,
        res: &mut ResponseContext,
    ) -> ParamsOutcome {
        for (name, raw) in captured.iter() {
            let Some(hooks) = self.param_hooks.get(name) else {
                continue;
            };

            if let Some(prev) = called.get(name) {
                if prev.raw == raw {
                    req.params_mut().insert(name, prev.resolved.clone());
                    match &prev.error {
                        Some(err) => return ParamsOutcome::Failed(err.clone()),
                        None => continue,
                    }
                }
            }

            let mut outcome = Flow::Next;
            let mut failure: Option<RouteError> = None;
            for hook in hooks {
                match hook.invoke(req, res, raw, name).await {
                    Ok(Flow::Next) => {}
                    Ok(flow) => {
                        outcome = flow;
                        break;
                    }
                    Err(err) => {
                        failure = Some(err);
                        break;
                    }
                }
            }

            // Control-flow outcomes are not memoized; a completed or failed
            // chain is.
            if outcome == Flow::Next || failure.is_some() {
                let resolved = req.params().get(name).unwrap_or(raw).to_string();
                called.insert(
                    name.to_string(),
                    CalledParam { raw: raw.to_string(), resolved, error: failure.clone() },
                );
            }

            if let Some(err) = failure {
                return ParamsOutcome::Failed(err);
            }
            match outcome {
                Flow::Next => {}
                Flow::NextRoute => return ParamsOutcome::Skip,
                Flow::NextRouter => return ParamsOutcome::Exit,
                Flow::Done => return ParamsOutcome::Handled,
            }
        }
        ParamsOutcome::Proceed
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("layers", &self.stack)
            .field("options", &self.options)
            .field("param_hooks", &self.param_hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Saved working path and base path, put back after a prefix layer yields.
struct PathRestore {
    path: String,
    base_path: String,
}

impl PathRestore {
    fn apply(self, req: &mut RequestContext) {
        req.set_path(self.path);
        req.set_base_path(self.base_path);
    }
}

fn strip_prefix(req: &mut RequestContext, matched: &PatternMatch) -> PathRestore {
    let restore = PathRestore { path: req.path().to_string(), base_path: req.base_path().to_string() };
    let prefix_len = matched.prefix_len();
    if prefix_len > 0 {
        let rest = &restore.path[prefix_len..];
        let new_path = if rest.starts_with('/') { rest.to_string() } else { format!("/{rest}") };
        let new_base = format!("{}{}", restore.base_path, &restore.path[..prefix_len]);
        req.set_path(new_path);
        req.set_base_path(new_base);
    }
    restore
}

fn send_options_response(res: &mut ResponseContext, allowed: &[Method]) {
    let list = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(",");
    res.set_status(StatusCode::OK);
    match HeaderValue::from_str(&list) {
        Ok(value) => res.insert_header(header::ALLOW, value),
        Err(cause) => error!(cause = %cause, "failed to build Allow header value"),
    }
    res.send(list);
}

enum Registration {
    Middleware { path: PathSpec, handler: Box<dyn Handler> },
    ErrorMiddleware { path: PathSpec, handler: Box<dyn ErrorHandler> },
    Route(Route),
    Scope { path: PathSpec, router: Router },
}

/// Builds a [`Router`]. Registration order is dispatch order.
pub struct RouterBuilder {
    options: RouterOptions,
    registrations: Vec<Registration>,
    param_hooks: HashMap<String, Vec<Box<dyn ParamHook>>>,
}

macro_rules! method_shorthand {
    ($name:ident, $method:ident) => {
        #[doc = concat!("Registers a route handling `", stringify!($method), "` at `path`.")]
        pub fn $name(self, path: impl Into<PathSpec>, handler: impl Handler + 'static) -> Self {
            self.route(Route::new(path).method(Method::$method, handler))
        }
    };
}

impl RouterBuilder {
    fn new() -> Self {
        Self { options: RouterOptions::default(), registrations: Vec::new(), param_hooks: HashMap::new() }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.options.case_sensitive = case_sensitive;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn merge_params(mut self, merge_params: bool) -> Self {
        self.options.merge_params = merge_params;
        self
    }

    /// Registers middleware that runs for every request reaching this router.
    pub fn middleware(self, handler: impl Handler + 'static) -> Self {
        self.middleware_at("/", handler)
    }

    /// Registers middleware mounted at a path prefix. The handler observes the
    /// working path with the prefix stripped and the prefix appended to the
    /// base path.
    pub fn middleware_at(mut self, path: impl Into<PathSpec>, handler: impl Handler + 'static) -> Self {
        self.registrations.push(Registration::Middleware { path: path.into(), handler: Box::new(handler) });
        self
    }

    /// Registers error-aware middleware that runs for every pending error.
    pub fn error_middleware(self, handler: impl ErrorHandler + 'static) -> Self {
        self.error_middleware_at("/", handler)
    }

    /// Registers error-aware middleware mounted at a path prefix.
    pub fn error_middleware_at(
        mut self,
        path: impl Into<PathSpec>,
        handler: impl ErrorHandler + 'static,
    ) -> Self {
        self.registrations.push(Registration::ErrorMiddleware { path: path.into(), handler: Box::new(handler) });
        self
    }

    /// Mounts a child router at a path prefix.
    pub fn scope(mut self, path: impl Into<PathSpec>, router: Router) -> Self {
        self.registrations.push(Registration::Scope { path: path.into(), router });
        self
    }

    /// Registers a terminal route.
    pub fn route(mut self, route: Route) -> Self {
        self.registrations.push(Registration::Route(route));
        self
    }

    /// Registers a hook for a named path parameter. Hooks for one name run in
    /// registration order before any layer capturing that name is invoked.
    pub fn param(mut self, name: impl Into<String>, hook: impl ParamHook + 'static) -> Self {
        self.param_hooks.entry(name.into()).or_default().push(Box::new(hook));
        self
    }

    method_shorthand!(get, GET);
    method_shorthand!(post, POST);
    method_shorthand!(put, PUT);
    method_shorthand!(delete, DELETE);
    method_shorthand!(patch, PATCH);
    method_shorthand!(head, HEAD);
    method_shorthand!(options, OPTIONS);

    /// Registers a route whose handler runs for every method.
    pub fn all(self, path: impl Into<PathSpec>, handler: impl Handler + 'static) -> Self {
        self.route(Route::new(path).all(handler))
    }

    /// Compiles every registered pattern and produces the immutable router.
    ///
    /// This is the registration-time failure boundary: a malformed pattern
    /// fails the build here and can never surface during dispatch.
    pub fn build(self) -> Result<Router, RouterBuildError> {
        let options = self.options;
        let mut stack = Vec::with_capacity(self.registrations.len());

        for registration in self.registrations {
            let layer = match registration {
                Registration::Middleware { path, handler } => {
                    let pattern = compile(&path, options, false)?;
                    Layer::new(pattern, LayerKind::Middleware(handler))
                }
                Registration::ErrorMiddleware { path, handler } => {
                    let pattern = compile(&path, options, false)?;
                    Layer::new(pattern, LayerKind::ErrorMiddleware(handler))
                }
                Registration::Scope { path, router } => {
                    let pattern = compile(&path, options, false)?;
                    Layer::new(pattern, LayerKind::Scope(Box::new(router)))
                }
                Registration::Route(route) => {
                    let pattern = compile(route.path(), options, true)?;
                    Layer::new(pattern, LayerKind::Route(route))
                }
            };
            stack.push(layer);
        }

        Ok(Router { stack, param_hooks: self.param_hooks, options })
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("options", &self.options)
            .field("registrations", &self.registrations.len())
            .finish()
    }
}

fn compile(path: &PathSpec, options: RouterOptions, end: bool) -> Result<Pattern, RouterBuildError> {
    let pattern_options = PatternOptions {
        case_sensitive: options.case_sensitive,
        // prefix mounts are never strict about trailing slashes
        strict: end && options.strict,
        end,
    };
    Pattern::compile(path, pattern_options).map_err(|source| RouterBuildError::new(path.raw(), source))
}
