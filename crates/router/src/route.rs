//! A named endpoint with per-method handler chains.
//!
//! A [`Route`] binds one path to an ordered list of handlers, each restricted
//! to an HTTP method (or to all methods via [`Route::all`]). Handlers for the
//! matched method run in registration order; `all` handlers interleave with
//! method-specific ones exactly where they were registered.

use crate::handler::{Flow, Handler, HandlerResult};
use crate::pattern::PathSpec;
use crate::request::RequestContext;
use crate::response::ResponseContext;
use http::Method;
use std::fmt;

/// A terminal endpoint: one path, method-gated handler chains.
pub struct Route {
    path: PathSpec,
    entries: Vec<RouteEntry>,
}

struct RouteEntry {
    /// `None` registers the handler for every method.
    method: Option<Method>,
    handler: Box<dyn Handler>,
}

impl RouteEntry {
    /// Whether this entry runs for `method`. HEAD never borrows GET's
    /// handlers here; the GET fallback applies to match existence only
    /// (see [`Route::handles`]).
    fn accepts(&self, method: &Method) -> bool {
        match &self.method {
            None => true,
            Some(own) => own == method,
        }
    }
}

impl Route {
    /// Creates an empty route for `path`. The pattern is compiled when the
    /// route is registered on a router.
    pub fn new(path: impl Into<PathSpec>) -> Self {
        Self { path: path.into(), entries: Vec::new() }
    }

    pub fn path(&self) -> &PathSpec {
        &self.path
    }

    /// Appends a handler for a specific method.
    pub fn method(mut self, method: Method, handler: impl Handler + 'static) -> Self {
        self.entries.push(RouteEntry { method: Some(method), handler: Box::new(handler) });
        self
    }

    /// Appends a handler that runs for every method.
    pub fn all(mut self, handler: impl Handler + 'static) -> Self {
        self.entries.push(RouteEntry { method: None, handler: Box::new(handler) });
        self
    }

    pub fn get(self, handler: impl Handler + 'static) -> Self {
        self.method(Method::GET, handler)
    }

    pub fn post(self, handler: impl Handler + 'static) -> Self {
        self.method(Method::POST, handler)
    }

    pub fn put(self, handler: impl Handler + 'static) -> Self {
        self.method(Method::PUT, handler)
    }

    pub fn delete(self, handler: impl Handler + 'static) -> Self {
        self.method(Method::DELETE, handler)
    }

    pub fn patch(self, handler: impl Handler + 'static) -> Self {
        self.method(Method::PATCH, handler)
    }

    pub fn head(self, handler: impl Handler + 'static) -> Self {
        self.method(Method::HEAD, handler)
    }

    pub fn options(self, handler: impl Handler + 'static) -> Self {
        self.method(Method::OPTIONS, handler)
    }

    /// Whether the route declares anything for `method`.
    ///
    /// HEAD falls back to GET for this existence check only: a HEAD request
    /// matches a GET-only route, but [`Route::dispatch`] will not run GET's
    /// chain in its place.
    pub(crate) fn handles(&self, method: &Method) -> bool {
        self.entries.iter().any(|entry| {
            entry.accepts(method) || (*method == Method::HEAD && entry.method == Some(Method::GET))
        })
    }

    /// Declared concrete methods, first-registration order, deduplicated.
    /// Feeds the router's automatic `Allow` response for OPTIONS.
    pub(crate) fn allowed_methods(&self) -> Vec<Method> {
        let mut methods = Vec::new();
        for entry in &self.entries {
            if let Some(method) = &entry.method {
                if !methods.contains(method) {
                    methods.push(method.clone());
                }
            }
        }
        methods
    }

    /// Runs this route's chain for the request method.
    ///
    /// `Flow::Next` means the chain completed (or had nothing to run) and the
    /// owning router should resume scanning its stack; `Flow::NextRoute` from a
    /// handler stops the chain early with the same effect.
    pub(crate) async fn dispatch(&self, req: &mut RequestContext, res: &mut ResponseContext) -> HandlerResult {
        let method = req.method().clone();
        for entry in &self.entries {
            if !entry.accepts(&method) {
                continue;
            }
            match entry.handler.invoke(req, res).await? {
                Flow::Next => {}
                Flow::NextRoute => break,
                Flow::NextRouter => return Ok(Flow::NextRouter),
                Flow::Done => return Ok(Flow::Done),
            }
        }
        Ok(Flow::Next)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("path", &self.path).field("handlers", &self.entries.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use std::sync::{Arc, Mutex};

    fn tag_handler(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str, flow: Flow) -> impl Handler + use<> {
        let log = Arc::clone(log);
        handler_fn(move |_req, _res| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().unwrap().push(tag);
                Ok(flow)
            })
        })
    }

    #[test]
    fn handles_with_head_fallback() {
        let route = Route::new("/users").get(handler_fn(|_req, _res| Box::pin(async { Ok(Flow::Next) })));
        assert!(route.handles(&Method::GET));
        assert!(route.handles(&Method::HEAD));
        assert!(!route.handles(&Method::POST));

        let any = Route::new("/users").all(handler_fn(|_req, _res| Box::pin(async { Ok(Flow::Next) })));
        assert!(any.handles(&Method::DELETE));
        assert!(any.allowed_methods().is_empty());
    }

    #[test]
    fn allowed_methods_dedup_in_order() {
        let noop = || handler_fn(|_req, _res| Box::pin(async { Ok(Flow::Next) }));
        let route = Route::new("/users").get(noop()).post(noop()).get(noop());
        assert_eq!(route.allowed_methods(), [Method::GET, Method::POST]);
    }

    #[tokio::test]
    async fn chain_runs_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let route = Route::new("/users")
            .all(tag_handler(&log, "audit", Flow::Next))
            .get(tag_handler(&log, "get1", Flow::Next))
            .post(tag_handler(&log, "post", Flow::Next))
            .get(tag_handler(&log, "get2", Flow::Done));

        let mut req = RequestContext::new(Method::GET, "/users");
        let mut res = ResponseContext::new();
        let flow = route.dispatch(&mut req, &mut res).await.unwrap();
        assert_eq!(flow, Flow::Done);
        assert_eq!(*log.lock().unwrap(), ["audit", "get1", "get2"]);
    }

    #[tokio::test]
    async fn head_does_not_run_get_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let route = Route::new("/users").get(tag_handler(&log, "get", Flow::Done));

        let mut req = RequestContext::new(Method::HEAD, "/users");
        let mut res = ResponseContext::new();
        let flow = route.dispatch(&mut req, &mut res).await.unwrap();
        assert_eq!(flow, Flow::Next);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn next_route_skips_rest_of_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let route = Route::new("/users")
            .get(tag_handler(&log, "first", Flow::NextRoute))
            .get(tag_handler(&log, "second", Flow::Next));

        let mut req = RequestContext::new(Method::GET, "/users");
        let mut res = ResponseContext::new();
        let flow = route.dispatch(&mut req, &mut res).await.unwrap();
        assert_eq!(flow, Flow::Next);
        assert_eq!(*log.lock().unwrap(), ["first"]);
    }

    #[tokio::test]
    async fn handler_error_propagates() {
        let route = Route::new("/users")
            .get(handler_fn(|_req, _res| Box::pin(async { Err(crate::RouteError::msg("boom")) })));

        let mut req = RequestContext::new(Method::GET, "/users");
        let mut res = ResponseContext::new();
        let err = route.dispatch(&mut req, &mut res).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
