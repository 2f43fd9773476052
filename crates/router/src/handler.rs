//! Handler contracts and the dispatch flow protocol.
//!
//! Handlers steer dispatch through return values: every handler resolves to a
//! [`Flow`] telling the dispatcher what to do next, and fails with a
//! [`RouteError`](crate::RouteError). Skip-ahead signals are dedicated [`Flow`]
//! variants ([`Flow::NextRoute`], [`Flow::NextRouter`]), so control signals and
//! real errors can never be confused.
//!
//! Plain middleware and error-aware middleware are distinct traits selected at
//! registration time ([`Handler`] vs [`ErrorHandler`]); there is no runtime
//! arity inspection.

use crate::error::RouteError;
use crate::request::RequestContext;
use crate::response::ResponseContext;
use async_trait::async_trait;
use futures::future::BoxFuture;

/// What a handler asks the dispatcher to do after it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going: next handler in the chain, or next layer in the stack.
    Next,
    /// Skip the rest of the current route's handler chain and resume scanning
    /// the router stack at the next layer.
    NextRoute,
    /// Stop evaluating the current router's remaining stack entirely.
    NextRouter,
    /// The response is complete; dispatch is finished.
    Done,
}

/// The outcome of one handler invocation.
pub type HandlerResult = Result<Flow, RouteError>;

/// A middleware or route handler.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, req: &mut RequestContext, res: &mut ResponseContext) -> HandlerResult;
}

/// An error-aware handler: receives the pending dispatch error.
///
/// Returning `Ok(Flow::Next)` clears the error and resumes normal scanning;
/// returning `Err` keeps an error pending (the same or a new one).
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn invoke(&self, err: RouteError, req: &mut RequestContext, res: &mut ResponseContext) -> HandlerResult;
}

/// A parameter hook: runs before a matched layer for a captured parameter.
///
/// Receives the raw captured value and the parameter name, and may rewrite the
/// resolved value through [`RequestContext::params_mut`].
#[async_trait]
pub trait ParamHook: Send + Sync {
    async fn invoke(
        &self,
        req: &mut RequestContext,
        res: &mut ResponseContext,
        raw: &str,
        name: &str,
    ) -> HandlerResult;
}

/// A [`Handler`] built from a boxed-future closure, see [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

/// Wraps a closure as a [`Handler`].
///
/// The closure receives the request and response contexts and returns a boxed
/// future, typically `Box::pin(async move { ... })`.
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext, &'a mut ResponseContext) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    FnHandler { f }
}

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext, &'a mut ResponseContext) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    async fn invoke(&self, req: &mut RequestContext, res: &mut ResponseContext) -> HandlerResult {
        (self.f)(req, res).await
    }
}

/// An [`ErrorHandler`] built from a boxed-future closure, see [`error_fn`].
pub struct FnErrorHandler<F> {
    f: F,
}

/// Wraps a closure as an [`ErrorHandler`].
pub fn error_fn<F>(f: F) -> FnErrorHandler<F>
where
    F: for<'a> Fn(RouteError, &'a mut RequestContext, &'a mut ResponseContext) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync,
{
    FnErrorHandler { f }
}

#[async_trait]
impl<F> ErrorHandler for FnErrorHandler<F>
where
    F: for<'a> Fn(RouteError, &'a mut RequestContext, &'a mut ResponseContext) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync,
{
    async fn invoke(&self, err: RouteError, req: &mut RequestContext, res: &mut ResponseContext) -> HandlerResult {
        (self.f)(err, req, res).await
    }
}

/// A [`ParamHook`] built from a boxed-future closure, see [`param_fn`].
pub struct FnParamHook<F> {
    f: F,
}

/// Wraps a closure as a [`ParamHook`].
pub fn param_fn<F>(f: F) -> FnParamHook<F>
where
    F: for<'a> Fn(&'a mut RequestContext, &'a mut ResponseContext, &'a str, &'a str) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync,
{
    FnParamHook { f }
}

#[async_trait]
impl<F> ParamHook for FnParamHook<F>
where
    F: for<'a> Fn(&'a mut RequestContext, &'a mut ResponseContext, &'a str, &'a str) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync,
{
    async fn invoke(&self, req: &mut RequestContext, res: &mut ResponseContext, raw: &str, name: &str) -> HandlerResult {
        (self.f)(req, res, raw, name).await
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnHandler")
    }
}

impl<F> std::fmt::Debug for FnErrorHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnErrorHandler")
    }
}

impl<F> std::fmt::Debug for FnParamHook<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnParamHook")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn assert_is_handler<T: Handler>(_handler: &T) {
        // no op
    }

    #[tokio::test]
    async fn closure_handler_invokes() {
        let handler = handler_fn(|req, res| {
            Box::pin(async move {
                assert_eq!(req.method(), &Method::GET);
                res.send("hello");
                Ok(Flow::Done)
            })
        });
        assert_is_handler(&handler);

        let mut req = RequestContext::new(Method::GET, "/");
        let mut res = ResponseContext::new();
        let flow = handler.invoke(&mut req, &mut res).await.unwrap();
        assert_eq!(flow, Flow::Done);
        assert!(res.is_ended());
    }

    #[tokio::test]
    async fn closure_error_handler_receives_error() {
        let handler = error_fn(|err, _req, res| {
            Box::pin(async move {
                res.send(format!("recovered: {err}"));
                Ok(Flow::Done)
            })
        });

        let mut req = RequestContext::new(Method::GET, "/");
        let mut res = ResponseContext::new();
        let flow = handler.invoke(RouteError::msg("boom"), &mut req, &mut res).await.unwrap();
        assert_eq!(flow, Flow::Done);
        assert_eq!(res.body(), b"recovered: boom".as_slice());
    }
}
