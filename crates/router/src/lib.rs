//! An asynchronous request routing engine
//!
//! This crate provides a lightweight, composable router in the middleware-stack
//! style: an ordered list of layers is scanned per request, each layer carries a
//! path pattern, and matched handlers run in registration order until one of
//! them produces a response. Routers nest, so an application can be assembled
//! from independently built sub-routers mounted under path prefixes.
//!
//! # Features
//!
//! - Ordered middleware dispatch with explicit flow control ([`Flow`])
//! - Path patterns with named parameters, modifiers, wildcards and regular expressions
//! - Prefix mounting with working-path stripping and restoration
//! - Parameter hooks, memoized per captured value within a request
//! - Error-handling middleware with Express-style error gating
//! - Automatic `Allow` responses for unrouted `OPTIONS` requests
//!
//! # Example
//!
//! ```no_run
//! use http::Method;
//! use micro_router::{handler_fn, Flow, RequestContext, ResponseContext, Router};
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::builder()
//!         .middleware(handler_fn(|req, _res| {
//!             Box::pin(async move {
//!                 tracing::info!(path = req.path(), "incoming request");
//!                 Ok(Flow::Next)
//!             })
//!         }))
//!         .get(
//!             "/users/:id",
//!             handler_fn(|req, res| {
//!                 Box::pin(async move {
//!                     let id = req.params().get("id").unwrap_or("unknown").to_string();
//!                     res.send(format!("user {id}"));
//!                     Ok(Flow::Done)
//!                 })
//!             }),
//!         )
//!         .build()
//!         .expect("router patterns are valid");
//!
//!     let mut req = RequestContext::new(Method::GET, "/users/42");
//!     let mut res = ResponseContext::new();
//!     router.handle(&mut req, &mut res).await.expect("no handler failed");
//! }
//! ```

mod error;
mod handler;
mod layer;
mod params;
mod pattern;
mod request;
mod response;
mod route;
mod router;

pub use error::PatternError;
pub use error::RouteError;
pub use error::RouterBuildError;
pub use handler::error_fn;
pub use handler::handler_fn;
pub use handler::param_fn;
pub use handler::ErrorHandler;
pub use handler::Flow;
pub use handler::FnErrorHandler;
pub use handler::FnHandler;
pub use handler::FnParamHook;
pub use handler::Handler;
pub use handler::HandlerResult;
pub use handler::ParamHook;
pub use params::Params;
pub use pattern::regex;
pub use pattern::PathSpec;
pub use pattern::Pattern;
pub use pattern::PatternMatch;
pub use request::RequestContext;
pub use response::ResponseContext;
pub use route::Route;
pub use router::Dispatch;
pub use router::Router;
pub use router::RouterBuilder;
pub use router::RouterOptions;
