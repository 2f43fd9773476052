//! The request view the routing engine dispatches on.
//!
//! A [`RequestContext`] carries the method, the working path, the accumulated
//! base path, and the captured parameters for exactly one request. It is owned
//! by a single dispatch activation: all mutable routing state lives here, never
//! on the shared router structures, which is what makes concurrent dispatch
//! over one router safe.

use crate::params::Params;
use http::Method;

/// Per-request routing state.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    original_path: String,
    path: String,
    base_path: String,
    params: Params,
}

impl RequestContext {
    /// Creates a context for one request. An empty path is normalized to `"/"`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let mut path = path.into();
        if path.is_empty() {
            path.push('/');
        }
        Self { method, original_path: path.clone(), path, base_path: String::new(), params: Params::new() }
    }

    /// Creates a context from an `http` request, routing on the URI path.
    pub fn from_request<B>(request: &http::Request<B>) -> Self {
        Self::new(request.method().clone(), request.uri().path())
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path as received, before any prefix stripping.
    pub fn original_path(&self) -> &str {
        &self.original_path
    }

    /// The working path: mounted prefixes matched by enclosing layers are
    /// already stripped.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The accumulated matched prefix of enclosing mounts (`baseUrl`).
    #[inline]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[inline]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Mutable access for parameter hooks that rewrite resolved values.
    #[inline]
    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub(crate) fn set_path(&mut self, path: String) {
        self.path = path;
    }

    pub(crate) fn set_base_path(&mut self, base_path: String) {
        self.base_path = base_path;
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_becomes_root() {
        let req = RequestContext::new(Method::GET, "");
        assert_eq!(req.path(), "/");
        assert_eq!(req.original_path(), "/");
        assert_eq!(req.base_path(), "");
    }

    #[test]
    fn from_http_request() {
        let request = http::Request::builder().method(Method::POST).uri("/api/users?page=2").body(()).unwrap();
        let req = RequestContext::from_request(&request);
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.path(), "/api/users");
    }
}
