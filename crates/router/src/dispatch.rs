//! Per method dispatch.
//!
//! A [`MethodDispatcher`] picks a handler by request method and answers everything else with
//! `405 Method Not Allowed`. `HEAD` and `OPTIONS` are synthesized when not registered: `HEAD`
//! runs the `GET` handler and drops its body, `OPTIONS` answers `200` with an `Allow` header.
//!
//! # Example
//! ```
//! use micro_router::dispatch::MethodDispatcher;
//! use micro_router::handler_fn;
//!
//! let dispatcher = MethodDispatcher::builder()
//!     .get(handler_fn(|| async { "list" }))
//!     .post(handler_fn(|| async { "create" }))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(dispatcher.allow(), "GET, POST, HEAD, OPTIONS");
//! ```

use crate::RequestContext;
use crate::body::{OptionReqBody, ResponseBody};
use crate::handler::RequestHandler;
use crate::response::drop_body;
use async_trait::async_trait;
use http::header::{ALLOW, InvalidHeaderValue};
use http::{HeaderValue, Method, Response, StatusCode};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("invalid method name: {name:?}")]
    InvalidMethod { name: String },

    #[error("invalid allow header: {source}")]
    InvalidAllow {
        #[from]
        source: InvalidHeaderValue,
    },
}

impl DispatchError {
    pub fn invalid_method<S: ToString>(name: S) -> Self {
        Self::InvalidMethod { name: name.to_string() }
    }
}

enum MethodHandler {
    Registered(Arc<dyn RequestHandler>),
    /// `HEAD` derived from the `GET` handler, or an empty `200` without one.
    Head(Option<Arc<dyn RequestHandler>>),
    Options,
}

impl fmt::Debug for MethodHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered(_) => f.write_str("Registered"),
            Self::Head(get) => write!(f, "Head(from_get: {})", get.is_some()),
            Self::Options => f.write_str("Options"),
        }
    }
}

/// Dispatches requests by method, keeping methods in registration order.
#[derive(Debug)]
pub struct MethodDispatcher {
    methods: Vec<(Method, MethodHandler)>,
    index: HashMap<Method, usize>,
    allow: HeaderValue,
}

impl MethodDispatcher {
    pub fn builder() -> MethodDispatcherBuilder {
        MethodDispatcherBuilder::new()
    }

    /// Builds a dispatcher from `(method name, handler)` pairs.
    ///
    /// Names are trimmed and upper-cased. A name given twice keeps its first position and the
    /// last handler.
    pub fn from_methods<I, K, H>(methods: I) -> Result<Self, DispatchError>
    where
        I: IntoIterator<Item = (K, H)>,
        K: AsRef<str>,
        H: RequestHandler + 'static,
    {
        let mut builder = Self::builder();
        for (name, handler) in methods {
            builder = builder.on(name.as_ref(), handler);
        }
        builder.build()
    }

    /// The `Allow` header value: registered methods in order, then `HEAD` and `OPTIONS`.
    pub fn allow(&self) -> &HeaderValue {
        &self.allow
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().map(|(method, _)| method)
    }
}

#[async_trait]
impl RequestHandler for MethodDispatcher {
    async fn invoke(&self, req: &mut RequestContext<'_>, req_body: OptionReqBody) -> Response<ResponseBody> {
        let Some(&position) = self.index.get(req.method()) else {
            debug!(method = %req.method(), allow = ?self.allow, "method not allowed");
            let mut response = Response::new(ResponseBody::empty());
            *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
            response.headers_mut().insert(ALLOW, self.allow.clone());
            return response;
        };

        let mut response = match &self.methods[position].1 {
            MethodHandler::Registered(handler) => handler.invoke(req, req_body).await,
            MethodHandler::Head(Some(get)) => drop_body(get.invoke(req, req_body).await),
            MethodHandler::Head(None) | MethodHandler::Options => Response::new(ResponseBody::empty()),
        };

        response.headers_mut().entry(ALLOW).or_insert_with(|| self.allow.clone());
        response
    }
}

/// Collects method handlers for a [`MethodDispatcher`].
///
/// Method names are validated by [`build`](Self::build).
#[derive(Default)]
pub struct MethodDispatcherBuilder {
    handlers: Vec<(String, Arc<dyn RequestHandler>)>,
}

impl fmt::Debug for MethodDispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.handlers.iter().map(|(name, _)| name)).finish()
    }
}

macro_rules! method_shortcut {
    ($fn_name:ident, $method:ident) => {
        #[doc = concat!("Registers `handler` for `", stringify!($method), "`.")]
        #[must_use]
        pub fn $fn_name<H: RequestHandler + 'static>(self, handler: H) -> Self {
            self.on(Method::$method.as_str(), handler)
        }
    };
}

impl MethodDispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for the method called `name`, any case and surrounding spaces.
    #[must_use]
    pub fn on<H: RequestHandler + 'static>(mut self, name: &str, handler: H) -> Self {
        self.handlers.push((name.to_owned(), Arc::new(handler)));
        self
    }

    method_shortcut!(get, GET);
    method_shortcut!(post, POST);
    method_shortcut!(put, PUT);
    method_shortcut!(delete, DELETE);
    method_shortcut!(patch, PATCH);
    method_shortcut!(head, HEAD);
    method_shortcut!(options, OPTIONS);

    pub fn build(self) -> Result<MethodDispatcher, DispatchError> {
        let mut methods: Vec<(Method, MethodHandler)> = Vec::with_capacity(self.handlers.len() + 2);
        let mut index: HashMap<Method, usize> = HashMap::with_capacity(self.handlers.len() + 2);

        for (name, handler) in self.handlers {
            let method = canonical_method(&name)?;
            match index.get(&method) {
                Some(&position) => methods[position].1 = MethodHandler::Registered(handler),
                None => {
                    index.insert(method.clone(), methods.len());
                    methods.push((method, MethodHandler::Registered(handler)));
                }
            }
        }

        if !index.contains_key(&Method::HEAD) {
            let get = methods.iter().find_map(|(method, handler)| match handler {
                MethodHandler::Registered(handler) if method == Method::GET => Some(Arc::clone(handler)),
                _ => None,
            });
            index.insert(Method::HEAD, methods.len());
            methods.push((Method::HEAD, MethodHandler::Head(get)));
        }

        if !index.contains_key(&Method::OPTIONS) {
            index.insert(Method::OPTIONS, methods.len());
            methods.push((Method::OPTIONS, MethodHandler::Options));
        }

        let allow = methods.iter().map(|(method, _)| method.as_str()).collect::<Vec<_>>().join(", ");
        let allow = HeaderValue::try_from(allow)?;

        Ok(MethodDispatcher { methods, index, allow })
    }
}

fn canonical_method(name: &str) -> Result<Method, DispatchError> {
    let name = name.trim().to_ascii_uppercase();
    Method::from_bytes(name.as_bytes()).map_err(|_invalid| DispatchError::invalid_method(name))
}

#[cfg(test)]
mod tests {
    use super::{DispatchError, MethodDispatcher};
    use crate::RequestContext;
    use crate::body::{OptionReqBody, ResponseBody};
    use crate::handler::{RequestHandler, handler_fn};
    use bytes::Bytes;
    use http::header::{ALLOW, CONTENT_LENGTH};
    use http::{Method, Request, Response, StatusCode};
    use http_body_util::BodyExt;

    fn dispatcher() -> MethodDispatcher {
        MethodDispatcher::builder()
            .get(handler_fn(|| async {
                Response::builder().header("x-page", "list").body(ResponseBody::from("all the things")).unwrap()
            }))
            .on(" post ", handler_fn(|| async { (StatusCode::CREATED, "created") }))
            .build()
            .unwrap()
    }

    async fn call(handler: &impl RequestHandler, method: Method) -> (Response<()>, Bytes) {
        let header = Request::builder().method(method).uri("/things").body(()).unwrap().into_parts().0;
        let mut req = RequestContext::new(&header);
        let response = handler.invoke(&mut req, OptionReqBody::empty()).await;
        let (parts, body) = response.into_parts();
        (Response::from_parts(parts, ()), body.collect().await.unwrap().to_bytes())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn dispatches_registered_methods() {
        let dispatcher = dispatcher();

        let (response, body) = call(&dispatcher, Method::GET).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body, Bytes::from("all the things"));
        assert_eq!(response.headers()[ALLOW], "GET, POST, HEAD, OPTIONS");

        let (response, body) = call(&dispatcher, Method::POST).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body, Bytes::from("created"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn head_is_get_without_body() {
        let (response, body) = call(&dispatcher(), Method::HEAD).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-page"], "list");
        assert_eq!(response.headers()[CONTENT_LENGTH], "14");
        assert_eq!(response.headers()[ALLOW], "GET, POST, HEAD, OPTIONS");
        assert!(body.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn options_lists_methods() {
        let (response, body) = call(&dispatcher(), Method::OPTIONS).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ALLOW], "GET, POST, HEAD, OPTIONS");
        assert!(body.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn unknown_method_is_not_allowed() {
        let (response, body) = call(&dispatcher(), Method::DELETE).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, POST, HEAD, OPTIONS");
        assert!(body.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn request_method_is_case_sensitive() {
        let lowercase = Method::from_bytes(b"get").unwrap();
        let (response, _) = call(&dispatcher(), lowercase).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn explicit_head_and_allow_are_kept() {
        let dispatcher = MethodDispatcher::builder()
            .head(handler_fn(|| async { (StatusCode::NO_CONTENT, ()) }))
            .get(handler_fn(|| async {
                Response::builder().header(ALLOW, "GET").body(ResponseBody::empty()).unwrap()
            }))
            .build()
            .unwrap();
        assert_eq!(dispatcher.allow(), "HEAD, GET, OPTIONS");

        let (response, _) = call(&dispatcher, Method::HEAD).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let (response, _) = call(&dispatcher, Method::GET).await;
        assert_eq!(response.headers()[ALLOW], "GET");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn head_without_get_is_empty_ok() {
        let dispatcher = MethodDispatcher::from_methods([("post", handler_fn(|| async { "posted" }))]).unwrap();

        let (response, body) = call(&dispatcher, Method::HEAD).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body.is_empty());
    }

    #[test]
    fn repeated_method_keeps_first_position() {
        let dispatcher = MethodDispatcher::builder()
            .get(handler_fn(|| async { "first" }))
            .post(handler_fn(|| async { "post" }))
            .on("Get", handler_fn(|| async { "second" }))
            .build()
            .unwrap();

        assert_eq!(dispatcher.allow(), "GET, POST, HEAD, OPTIONS");
        assert_eq!(dispatcher.methods().count(), 4);
    }

    #[test]
    fn invalid_method_names_are_rejected() {
        let result = MethodDispatcher::builder().on("", handler_fn(|| async {})).build();
        assert!(matches!(result, Err(DispatchError::InvalidMethod { .. })));

        let result = MethodDispatcher::builder().on("GE T", handler_fn(|| async {})).build();
        assert!(matches!(result, Err(DispatchError::InvalidMethod { .. })));
    }
}
