//! The router: an ordered list of routes scanned first match wins.

use crate::RequestContext;
use crate::body::{BoxError, OptionReqBody, ResponseBody};
use crate::decorator::{Decorator, DecoratorComposer, DecoratorExt, IdentityDecorator};
use crate::handler::RequestHandler;
use crate::responder::Responder;
use crate::route::Route;
use crate::static_files::StaticFiles;
use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body::Body as HttpBody;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, warn};

const NOT_FOUND_BODY: &str = "404 page not found\n";

/// Routes requests to the first [`Route`] matching their path.
///
/// A router is itself a [`RequestHandler`], so routers nest: a prefix route can hand a whole
/// subtree to another router, which sees the unmodified path.
pub struct Router {
    routes: Vec<Route>,
    not_found: Option<Box<dyn RequestHandler>>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .field("not_found", &self.not_found.is_some())
            .finish()
    }
}

impl Router {
    /// Creates a new router builder without decorators
    pub fn builder() -> RouterBuilder<IdentityDecorator> {
        RouterBuilder::new()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The first route claiming `path`, which is expected percent-decoded as by
    /// [`RequestContext::path`].
    pub fn find(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(path))
    }

    /// Handles a full request, the entry point for a server.
    pub async fn call<B>(&self, request: Request<B>) -> Response<ResponseBody>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (header, body) = request.into_parts();
        let mut req = RequestContext::new(&header);
        self.invoke(&mut req, OptionReqBody::new(body)).await
    }
}

#[async_trait]
impl RequestHandler for Router {
    async fn invoke(&self, req: &mut RequestContext<'_>, req_body: OptionReqBody) -> Response<ResponseBody> {
        let path = req.path();

        let Some(route) = self.find(&path) else {
            debug!(path = %path, "no route matched");
            return match &self.not_found {
                Some(handler) => handler.invoke(req, req_body).await,
                None => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).response_to(req),
            };
        };

        if let Err(e) = req.resolve_args(&req_body).await {
            warn!(path = %path, cause = %e, "unable to parse request");
            return e.response_to(req);
        }

        if route.is_parametric() {
            req.set_path_params(route.params(&path));
        }

        route.handler().invoke(req, req_body).await
    }
}

/// Collects routes in priority order.
pub struct RouterBuilder<D> {
    routes: Vec<Route>,
    not_found: Option<Box<dyn RequestHandler>>,
    decorator: D,
}

impl<D: fmt::Debug> fmt::Debug for RouterBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("routes", &self.routes)
            .field("not_found", &self.not_found.is_some())
            .field("decorator", &self.decorator)
            .finish()
    }
}

impl RouterBuilder<IdentityDecorator> {
    fn new() -> Self {
        Self { routes: Vec::new(), not_found: None, decorator: IdentityDecorator }
    }
}

impl<D> RouterBuilder<D> {
    /// Appends a route. Routes are tried in the order they were added.
    #[must_use]
    pub fn route(mut self, route: impl Into<Route>) -> Self {
        self.routes.push(route.into());
        self
    }

    /// The handler for requests no route matches, instead of the default plain text 404.
    #[must_use]
    pub fn not_found(mut self, handler: impl RequestHandler + 'static) -> Self {
        self.not_found = Some(Box::new(handler));
        self
    }

    /// Serves the files of `dir` under `prefix`.
    #[must_use]
    pub fn with_static(self, prefix: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        let prefix = prefix.into();
        let files = StaticFiles::new(prefix.clone(), dir);
        self.route(Route::prefix(prefix, files))
    }

    /// Wraps every handler, including the not found handler, with `decorator` when building.
    pub fn with_global_decorator<D2>(self, decorator: D2) -> RouterBuilder<DecoratorComposer<D, D2>>
    where
        D: Decorator<Box<dyn RequestHandler>>,
        D2: Decorator<D::Out>,
    {
        RouterBuilder { routes: self.routes, not_found: self.not_found, decorator: self.decorator.and_then(decorator) }
    }

    pub fn build(self) -> Router
    where
        D: Decorator<Box<dyn RequestHandler>>,
        D::Out: RequestHandler + 'static,
    {
        let decorator = self.decorator;
        let decorate = |handler: Box<dyn RequestHandler>| -> Box<dyn RequestHandler> {
            Box::new(decorator.decorate(handler))
        };

        let routes = self.routes.into_iter().map(|route| route.map_handler(decorate)).collect();
        let not_found = self.not_found.map(decorate);

        Router { routes, not_found }
    }
}
