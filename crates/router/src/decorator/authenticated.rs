use crate::RequestContext;
use crate::auth::Authenticator;
use crate::body::{OptionReqBody, ResponseBody};
use crate::decorator::Decorator;
use crate::handler::RequestHandler;
use async_trait::async_trait;
use http::{Response, StatusCode};
use std::sync::Arc;
use tracing::debug;

/// Only lets requests with a logged in user through, others are redirected to the login path.
#[derive(Debug, Clone)]
pub struct AuthenticatedDecorator {
    authenticator: Arc<Authenticator>,
}

impl AuthenticatedDecorator {
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }
}

impl<H: RequestHandler> Decorator<H> for AuthenticatedDecorator {
    type Out = AuthenticatedHandler<H>;

    fn decorate(&self, raw: H) -> Self::Out {
        AuthenticatedHandler { handler: raw, authenticator: Arc::clone(&self.authenticator) }
    }
}

#[derive(Debug)]
pub struct AuthenticatedHandler<H> {
    handler: H,
    authenticator: Arc<Authenticator>,
}

#[async_trait]
impl<H: RequestHandler> RequestHandler for AuthenticatedHandler<H> {
    async fn invoke(&self, req: &mut RequestContext<'_>, req_body: OptionReqBody) -> Response<ResponseBody> {
        if self.authenticator.current_user(req).is_some() {
            return self.handler.invoke(req, req_body).await;
        }

        debug!(uri = %req.uri(), "redirect anonymous request to login");
        let mut response = Response::new(ResponseBody::empty());
        *response.status_mut() = StatusCode::FOUND;
        response.headers_mut().insert(http::header::LOCATION, self.authenticator.login_location().clone());
        response
    }
}
