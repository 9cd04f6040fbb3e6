use crate::RequestContext;
use crate::auth::Authenticator;
use crate::body::{OptionReqBody, ResponseBody};
use crate::decorator::Decorator;
use crate::handler::RequestHandler;
use crate::response::StatusRecorder;
use async_trait::async_trait;
use http::Response;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Logs one line per request: status, method, URI, user and elapsed time.
///
/// With an [`Authenticator`] the user is resolved from the session cookie, otherwise only a
/// user already attached to the request is reported.
#[derive(Debug, Clone, Default)]
pub struct RequestLogDecorator {
    authenticator: Option<Arc<Authenticator>>,
}

impl RequestLogDecorator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authenticator(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator: Some(authenticator) }
    }
}

impl<H: RequestHandler> Decorator<H> for RequestLogDecorator {
    type Out = RequestLogHandler<H>;

    fn decorate(&self, raw: H) -> Self::Out {
        RequestLogHandler { handler: raw, authenticator: self.authenticator.clone() }
    }
}

#[derive(Debug)]
pub struct RequestLogHandler<H> {
    handler: H,
    authenticator: Option<Arc<Authenticator>>,
}

#[async_trait]
impl<H: RequestHandler> RequestHandler for RequestLogHandler<H> {
    async fn invoke(&self, req: &mut RequestContext<'_>, req_body: OptionReqBody) -> Response<ResponseBody> {
        let start = Instant::now();
        let mut recorder = StatusRecorder::new();

        let response = recorder.record(self.handler.invoke(req, req_body).await);

        let user = match &self.authenticator {
            Some(authenticator) => authenticator.current_user(req),
            None => req.current_user().cloned(),
        };
        let user = user.map_or_else(|| "Anonymous".to_owned(), |user| format!("@{}", user.username()));

        info!(
            status = recorder.status().as_u16(),
            method = %req.method(),
            uri = %req.uri(),
            user = %user,
            elapsed = ?start.elapsed(),
            "request served"
        );
        response
    }
}
