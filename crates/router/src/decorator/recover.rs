use crate::RequestContext;
use crate::body::{OptionReqBody, ResponseBody};
use crate::decorator::Decorator;
use crate::handler::RequestHandler;
use async_trait::async_trait;
use futures::FutureExt;
use http::Response;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::error;

/// Turns a panicking handler into a call to an error handler.
#[derive(Clone)]
pub struct PanicRecoveryDecorator {
    error_handler: Arc<dyn RequestHandler>,
}

impl fmt::Debug for PanicRecoveryDecorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicRecoveryDecorator").finish_non_exhaustive()
    }
}

impl PanicRecoveryDecorator {
    pub fn new(error_handler: impl RequestHandler + 'static) -> Self {
        Self { error_handler: Arc::new(error_handler) }
    }
}

impl<H: RequestHandler> Decorator<H> for PanicRecoveryDecorator {
    type Out = PanicRecoveryHandler<H>;

    fn decorate(&self, raw: H) -> Self::Out {
        PanicRecoveryHandler { handler: raw, error_handler: Arc::clone(&self.error_handler) }
    }
}

pub struct PanicRecoveryHandler<H> {
    handler: H,
    error_handler: Arc<dyn RequestHandler>,
}

impl<H> fmt::Debug for PanicRecoveryHandler<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicRecoveryHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<H: RequestHandler> RequestHandler for PanicRecoveryHandler<H> {
    async fn invoke(&self, req: &mut RequestContext<'_>, req_body: OptionReqBody) -> Response<ResponseBody> {
        let result = AssertUnwindSafe(self.handler.invoke(req, req_body.clone())).catch_unwind().await;

        match result {
            Ok(response) => response,
            Err(payload) => {
                let cause = panic_message(payload.as_ref());
                error!(method = %req.method(), uri = %req.uri(), cause = %cause, "recovered from handler panic");
                self.error_handler.invoke(req, req_body).await
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
