use crate::RequestContext;
use crate::body::{OptionReqBody, ResponseBody};
use crate::extract::FromRequest;
use crate::fn_trait::FnTrait;
use crate::responder::Responder;
use async_trait::async_trait;
use http::Response;
use std::marker::PhantomData;
use std::sync::Arc;

/// The shape shared by routes, routers, method dispatchers and decorators.
///
/// A handler always produces a response: failures are turned into error responses by the
/// handler itself or by a decorator around it.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, req: &mut RequestContext<'_>, req_body: OptionReqBody) -> Response<ResponseBody>;
}

#[async_trait]
impl<T> RequestHandler for Box<T>
where
    T: RequestHandler + ?Sized,
{
    async fn invoke(&self, req: &mut RequestContext<'_>, req_body: OptionReqBody) -> Response<ResponseBody> {
        (**self).invoke(req, req_body).await
    }
}

#[async_trait]
impl<T> RequestHandler for Arc<T>
where
    T: RequestHandler + ?Sized,
{
    async fn invoke(&self, req: &mut RequestContext<'_>, req_body: OptionReqBody) -> Response<ResponseBody> {
        (**self).invoke(req, req_body).await
    }
}

/// a `FnTrait` holder which represents any async Fn
pub struct FnHandler<F, Args> {
    f: F,
    _phantom: PhantomData<fn(Args)>,
}

impl<F, Args> std::fmt::Debug for FnHandler<F, Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

impl<F, Args> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    fn new(f: F) -> Self {
        Self { f, _phantom: PhantomData }
    }
}

/// Turns an async function into a [`RequestHandler`].
///
/// The arguments are extracted with [`FromRequest`] and the return value is converted with
/// [`Responder`]. Request arguments are resolved before extraction, a malformed form body is
/// answered with `400 Bad Request` without calling the function.
pub fn handler_fn<F, Args>(f: F) -> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    FnHandler::new(f)
}

#[async_trait]
impl<F, Args> RequestHandler for FnHandler<F, Args>
where
    F: FnTrait<Args>,
    F::Output: Responder,
    Args: FromRequest,
{
    async fn invoke(&self, req: &mut RequestContext<'_>, req_body: OptionReqBody) -> Response<ResponseBody> {
        if let Err(e) = req.resolve_args(&req_body).await {
            return e.response_to(req);
        }

        let args = Args::from_request(req);
        let responder = self.f.call(args).await;
        responder.response_to(req)
    }
}
