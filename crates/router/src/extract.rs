//! Handler argument extraction.
//!
//! Values implementing [`FromRequest`] can be used as arguments of functions passed to
//! [`handler_fn`](crate::handler_fn). By the time arguments are extracted the request
//! arguments have been resolved, so extraction itself never fails.
//!
//! # Example
//! ```
//! use http::Method;
//! use micro_router::extract::CurrentUser;
//! use micro_router::{PathParams, handler_fn};
//!
//! async fn show(method: Method, params: PathParams, CurrentUser(user): CurrentUser) -> String {
//!     let name = user.as_ref().map_or("Anonymous", |u| u.username());
//!     format!("{method} {} by {name}", params.get("id").unwrap_or_default())
//! }
//!
//! let _handler = handler_fn(show);
//! ```

use crate::RequestContext;
use crate::args::RequestArgs;
use crate::auth::User;
use crate::request::PathParams;
use http::{HeaderMap, Method, Uri, Version};

pub trait FromRequest: Sized + Send {
    fn from_request(req: &RequestContext<'_>) -> Self;
}

/// The user attached to the request by the authentication decorators, if any.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

impl FromRequest for Method {
    fn from_request(req: &RequestContext<'_>) -> Self {
        req.method().clone()
    }
}

impl FromRequest for Uri {
    fn from_request(req: &RequestContext<'_>) -> Self {
        req.uri().clone()
    }
}

impl FromRequest for Version {
    fn from_request(req: &RequestContext<'_>) -> Self {
        req.version()
    }
}

impl FromRequest for HeaderMap {
    fn from_request(req: &RequestContext<'_>) -> Self {
        req.headers().clone()
    }
}

impl FromRequest for PathParams {
    fn from_request(req: &RequestContext<'_>) -> Self {
        req.path_params().clone()
    }
}

impl FromRequest for RequestArgs {
    fn from_request(req: &RequestContext<'_>) -> Self {
        req.args().cloned().unwrap_or_default()
    }
}

impl FromRequest for CurrentUser {
    fn from_request(req: &RequestContext<'_>) -> Self {
        CurrentUser(req.current_user().cloned())
    }
}

macro_rules! impl_from_request_for_tuple {
    ($($param:ident)*) => {
        impl<$($param,)*> FromRequest for ($($param,)*)
        where
            $($param: FromRequest,)*
        {
            #[allow(unused_variables)]
            fn from_request(req: &RequestContext<'_>) -> Self {
                ($($param::from_request(req),)*)
            }
        }
    }
}

impl_from_request_for_tuple! {}
impl_from_request_for_tuple! { A }
impl_from_request_for_tuple! { A B }
impl_from_request_for_tuple! { A B C }
impl_from_request_for_tuple! { A B C D }
impl_from_request_for_tuple! { A B C D E }
impl_from_request_for_tuple! { A B C D E F }
impl_from_request_for_tuple! { A B C D E F G }
impl_from_request_for_tuple! { A B C D E F G H }
