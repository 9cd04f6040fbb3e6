//! Response handling module that converts handler results into HTTP responses.
//!
//! This module provides the [`Responder`] trait which defines how different types
//! can be converted into HTTP responses. It includes implementations for common types
//! like Result, Option, String, etc.

use crate::RequestContext;
use crate::args::ArgsError;
use crate::body::ResponseBody;
use http::{HeaderValue, Response, StatusCode};
use std::convert::Infallible;

/// A trait for types that can be converted into HTTP responses.
///
/// Types implementing this trait can be returned directly from handler functions
/// and will be automatically converted into HTTP responses.
pub trait Responder {
    fn response_to(self, req: &RequestContext<'_>) -> Response<ResponseBody>;
}

/// The Ok and Err variants must both implement Responder.
impl<T: Responder, E: Responder> Responder for Result<T, E> {
    fn response_to(self, req: &RequestContext<'_>) -> Response<ResponseBody> {
        match self {
            Ok(t) => t.response_to(req),
            Err(e) => e.response_to(req),
        }
    }
}

/// None case returns an empty response.
impl<T: Responder> Responder for Option<T> {
    fn response_to(self, req: &RequestContext<'_>) -> Response<ResponseBody> {
        match self {
            Some(t) => t.response_to(req),
            None => Response::new(ResponseBody::empty()),
        }
    }
}

/// Pre-built responses pass through, the body is converted to [`ResponseBody`].
impl<B> Responder for Response<B>
where
    B: Into<ResponseBody>,
{
    fn response_to(self, _req: &RequestContext<'_>) -> Response<ResponseBody> {
        self.map(Into::into)
    }
}

impl<T: Responder> Responder for (StatusCode, T) {
    fn response_to(self, req: &RequestContext<'_>) -> Response<ResponseBody> {
        let (status, responder) = self;
        let mut response = responder.response_to(req);
        *response.status_mut() = status;
        response
    }
}

impl<T: Responder> Responder for Box<T> {
    fn response_to(self, req: &RequestContext<'_>) -> Response<ResponseBody> {
        (*self).response_to(req)
    }
}

impl Responder for () {
    fn response_to(self, _req: &RequestContext<'_>) -> Response<ResponseBody> {
        Response::new(ResponseBody::empty())
    }
}

impl Responder for StatusCode {
    fn response_to(self, _req: &RequestContext<'_>) -> Response<ResponseBody> {
        let mut response = Response::new(ResponseBody::empty());
        *response.status_mut() = self;
        response
    }
}

impl Responder for &'static str {
    fn response_to(self, _req: &RequestContext<'_>) -> Response<ResponseBody> {
        text_response(ResponseBody::from(self))
    }
}

impl Responder for String {
    fn response_to(self, _req: &RequestContext<'_>) -> Response<ResponseBody> {
        text_response(ResponseBody::from(self))
    }
}

impl Responder for Infallible {
    fn response_to(self, _req: &RequestContext<'_>) -> Response<ResponseBody> {
        match self {}
    }
}

impl Responder for ArgsError {
    fn response_to(self, req: &RequestContext<'_>) -> Response<ResponseBody> {
        match self {
            ArgsError::ParameterNotFound { .. } => (StatusCode::BAD_REQUEST, "missing parameter").response_to(req),
            ArgsError::MalformedRequest { .. } => (StatusCode::BAD_REQUEST, "Unable to parse request").response_to(req),
        }
    }
}

fn text_response(body: ResponseBody) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    response
        .headers_mut()
        .insert(http::header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

#[cfg(test)]
mod tests {
    use super::Responder;
    use crate::RequestContext;
    use crate::args::ArgsError;
    use http::{Request, StatusCode};

    #[test]
    fn string_is_plain_text() {
        let header = Request::builder().body(()).unwrap().into_parts().0;
        let req = RequestContext::new(&header);

        let response = "hello".response_to(&req);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn status_tuple_overrides_status() {
        let header = Request::builder().body(()).unwrap().into_parts().0;
        let req = RequestContext::new(&header);

        let response = (StatusCode::CREATED, String::from("made")).response_to(&req);
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = (StatusCode::ACCEPTED, StatusCode::NO_CONTENT).response_to(&req);
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let response = Err::<(), _>(ArgsError::malformed_request("bad form")).response_to(&req);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
