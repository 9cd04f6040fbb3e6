//! Response wrappers.
//!
//! - [`StatusRecorder`] remembers the status a handler answered with
//! - [`BodyDropper`] swallows every data frame of a body, used to answer `HEAD` with the
//!   headers of a `GET` handler

use crate::body::ResponseBody;
use http::{HeaderValue, Response, StatusCode};
use http_body::{Body as HttpBody, Frame, SizeHint};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

/// Records the most recent status code seen, `200 OK` until told otherwise.
#[derive(Debug, Clone, Copy)]
pub struct StatusRecorder {
    status: StatusCode,
}

impl Default for StatusRecorder {
    fn default() -> Self {
        Self { status: StatusCode::OK }
    }
}

impl StatusRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the status of `response` and hands it back untouched.
    pub fn record<B>(&mut self, response: Response<B>) -> Response<B> {
        self.status = response.status();
        response
    }

    pub fn write_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

pin_project! {
    /// A body that accepts every data frame of the inner body and forwards none of them.
    ///
    /// The inner body is still driven to its end, so streaming handlers run to completion.
    #[derive(Debug)]
    pub struct BodyDropper<B> {
        #[pin]
        inner: B,
        dropped: u64,
    }
}

impl<B> BodyDropper<B> {
    pub fn new(inner: B) -> Self {
        Self { inner, dropped: 0 }
    }

    /// Number of body bytes discarded so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<B> HttpBody for BodyDropper<B>
where
    B: HttpBody,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();
        loop {
            match ready!(this.inner.as_mut().poll_frame(cx)) {
                Some(Ok(frame)) => {
                    if let Some(data) = frame.data_ref() {
                        *this.dropped += bytes::Buf::remaining(data) as u64;
                    }
                }
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => return Poll::Ready(None),
            }
        }
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(0)
    }
}

/// Turns a `GET` response into its `HEAD` counterpart: same status and headers, no body.
///
/// When the body length is known and no `Content-Length` was set, the header is filled in so
/// the client still learns the size of the representation.
pub fn drop_body(response: Response<ResponseBody>) -> Response<ResponseBody> {
    let (mut parts, body) = response.into_parts();

    if !parts.headers.contains_key(http::header::CONTENT_LENGTH)
        && let Some(len) = body.size_hint().exact()
    {
        parts.headers.insert(http::header::CONTENT_LENGTH, HeaderValue::from(len));
    }

    Response::from_parts(parts, ResponseBody::stream(BodyDropper::new(body)))
}
