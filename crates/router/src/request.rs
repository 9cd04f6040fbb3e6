//! Request handling module that provides access to HTTP request information and per request state.
//!
//! This module contains the core types for working with HTTP requests in the router:
//! - `RequestContext`: request headers plus the state resolved while the request travels through
//!   router, dispatcher and decorators
//! - `PathParams`: named captures extracted by a parametric route

use crate::args::{ArgsError, RequestArgs};
use crate::auth::User;
use crate::body::OptionReqBody;
use http::request::Parts;
use http::{HeaderMap, Method, Uri, Version};
use serde::Serialize;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::collections::HashMap;

/// The request scoped state passed by `&mut` from the router down to the handler.
///
/// It borrows the request header for the lifetime of the request and owns everything resolved
/// on the way: path parameters, the [`RequestArgs`] and the current user.
#[derive(Debug)]
pub struct RequestContext<'req> {
    request_header: &'req Parts,
    path_params: PathParams,
    args: Option<RequestArgs>,
    user: UserSlot,
}

#[derive(Debug)]
enum UserSlot {
    Unresolved,
    Anonymous,
    User(User),
}

impl<'req> RequestContext<'req> {
    /// Creates a new RequestContext with the given request header
    pub fn new(request_header: &'req Parts) -> Self {
        Self { request_header, path_params: PathParams::empty(), args: None, user: UserSlot::Unresolved }
    }

    /// Returns a reference to the underlying request header
    pub fn request_header(&self) -> &'req Parts {
        self.request_header
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &'req Method {
        &self.request_header.method
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &'req Uri {
        &self.request_header.uri
    }

    /// The request path with each segment percent-decoded, the path routes are matched against.
    ///
    /// An escaped `/` stays escaped, so decoding never changes how the path splits into segments.
    pub fn path(&self) -> Cow<'req, str> {
        decode_path(self.request_header.uri.path())
    }

    /// Returns the HTTP version of the request
    pub fn version(&self) -> Version {
        self.request_header.version
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &'req HeaderMap {
        &self.request_header.headers
    }

    /// Returns the path parameters captured by the matched route
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    pub(crate) fn set_path_params(&mut self, path_params: PathParams) {
        if let Some(args) = self.args.as_mut() {
            args.set_url_params(path_params.clone());
        }
        self.path_params = path_params;
    }

    /// The request arguments, if they have been resolved already.
    pub fn args(&self) -> Option<&RequestArgs> {
        self.args.as_ref()
    }

    /// Resolves the request arguments on first call and returns the cached value afterwards.
    pub async fn resolve_args(&mut self, body: &OptionReqBody) -> Result<&RequestArgs, ArgsError> {
        if self.args.is_none() {
            let mut args = RequestArgs::resolve(self.request_header, body).await?;
            args.set_url_params(self.path_params.clone());
            self.args = Some(args);
        }

        Ok(self.args.get_or_insert_default())
    }

    /// The user attached to this request, `None` when anonymous or not resolved yet.
    pub fn current_user(&self) -> Option<&User> {
        match &self.user {
            UserSlot::User(user) => Some(user),
            UserSlot::Unresolved | UserSlot::Anonymous => None,
        }
    }

    /// Whether the current user has been looked up already, successfully or not.
    pub fn is_user_resolved(&self) -> bool {
        !matches!(self.user, UserSlot::Unresolved)
    }

    pub fn set_current_user(&mut self, user: Option<User>) {
        self.user = match user {
            Some(user) => UserSlot::User(user),
            None => UserSlot::Anonymous,
        };
    }
}

/// Named captures extracted from the request path by a parametric route.
///
/// For example, matching `/users/:id` against `/users/42` yields `id = "42"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathParams {
    inner: HashMap<String, String>,
}

impl PathParams {
    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self { inner: HashMap::new() }
    }

    /// Returns true if there are no path parameters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of path parameters
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Gets the value of a path parameter by its name
    /// Returns None if the parameter doesn't exist
    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        self.inner.get(key.as_ref()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { inner: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

fn decode_path(raw: &str) -> Cow<'_, str> {
    if !raw.contains('%') {
        return Cow::Borrowed(raw);
    }

    let segments = raw
        .split('/')
        .map(|segment| {
            let segment = percent_decode_str(segment).decode_utf8_lossy();
            if segment.contains('/') { Cow::Owned(segment.replace('/', "%2F")) } else { segment }
        })
        .collect::<Vec<_>>();
    Cow::Owned(segments.join("/"))
}
