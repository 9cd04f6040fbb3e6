//! Route matching.
//!
//! A [`Route`] decides whether a request path belongs to it and supplies the handler to run.
//! Three shapes exist:
//!
//! - [`Route::exact`]: the normalized path must equal the pattern, `/about` and `/about/` are
//!   the same route
//! - [`Route::prefix`]: the path only has to start with the prefix, used to serve static assets
//! - [`Route::parametric`]: `/users/:id/posts/:post` style patterns, where `:name` segments
//!   capture the path segment at the same position, optionally checked by a validator
//!
//! # Example
//! ```
//! use micro_router::route::{uuid_validator, Route};
//! use micro_router::handler_fn;
//!
//! let route = Route::parametric("/users/:id", handler_fn(|| async { "user" })).validate("id", uuid_validator);
//!
//! assert!(route.matches("/users/0b4a6f3e-2a54-4c6e-9a3d-2f0d1c9e8b7a"));
//! assert!(!route.matches("/users/123"));
//! ```

use crate::handler::RequestHandler;
use crate::request::PathParams;
use std::fmt;
use std::sync::Arc;

/// A predicate checked against the value of a path capture.
pub type Validator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

pub enum Route {
    Exact(ExactRoute),
    Prefix(PrefixRoute),
    Parametric(ParamRoute),
}

/// A route for a single path, built by [`Route::exact`].
pub struct ExactRoute {
    pattern: String,
    handler: Box<dyn RequestHandler>,
}

/// A route for a path prefix, built by [`Route::prefix`].
pub struct PrefixRoute {
    prefix: String,
    handler: Box<dyn RequestHandler>,
}

/// A route made of literal and capture segments.
pub struct ParamRoute {
    segments: Vec<Segment>,
    handler: Box<dyn RequestHandler>,
}

enum Segment {
    Literal(String),
    Capture { name: String, validator: Option<Validator> },
}

impl Route {
    /// A route matching a single path, with or without trailing slash.
    pub fn exact(pattern: impl Into<String>, handler: impl RequestHandler + 'static) -> Self {
        let mut pattern = pattern.into();
        if !pattern.ends_with('/') {
            pattern.push('/');
        }
        Route::Exact(ExactRoute { pattern, handler: Box::new(handler) })
    }

    /// A route matching every path that starts with `prefix`.
    pub fn prefix(prefix: impl Into<String>, handler: impl RequestHandler + 'static) -> Self {
        Route::Prefix(PrefixRoute { prefix: prefix.into(), handler: Box::new(handler) })
    }

    /// A route matching paths segment by segment, `:name` segments capture a value.
    pub fn parametric(pattern: impl AsRef<str>, handler: impl RequestHandler + 'static) -> ParamRoute {
        let segments = split_segments(pattern.as_ref())
            .into_iter()
            .map(|segment| match capture_name(segment) {
                Some(name) => Segment::Capture { name: name.to_owned(), validator: None },
                None => Segment::Literal(segment.to_owned()),
            })
            .collect();

        ParamRoute { segments, handler: Box::new(handler) }
    }

    /// Checks whether this route claims `path`.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Route::Exact(route) => route.matches(path),
            Route::Prefix(route) => path.starts_with(route.prefix.as_str()),
            Route::Parametric(route) => route.matches(path),
        }
    }

    /// The captures of `path`, empty for non parametric routes.
    ///
    /// Only meaningful for a path this route [`matches`](Route::matches).
    pub fn params(&self, path: &str) -> PathParams {
        match self {
            Route::Parametric(route) => route.params(path),
            Route::Exact(_) | Route::Prefix(_) => PathParams::empty(),
        }
    }

    pub fn is_parametric(&self) -> bool {
        matches!(self, Route::Parametric(_))
    }

    pub fn handler(&self) -> &dyn RequestHandler {
        match self {
            Route::Exact(route) => route.handler.as_ref(),
            Route::Prefix(route) => route.handler.as_ref(),
            Route::Parametric(route) => route.handler.as_ref(),
        }
    }

    pub(crate) fn map_handler<F>(self, f: F) -> Self
    where
        F: FnOnce(Box<dyn RequestHandler>) -> Box<dyn RequestHandler>,
    {
        match self {
            Route::Exact(ExactRoute { pattern, handler }) => Route::Exact(ExactRoute { pattern, handler: f(handler) }),
            Route::Prefix(PrefixRoute { prefix, handler }) => Route::Prefix(PrefixRoute { prefix, handler: f(handler) }),
            Route::Parametric(ParamRoute { segments, handler }) => {
                Route::Parametric(ParamRoute { segments, handler: f(handler) })
            }
        }
    }
}

impl ExactRoute {
    /// The pattern, always ending with `/`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn matches(&self, path: &str) -> bool {
        if path.is_empty() || path.ends_with('/') {
            path == self.pattern
        } else {
            path.len() + 1 == self.pattern.len() && self.pattern.starts_with(path)
        }
    }
}

impl PrefixRoute {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl ParamRoute {
    /// Attaches a validator to the capture called `name`.
    ///
    /// # Panics
    /// Panics if the pattern has no capture with that name, this is a programming error in the
    /// route table.
    #[must_use]
    pub fn validate<F>(mut self, name: &str, validator: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let capture = self.segments.iter_mut().find_map(|segment| match segment {
            Segment::Capture { name: capture, validator: slot } if capture == name => Some(slot),
            _ => None,
        });

        match capture {
            Some(slot) => *slot = Some(Arc::new(validator)),
            None => panic!("route has no capture named '{name}'"),
        }
        self
    }

    /// Attaches validators to the captures in the order they appear in the pattern.
    ///
    /// The first validator checks the first capture, the second one the second capture, and so
    /// on. Surplus validators are ignored, captures without a validator accept any value.
    #[must_use]
    pub fn validators<I>(mut self, validators: I) -> Self
    where
        I: IntoIterator<Item = Validator>,
    {
        let slots = self.segments.iter_mut().filter_map(|segment| match segment {
            Segment::Capture { validator, .. } => Some(validator),
            Segment::Literal(_) => None,
        });

        for (slot, validator) in slots.zip(validators) {
            *slot = Some(validator);
        }
        self
    }

    pub fn matches(&self, path: &str) -> bool {
        let path_segments = split_segments(path);
        if path_segments.len() != self.segments.len() {
            return false;
        }

        self.segments.iter().zip(path_segments).all(|(segment, value)| match segment {
            Segment::Capture { validator, .. } if !value.is_empty() => validator.as_ref().is_none_or(|v| v(value)),
            Segment::Capture { .. } => false,
            Segment::Literal(literal) => literal == value,
        })
    }

    pub fn params(&self, path: &str) -> PathParams {
        self.segments
            .iter()
            .zip(split_segments(path))
            .filter_map(|(segment, value)| match segment {
                Segment::Capture { name, .. } => Some((name.as_str(), value)),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}

impl From<ParamRoute> for Route {
    fn from(route: ParamRoute) -> Self {
        Route::Parametric(route)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Exact(route) => route.fmt(f),
            Route::Prefix(route) => route.fmt(f),
            Route::Parametric(route) => route.fmt(f),
        }
    }
}

impl fmt::Debug for ExactRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exact").field("pattern", &self.pattern).finish_non_exhaustive()
    }
}

impl fmt::Debug for PrefixRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prefix").field("prefix", &self.prefix).finish_non_exhaustive()
    }
}

impl fmt::Debug for ParamRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pattern = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(literal) => literal.clone(),
                Segment::Capture { name, .. } => format!(":{name}"),
            })
            .collect::<Vec<_>>()
            .join("/");
        f.debug_struct("Parametric").field("pattern", &pattern).finish_non_exhaustive()
    }
}

fn capture_name(segment: &str) -> Option<&str> {
    segment.strip_prefix(':').filter(|name| !name.is_empty())
}

/// Splits on `/` and drops trailing empty segments, so `/a/b/` and `/a/b` compare equal.
fn split_segments(path: &str) -> Vec<&str> {
    let mut segments = path.split('/').collect::<Vec<_>>();
    while segments.last().is_some_and(|segment| segment.is_empty()) {
        segments.pop();
    }
    segments
}

/// Accepts lower case hyphenated UUIDs such as `0b4a6f3e-2a54-4c6e-9a3d-2f0d1c9e8b7a`.
pub fn uuid_validator(value: &str) -> bool {
    value.len() == 36
        && value.bytes().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => b == b'-',
            _ => b.is_ascii_digit() || (b'a'..=b'f').contains(&b),
        })
}
