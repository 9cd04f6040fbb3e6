//! Middleware as decorators.
//!
//! A [`Decorator`] wraps a handler into another handler. Decorators compose with
//! [`DecoratorExt::and_then`], the first decorator being the innermost one. Global decorators
//! of a router stack the same way:
//!
//! ```
//! use micro_router::decorator::{PanicRecoveryDecorator, RequestLogDecorator};
//! use micro_router::{Route, Router, handler_fn};
//! use http::StatusCode;
//!
//! let _router = Router::builder()
//!     .with_global_decorator(PanicRecoveryDecorator::new(handler_fn(|| async { StatusCode::INTERNAL_SERVER_ERROR })))
//!     .with_global_decorator(RequestLogDecorator::new())
//!     .route(Route::exact("/", handler_fn(|| async { "home" })))
//!     .build();
//! ```

mod authenticated;
mod log;
mod recover;

pub use authenticated::{AuthenticatedDecorator, AuthenticatedHandler};
pub use log::{RequestLogDecorator, RequestLogHandler};
pub use recover::{PanicRecoveryDecorator, PanicRecoveryHandler};

pub trait Decorator<In> {
    type Out;

    fn decorate(&self, raw: In) -> Self::Out;
}

pub trait DecoratorExt<In>: Decorator<In> {
    /// Applies `self` first, then `decorator` around the result.
    fn and_then<D>(self, decorator: D) -> DecoratorComposer<Self, D>
    where
        Self: Sized,
    {
        DecoratorComposer::new(self, decorator)
    }

    /// Applies `decorator` first, then `self` around the result.
    fn compose<D>(self, decorator: D) -> DecoratorComposer<D, Self>
    where
        Self: Sized,
    {
        DecoratorComposer::new(decorator, self)
    }
}

impl<T: Decorator<In> + ?Sized, In> DecoratorExt<In> for T {}

/// Leaves its input untouched.
#[derive(Default, Clone, Copy, Debug)]
pub struct IdentityDecorator;

impl<In> Decorator<In> for IdentityDecorator {
    type Out = In;

    #[inline]
    fn decorate(&self, raw: In) -> Self::Out {
        raw
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DecoratorComposer<D1, D2> {
    inner: D1,
    outer: D2,
}

impl<D1, D2> DecoratorComposer<D1, D2> {
    pub fn new(inner: D1, outer: D2) -> Self {
        Self { inner, outer }
    }
}

impl<In, D1, D2> Decorator<In> for DecoratorComposer<D1, D2>
where
    D1: Decorator<In>,
    D2: Decorator<D1::Out>,
{
    type Out = D2::Out;

    fn decorate(&self, raw: In) -> Self::Out {
        self.outer.decorate(self.inner.decorate(raw))
    }
}

/// A decorator made of a plain function.
#[derive(Clone, Copy, Debug)]
pub struct DecoratorFn<F> {
    f: F,
}

pub fn decorator_fn<In, Out, F>(f: F) -> DecoratorFn<F>
where
    F: Fn(In) -> Out,
{
    DecoratorFn { f }
}

impl<In, Out, F> Decorator<In> for DecoratorFn<F>
where
    F: Fn(In) -> Out,
{
    type Out = Out;

    fn decorate(&self, raw: In) -> Self::Out {
        (self.f)(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::{Decorator, DecoratorExt, IdentityDecorator, decorator_fn};

    #[test]
    fn identity_is_noop() {
        assert_eq!(IdentityDecorator.decorate(7), 7);
    }

    #[test]
    fn and_then_runs_inner_first() {
        let push = |c: char| decorator_fn(move |mut s: String| {
            s.push(c);
            s
        });

        let decorator = push('a').and_then(push('b')).and_then(push('c'));
        assert_eq!(decorator.decorate(String::new()), "abc");

        let decorator = push('a').compose(push('b'));
        assert_eq!(decorator.decorate(String::new()), "ba");
    }
}
