//! A small HTTP routing layer: ordered routes, per method dispatch and decorator middleware.
//!
//! Requests flow through the pieces in this order:
//!
//! 1. [`Router`] picks the first [`Route`] whose pattern matches the path, resolves the
//!    [`RequestArgs`] and records the path captures of parametric routes
//! 2. a [`dispatch::MethodDispatcher`] (optional) picks the handler for the request method
//! 3. [`decorator`]s run around the selected handler: request logging, panic recovery,
//!    authentication gating
//!
//! Everything a request resolves on the way lives in its [`RequestContext`], passed by `&mut`
//! down the chain.
//!
//! # Example
//! ```
//! use micro_router::dispatch::MethodDispatcher;
//! use micro_router::route::uuid_validator;
//! use micro_router::{PathParams, Route, Router, handler_fn};
//!
//! async fn show(params: PathParams) -> String {
//!     format!("user {}", params.get("id").unwrap_or_default())
//! }
//!
//! let users = MethodDispatcher::builder()
//!     .get(handler_fn(show))
//!     .build()
//!     .unwrap();
//!
//! let router = Router::builder()
//!     .route(Route::exact("/", handler_fn(|| async { "home" })))
//!     .route(Route::parametric("/users/:id", users).validate("id", uuid_validator))
//!     .with_static("/static/", "./static")
//!     .build();
//!
//! assert!(router.find("/users/123").is_none());
//! ```

mod args;
mod body;
mod fn_trait;
mod handler;
mod request;
mod responder;

pub mod auth;
pub mod config;
pub mod decorator;
pub mod dispatch;
pub mod extract;
pub mod response;
pub mod route;
pub mod router;
pub mod static_files;
pub mod template;

pub use args::{ArgsError, MultiMap, RequestArgs};
pub use body::{BoxError, OptionReqBody, ResponseBody};
pub use fn_trait::FnTrait;
pub use handler::{FnHandler, RequestHandler, handler_fn};
pub use request::{PathParams, RequestContext};
pub use responder::Responder;
pub use route::Route;
pub use router::{Router, RouterBuilder};
