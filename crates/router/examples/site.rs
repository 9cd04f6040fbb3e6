//! Routes a handful of in-process requests through a small site and prints the answers.
//!
//! Run with `cargo run --example site`.

use bytes::Bytes;
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use micro_router::auth::{AuthError, Authenticator, CookieCodec, MemoryUserStore, User};
use micro_router::config::{Config, init_tracing};
use micro_router::decorator::{AuthenticatedDecorator, Decorator, PanicRecoveryDecorator, RequestLogDecorator};
use micro_router::dispatch::MethodDispatcher;
use micro_router::extract::CurrentUser;
use micro_router::route::uuid_validator;
use micro_router::{PathParams, RequestArgs, Route, Router, handler_fn};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Stores the session values in clear text, never use this outside of a demo.
#[derive(Debug)]
struct PlainCodec;

impl CookieCodec for PlainCodec {
    fn encode(&self, _name: &str, values: &HashMap<String, String>) -> Result<String, AuthError> {
        Ok(values.get("id").cloned().unwrap_or_default())
    }

    fn decode(&self, _name: &str, token: &str) -> Result<HashMap<String, String>, AuthError> {
        if token.is_empty() {
            return Err(AuthError::decode("empty session"));
        }
        Ok(HashMap::from([("id".to_owned(), token.to_owned())]))
    }
}

async fn home(CurrentUser(user): CurrentUser) -> String {
    match user {
        Some(user) => format!("welcome back {}", user.username()),
        None => "welcome".to_owned(),
    }
}

async fn show_post(params: PathParams) -> String {
    format!("post {}", params.get("id").unwrap_or_default())
}

async fn create_post(args: RequestArgs) -> (StatusCode, String) {
    match args.get_string("title") {
        Ok(title) => (StatusCode::CREATED, format!("created {title}")),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_json(r#"{ "LogLevel": "info" }"#)?;
    init_tracing(config.level()?)?;

    let store = MemoryUserStore::new();
    store.insert(User::new("0b4a6f3e-2a54-4c6e-9a3d-2f0d1c9e8b7a", "alice"));
    let authenticator = Arc::new(Authenticator::new(config.authentication.clone(), Arc::new(store), Arc::new(PlainCodec))?);

    let posts = MethodDispatcher::builder().get(handler_fn(show_post)).post(handler_fn(create_post)).build()?;
    let gate = AuthenticatedDecorator::new(Arc::clone(&authenticator));

    let router = Router::builder()
        .with_global_decorator(PanicRecoveryDecorator::new(handler_fn(|| async { StatusCode::INTERNAL_SERVER_ERROR })))
        .with_global_decorator(RequestLogDecorator::with_authenticator(Arc::clone(&authenticator)))
        .route(Route::exact("/", handler_fn(home)))
        .route(Route::parametric("/posts/:id", posts).validate("id", uuid_validator))
        .route(Route::exact("/account", gate.decorate(handler_fn(home))))
        .with_static(config.static_prefix.clone(), config.static_root.clone())
        .build();

    let requests = [
        (Method::GET, "/", None),
        (Method::GET, "/account", None),
        (Method::GET, "/account", Some("session=0b4a6f3e-2a54-4c6e-9a3d-2f0d1c9e8b7a")),
        (Method::HEAD, "/posts/0b4a6f3e-2a54-4c6e-9a3d-2f0d1c9e8b7a", None),
        (Method::DELETE, "/posts/0b4a6f3e-2a54-4c6e-9a3d-2f0d1c9e8b7a", None),
        (Method::GET, "/posts/123", None),
    ];

    for (method, uri, cookie) in requests {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(http::header::COOKIE, cookie);
        }
        let response = router.call(request.body(Full::<Bytes>::default())?).await;
        let (parts, body) = response.into_parts();
        let body = body.collect().await.map_err(|e| e.to_string())?.to_bytes();
        info!(status = %parts.status, headers = ?parts.headers, body = ?body, "answered {uri}");
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/posts/0b4a6f3e-2a54-4c6e-9a3d-2f0d1c9e8b7a")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Full::new(Bytes::from_static(b"title=hello")))?;
    let response = router.call(request).await;
    info!(status = %response.status(), "answered form post");

    Ok(())
}
