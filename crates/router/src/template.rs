//! Glue between handlers and an HTML template engine.
//!
//! The router ships no engine. Anything implementing [`TemplateRenderer`] can be plugged in;
//! [`template_args`] builds the value every page template receives.

use crate::RequestContext;
use crate::args::RequestArgs;
use crate::auth::User;
use crate::body::ResponseBody;
use http::{HeaderValue, Response, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {name}")]
    NotFound { name: String },

    #[error("failed to render template {name}: {reason}")]
    Render { name: String, reason: String },
}

impl TemplateError {
    pub fn not_found<S: ToString>(name: S) -> Self {
        Self::NotFound { name: name.to_string() }
    }

    pub fn render<N: ToString, R: ToString>(name: N, reason: R) -> Self {
        Self::Render { name: name.to_string(), reason: reason.to_string() }
    }
}

/// Renders named templates.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, name: &str, out: &mut Vec<u8>, args: &Value) -> Result<(), TemplateError>;
}

/// Page level values shared by every template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageInfo {
    pub title: String,
    pub style_sheets: Vec<String>,
}

impl PageInfo {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), style_sheets: Vec::new() }
    }

    #[must_use]
    pub fn with_style_sheet(mut self, href: impl Into<String>) -> Self {
        self.style_sheets.push(href.into());
        self
    }
}

/// Builds `{ "CurrentUser", "PageInfo", "RequestArgs" }` for a page template.
///
/// `RequestArgs` is empty when the arguments of the request were never resolved.
pub fn template_args(req: &RequestContext<'_>, current_user: Option<&User>, page_info: &PageInfo) -> Value {
    let default_args = RequestArgs::default();
    let args = req.args().unwrap_or(&default_args);
    json!({
        "CurrentUser": current_user,
        "PageInfo": page_info,
        "RequestArgs": args,
    })
}

/// Renders `name` into an HTML response, `500 Internal Server Error` when rendering fails.
pub fn render_response(renderer: &dyn TemplateRenderer, name: &str, args: &Value) -> Response<ResponseBody> {
    let mut out = Vec::new();
    match renderer.render(name, &mut out, args) {
        Ok(()) => {
            let mut response = Response::new(ResponseBody::from(out));
            response
                .headers_mut()
                .insert(http::header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
            response
        }
        Err(e) => {
            error!(template = name, cause = %e, "failed to render template");
            let mut response = Response::new(ResponseBody::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}
