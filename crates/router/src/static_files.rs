//! Serving files from a directory.

use crate::RequestContext;
use crate::body::{OptionReqBody, ResponseBody};
use crate::handler::RequestHandler;
use crate::responder::Responder;
use async_trait::async_trait;
use http::{HeaderValue, Response, StatusCode};
use mime::Mime;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const INDEX_FILE: &str = "index.html";

/// Serves the files under `root` for paths starting with `prefix`.
///
/// `/static/css/site.css` with prefix `/static/` maps to `<root>/css/site.css`, a trailing slash
/// maps to `index.html`. Paths climbing out of the root with `..` are refused.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    prefix: String,
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self { prefix: prefix.into(), root: root.into() }
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = path.strip_prefix(self.prefix.as_str()).unwrap_or(path);

        let mut file = self.root.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty() && *s != ".") {
            if segment == ".." || segment.contains('\\') {
                return None;
            }
            file.push(segment);
        }

        if relative.is_empty() || relative.ends_with('/') {
            file.push(INDEX_FILE);
        }
        Some(file)
    }
}

#[async_trait]
impl RequestHandler for StaticFiles {
    async fn invoke(&self, req: &mut RequestContext<'_>, _req_body: OptionReqBody) -> Response<ResponseBody> {
        let path = req.path();
        let Some(file) = self.resolve(&path) else {
            debug!(path = %path, "refuse static path outside of root");
            return StatusCode::NOT_FOUND.response_to(req);
        };

        match tokio::fs::read(&file).await {
            Ok(content) => {
                let mut response = Response::new(ResponseBody::from(content));
                if let Ok(content_type) = HeaderValue::try_from(content_type(&file).as_ref()) {
                    response.headers_mut().insert(http::header::CONTENT_TYPE, content_type);
                }
                response
            }
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
                StatusCode::NOT_FOUND.response_to(req)
            }
            Err(e) => {
                warn!(file = %file.display(), cause = %e, "failed to read static file");
                StatusCode::INTERNAL_SERVER_ERROR.response_to(req)
            }
        }
    }
}

fn content_type(file: &Path) -> Mime {
    let extension = file.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html" | "htm") => mime::TEXT_HTML_UTF_8,
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("js") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("json") => mime::APPLICATION_JSON,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("svg") => mime::IMAGE_SVG,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}
