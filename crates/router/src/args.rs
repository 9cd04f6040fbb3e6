//! Aggregated request arguments.
//!
//! [`RequestArgs`] collects everything a handler usually asks of a request into four maps:
//! headers, URL parameters captured by a parametric route, query parameters and form body
//! parameters. It is resolved at most once per request and cached in the
//! [`RequestContext`](crate::RequestContext).

use crate::body::OptionReqBody;
use crate::request::PathParams;
use http::HeaderMap;
use http::request::Parts;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

pub type MultiMap = HashMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum ArgsError {
    #[error("parameter not found: {key}")]
    ParameterNotFound { key: String },

    #[error("malformed request: {reason}")]
    MalformedRequest { reason: String },
}

impl ArgsError {
    pub fn parameter_not_found<S: ToString>(key: S) -> Self {
        Self::ParameterNotFound { key: key.to_string() }
    }

    pub fn malformed_request<S: ToString>(reason: S) -> Self {
        Self::MalformedRequest { reason: reason.to_string() }
    }
}

/// Per request view of headers, URL, query and body parameters.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestArgs {
    headers: MultiMap,
    #[serde(rename = "URLParams")]
    url_params: PathParams,
    query_params: MultiMap,
    body_params: MultiMap,
}

impl RequestArgs {
    /// Resolves the arguments of a request.
    ///
    /// The body is only read when the request is `application/x-www-form-urlencoded`; in that
    /// case it is consumed and later readers of `body` will find it empty.
    pub async fn resolve(header: &Parts, body: &OptionReqBody) -> Result<Self, ArgsError> {
        let headers = collect_headers(&header.headers);

        let query_params = match header.uri.query() {
            Some(query) => parse_pairs(query.as_bytes())?,
            None => MultiMap::new(),
        };

        let body_params = if is_form_urlencoded(&header.headers) && body.can_consume().await {
            let bytes = body.bytes().await.map_err(ArgsError::malformed_request)?;
            parse_pairs(&bytes)?
        } else {
            MultiMap::new()
        };

        debug!(headers = headers.len(), query = query_params.len(), body = body_params.len(), "resolved request args");
        Ok(Self { headers, url_params: PathParams::empty(), query_params, body_params })
    }

    /// Looks `key` up in the body parameters first, then in the query parameters, and returns
    /// the first value found.
    pub fn get_string(&self, key: &str) -> Result<&str, ArgsError> {
        first_value(&self.body_params, key)
            .or_else(|| first_value(&self.query_params, key))
            .ok_or_else(|| ArgsError::parameter_not_found(key))
    }

    /// First value of a header, the name is matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        first_value(&self.headers, &name.to_ascii_lowercase())
    }

    pub fn url_param(&self, name: &str) -> Option<&str> {
        self.url_params.get(name)
    }

    pub fn headers(&self) -> &MultiMap {
        &self.headers
    }

    pub fn url_params(&self) -> &PathParams {
        &self.url_params
    }

    pub fn query_params(&self) -> &MultiMap {
        &self.query_params
    }

    pub fn body_params(&self) -> &MultiMap {
        &self.body_params
    }

    pub(crate) fn set_url_params(&mut self, url_params: PathParams) {
        self.url_params = url_params;
    }
}

fn first_value<'a>(map: &'a MultiMap, key: &str) -> Option<&'a str> {
    map.get(key).and_then(|values| values.first()).map(String::as_str)
}

fn collect_headers(header_map: &HeaderMap) -> MultiMap {
    let mut headers = MultiMap::with_capacity(header_map.keys_len());
    for (name, value) in header_map {
        headers
            .entry(name.as_str().to_owned())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    headers
}

fn is_form_urlencoded(header_map: &HeaderMap) -> bool {
    header_map
        .get(http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|content_type| content_type.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
}

fn parse_pairs(input: &[u8]) -> Result<MultiMap, ArgsError> {
    let text = std::str::from_utf8(input).map_err(ArgsError::malformed_request)?;
    if let Some(position) = invalid_escape(text) {
        return Err(ArgsError::malformed_request(format!("invalid percent escape at byte {position}")));
    }

    let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(text).map_err(ArgsError::malformed_request)?;

    let mut params = MultiMap::new();
    for (key, value) in pairs {
        params.entry(key).or_default().push(value);
    }
    Ok(params)
}

/// Position of the first `%` not followed by two hex digits.
fn invalid_escape(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(_, &byte)| byte == b'%')
        .map(|(position, _)| position)
        .find(|&position| !bytes.get(position + 1..position + 3).is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)))
}

#[cfg(test)]
mod tests {
    use super::{ArgsError, RequestArgs};
    use crate::body::OptionReqBody;
    use bytes::Bytes;
    use http::Request;
    use http::request::Parts;
    use http_body::Frame;
    use http_body_util::{Full, StreamBody};
    use std::io;

    fn parts(builder: http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn resolves_query_and_headers() {
        let header = parts(Request::builder().uri("/search?q=rust&q=http&page=2").header("X-Trace", "abc"));
        let args = RequestArgs::resolve(&header, &OptionReqBody::empty()).await.unwrap();

        assert_eq!(args.query_params()["q"], vec!["rust".to_string(), "http".to_string()]);
        assert_eq!(args.get_string("page").unwrap(), "2");
        assert_eq!(args.header("x-trace"), Some("abc"));
        assert!(args.body_params().is_empty());
        assert!(args.url_params().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn body_params_take_precedence_over_query() {
        let header = parts(
            Request::builder()
                .method("POST")
                .uri("/login?next=%2Fhome&user=query")
                .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
        );
        let body = OptionReqBody::new(Full::new(Bytes::from_static(b"user=alice&password=s3cret")));

        let args = RequestArgs::resolve(&header, &body).await.unwrap();

        assert_eq!(args.get_string("user").unwrap(), "alice");
        assert_eq!(args.get_string("password").unwrap(), "s3cret");
        assert_eq!(args.get_string("next").unwrap(), "/home");
        assert!(!body.can_consume().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn body_is_left_alone_for_other_content_types() {
        let header = parts(Request::builder().method("POST").uri("/").header(http::header::CONTENT_TYPE, "application/json"));
        let body = OptionReqBody::new(Full::new(Bytes::from_static(b"{\"user\":\"alice\"}")));

        let args = RequestArgs::resolve(&header, &body).await.unwrap();

        assert!(args.body_params().is_empty());
        assert!(body.can_consume().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn content_type_parameters_are_ignored() {
        let header = parts(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded; charset=utf-8"),
        );
        let body = OptionReqBody::new(Full::new(Bytes::from_static(b"a=1")));

        let args = RequestArgs::resolve(&header, &body).await.unwrap();
        assert_eq!(args.get_string("a").unwrap(), "1");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn missing_parameter_is_reported() {
        let header = parts(Request::builder().uri("/"));
        let args = RequestArgs::resolve(&header, &OptionReqBody::empty()).await.unwrap();

        assert!(matches!(args.get_string("absent"), Err(ArgsError::ParameterNotFound { key }) if key == "absent"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn broken_form_body_is_malformed() {
        let header = parts(
            Request::builder().method("POST").uri("/").header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
        );
        let frames = vec![Err::<Frame<Bytes>, _>(io::Error::other("connection reset"))];
        let body = OptionReqBody::new(StreamBody::new(futures::stream::iter(frames)));

        let result = RequestArgs::resolve(&header, &body).await;
        assert!(matches!(result, Err(ArgsError::MalformedRequest { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn invalid_escapes_are_malformed() {
        let header = parts(
            Request::builder().method("POST").uri("/").header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
        );

        for raw in [&b"title=%zz"[..], b"title=100%", b"title=\xff\xfe"] {
            let body = OptionReqBody::new(Full::new(Bytes::copy_from_slice(raw)));
            let result = RequestArgs::resolve(&header, &body).await;
            assert!(matches!(result, Err(ArgsError::MalformedRequest { .. })), "{raw:?}");
        }

        let header = parts(Request::builder().uri("/?q=%4"));
        let result = RequestArgs::resolve(&header, &OptionReqBody::empty()).await;
        assert!(matches!(result, Err(ArgsError::MalformedRequest { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn consumed_form_body_yields_no_body_params() {
        let header = parts(
            Request::builder().method("POST").uri("/").header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
        );
        let body = OptionReqBody::new(Full::new(Bytes::from_static(b"a=1")));
        body.bytes().await.unwrap();

        let args = RequestArgs::resolve(&header, &body).await.unwrap();
        assert!(args.body_params().is_empty());
    }
}
