//! HTTP forwarding for the development proxy

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue, Uri},
    response::{IntoResponse, Response},
};
use futures_util::StreamExt;
use regex::Regex;
use reqwest::Client;

use crate::config::ProxyRule;
use crate::server::{HostError, HostResult};

/// Headers that describe a single connection and are never forwarded
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
];

/// A proxy rule with its rewrite compiled
#[derive(Debug, Clone)]
pub struct ProxyTarget {
    prefix: String,
    target: String,
    ws: bool,
    change_origin: bool,
    rewrite: Option<(Regex, String)>,
}

impl ProxyTarget {
    pub fn compile(rule: &ProxyRule) -> HostResult<Self> {
        let rewrite = match &rule.rewrite_from {
            Some(pattern) => {
                let regex = Regex::new(pattern).map_err(|e| {
                    HostError::Internal(format!("proxy rewrite for {}: {}", rule.prefix, e))
                })?;
                Some((regex, rule.rewrite_to.clone()))
            }
            None => None,
        };

        Ok(Self {
            prefix: rule.prefix.trim_end_matches('/').to_string(),
            target: rule.target.trim_end_matches('/').to_string(),
            ws: rule.ws,
            change_origin: rule.change_origin,
            rewrite,
        })
    }

    pub fn prefix(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn tunnels_websockets(&self) -> bool {
        self.ws
    }

    pub fn changes_origin(&self) -> bool {
        self.change_origin
    }

    /// `/api` matches `/api` and `/api/...` but not `/apix`
    pub fn matches(&self, path: &str) -> bool {
        if self.prefix.is_empty() {
            return true;
        }
        match path.strip_prefix(&self.prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Path sent upstream after the rewrite
    pub fn rewrite_path(&self, path: &str) -> String {
        let rewritten = match &self.rewrite {
            Some((regex, to)) => regex.replace(path, to.as_str()).into_owned(),
            None => path.to_string(),
        };
        if rewritten.starts_with('/') {
            rewritten
        } else {
            format!("/{}", rewritten)
        }
    }

    /// Full upstream URL for an HTTP request
    pub fn upstream_url(&self, uri: &Uri) -> String {
        let base = http_scheme(&self.target);
        self.join(&base, uri)
    }

    /// Full upstream URL for a WebSocket upgrade
    pub fn ws_url(&self, uri: &Uri) -> String {
        let base = if let Some(rest) = self.target.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.target.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.target.clone()
        };
        self.join(&base, uri)
    }

    /// Origin header value the backend expects
    pub fn origin(&self) -> String {
        let base = http_scheme(&self.target);
        match base.split_once("://") {
            Some((scheme, rest)) => {
                let authority = rest.split('/').next().unwrap_or(rest);
                format!("{}://{}", scheme, authority)
            }
            None => base,
        }
    }

    fn join(&self, base: &str, uri: &Uri) -> String {
        let path = self.rewrite_path(uri.path());
        match uri.query() {
            Some(query) => format!("{}{}?{}", base, path, query),
            None => format!("{}{}", base, path),
        }
    }
}

fn http_scheme(target: &str) -> String {
    if let Some(rest) = target.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if let Some(rest) = target.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else {
        target.to_string()
    }
}

/// Copy end-to-end headers
pub(crate) fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if HOP_BY_HOP.contains(name) || name.as_str() == "keep-alive" {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}

/// Forward one HTTP request and relay the upstream answer
pub async fn forward(
    client: &Client,
    target: &ProxyTarget,
    request: Request,
    max_body_bytes: usize,
) -> HostResult<Response> {
    let (parts, body) = request.into_parts();
    let url = target.upstream_url(&parts.uri);

    let declared_len = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > max_body_bytes) {
        return Err(HostError::PayloadTooLarge(max_body_bytes));
    }
    let body = read_body(body, max_body_bytes).await?;

    let mut headers = forwardable_headers(&parts.headers);
    headers.remove(header::CONTENT_LENGTH);
    if target.change_origin && headers.contains_key(header::ORIGIN) {
        let origin = HeaderValue::from_str(&target.origin())
            .map_err(|e| HostError::Internal(format!("Invalid proxy origin: {}", e)))?;
        headers.insert(header::ORIGIN, origin);
    }

    let upstream = client
        .request(parts.method.clone(), &url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| upstream_error(&url, e))?;

    let status = upstream.status();
    let mut response_headers = forwardable_headers(upstream.headers());
    response_headers.remove(header::CONTENT_LENGTH);
    let bytes = upstream.bytes().await.map_err(|e| upstream_error(&url, e))?;

    tracing::debug!(
        method = %parts.method,
        path = %parts.uri.path(),
        upstream = %url,
        status = status.as_u16(),
        "Proxied request"
    );

    Ok((status, response_headers, Body::from(bytes)).into_response())
}

/// Buffer a request body; over the limit is 413, a broken stream is 400
pub(crate) async fn read_body(body: Body, limit: usize) -> HostResult<Vec<u8>> {
    let mut stream = body.into_data_stream();
    let mut collected = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| HostError::BadRequest(format!("Failed to read request body: {}", e)))?;
        if collected.len() + chunk.len() > limit {
            return Err(HostError::PayloadTooLarge(limit));
        }
        collected.extend_from_slice(&chunk);
    }

    Ok(collected)
}

fn upstream_error(url: &str, error: reqwest::Error) -> HostError {
    if error.is_timeout() {
        HostError::GatewayTimeout(url.to_string())
    } else {
        HostError::BadGateway(format!("{}: {}", url, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_rule() -> ProxyTarget {
        ProxyTarget::compile(&ProxyRule {
            prefix: "/api".to_string(),
            target: "http://localhost:8000/".to_string(),
            ws: false,
            change_origin: true,
            rewrite_from: Some("^/api".to_string()),
            rewrite_to: String::new(),
        })
        .unwrap()
    }

    fn ws_rule() -> ProxyTarget {
        ProxyTarget::compile(&ProxyRule {
            prefix: "/ws".to_string(),
            target: "ws://localhost:8000".to_string(),
            ws: true,
            change_origin: true,
            rewrite_from: None,
            rewrite_to: String::new(),
        })
        .unwrap()
    }

    #[test]
    fn test_prefix_matches_on_segment_boundary() {
        let rule = api_rule();
        assert!(rule.matches("/api"));
        assert!(rule.matches("/api/robots"));
        assert!(!rule.matches("/apix"));
        assert!(!rule.matches("/map"));
    }

    #[test]
    fn test_rewrite_strips_prefix() {
        let rule = api_rule();
        assert_eq!(rule.rewrite_path("/api/robots/1"), "/robots/1");
        assert_eq!(rule.rewrite_path("/api"), "/");

        let uri: Uri = "/api/tasks?state=running".parse().unwrap();
        assert_eq!(
            rule.upstream_url(&uri),
            "http://localhost:8000/tasks?state=running"
        );
    }

    #[test]
    fn test_ws_urls_and_origin() {
        let rule = ws_rule();
        let uri: Uri = "/ws/robot-status".parse().unwrap();
        assert_eq!(rule.ws_url(&uri), "ws://localhost:8000/ws/robot-status");
        assert_eq!(rule.upstream_url(&uri), "http://localhost:8000/ws/robot-status");
        assert_eq!(rule.origin(), "http://localhost:8000");
        assert!(rule.tunnels_websockets());
    }

    #[test]
    fn test_hop_by_hop_headers_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:3000"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let forwarded = forwardable_headers(&headers);
        assert_eq!(forwarded.len(), 1);
        assert!(forwarded.contains_key(header::ACCEPT));
    }

    #[tokio::test]
    async fn test_read_body_limits_and_errors() {
        let body = read_body(Body::from("task-42"), 7).await.unwrap();
        assert_eq!(body, b"task-42");

        let over = read_body(Body::from("task-420"), 7).await;
        assert!(matches!(over, Err(HostError::PayloadTooLarge(7))));

        let chunks: Vec<Result<&'static str, std::io::Error>> = vec![
            Ok("partial"),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "client went away",
            )),
        ];
        let aborted = read_body(Body::from_stream(futures_util::stream::iter(chunks)), 1024).await;
        match aborted {
            Err(e @ HostError::BadRequest(_)) => {
                assert_eq!(e.status(), axum::http::StatusCode::BAD_REQUEST)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_bad_rewrite_rejected() {
        let rule = ProxyRule {
            prefix: "/api".to_string(),
            target: "http://localhost:8000".to_string(),
            ws: false,
            change_origin: true,
            rewrite_from: Some("(".to_string()),
            rewrite_to: String::new(),
        };
        assert!(ProxyTarget::compile(&rule).is_err());
    }
}
