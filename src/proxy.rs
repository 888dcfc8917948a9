//! Upstream forwarding for the standalone binary.
//!
//! The extraction middleware only needs a "next" handler; when running on
//! its own, that handler is [`forward`], which relays the request to a fixed
//! upstream and relays the answer back.

use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use http::{header, HeaderMap, HeaderName, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Headers that describe a single connection and must not be relayed.
static HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    header::HOST,
    header::CONTENT_LENGTH,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Target the binary forwards requests to.
#[derive(Debug, Clone)]
pub struct Upstream {
    client: reqwest::Client,
    base: String,
}

impl Upstream {
    /// Create an upstream from a base URL such as `http://127.0.0.1:9000/api`.
    pub fn new(base: &str) -> Result<Self, ProxyError> {
        reqwest::Url::parse(base).map_err(|e| ProxyError::InvalidUpstream {
            url: base.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Upstream URL for an incoming request target.
    pub fn url_for(&self, uri: &http::Uri) -> String {
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        format!("{}{}", self.base, path_and_query)
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// Fallback handler relaying every request to the [`Upstream`].
pub async fn forward(
    State(upstream): State<Arc<Upstream>>,
    req: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = req.into_parts();
    let url = upstream.url_for(&parts.uri);

    let body = body.collect().await.map_err(ProxyError::Body)?.to_bytes();

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);

    debug!(method = %parts.method, url = %url, "Forwarding request upstream");

    let response = upstream
        .client
        .request(parts.method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            warn!(url = %url, error = %e, "Upstream request failed");
            ProxyError::Upstream(e)
        })?;

    let status = response.status();
    let mut headers = response.headers().clone();
    strip_hop_by_hop(&mut headers);
    let body = response.bytes().await.map_err(ProxyError::Upstream)?;

    Ok((status, headers, body).into_response())
}

/// Forwarding errors.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Invalid upstream URL {url:?}: {reason}")]
    InvalidUpstream { url: String, reason: String },

    #[error("Failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidUpstream { .. } | Self::Body(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
