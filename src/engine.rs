//! Extraction engine and its axum middleware.

use crate::config::{ExtractConfig, Mode, Settings};
use crate::resolver;
use crate::rule::{RuleError, RuleSet};
use crate::serializer::{self, SerializeError};
use axum::body::Body;
use axum::extract::{OriginalUri, Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, StatusCode, Uri};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, info, trace, warn, Instrument};

/// Copies values out of JSON request bodies into request headers.
///
/// The engine is immutable once built and can be shared across any number of
/// concurrent requests.
#[derive(Debug)]
pub struct ExtractionEngine {
    /// Instance name
    name: String,
    /// Global settings
    settings: Settings,
    /// Compiled rules
    rules: RuleSet,
}

impl ExtractionEngine {
    /// Create a new engine from configuration.
    pub fn new(config: ExtractConfig) -> Result<Self, RuleError> {
        let rules = RuleSet::compile(config.mode, &config.mappings)?;

        info!(
            instance = %config.name,
            mode = config.mode.as_str(),
            rules = rules.len(),
            max_body_size = config.settings.max_body_size,
            "Extraction engine initialized"
        );

        Ok(Self {
            name: config.name,
            settings: config.settings,
            rules,
        })
    }

    /// Create from a YAML configuration string.
    pub fn from_yaml(yaml: &str) -> Result<Self, EngineError> {
        let config: ExtractConfig = serde_yaml::from_str(yaml)?;
        Self::new(config).map_err(EngineError::from)
    }

    /// Create from a JSON configuration string.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: ExtractConfig = serde_json::from_str(json)?;
        Self::new(config).map_err(EngineError::from)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> Mode {
        self.rules.mode()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Wrap `router` so every request passes through this engine first.
    pub fn wrap<S>(self: Arc<Self>, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(self, extract_headers))
    }

    /// Run the engine over one request.
    ///
    /// On success the returned request carries the extracted headers and a
    /// fresh body with the original bytes. On error the request is consumed
    /// and must not be forwarded.
    pub async fn process(&self, req: Request) -> Result<Request, ExtractError> {
        let (mut parts, body) = req.into_parts();

        let bytes = read_body(body, self.settings.max_body_size).await?;

        if let Some(document) = self.parse(&bytes)? {
            // Nested routers strip their prefix; gate on the URL the client sent
            let uri = match parts.extensions.get::<OriginalUri>() {
                Some(OriginalUri(original)) => original,
                None => &parts.uri,
            };
            let applied = self.apply_rules(uri, &mut parts.headers, &document)?;
            debug!(applied, body_size = bytes.len(), "Applied body mappings");
        } else {
            trace!("Empty body, no mappings applied");
        }

        Ok(Request::from_parts(parts, Body::from(bytes)))
    }

    /// Decode the buffered body. An empty body yields no document.
    pub fn parse(&self, bytes: &[u8]) -> Result<Option<JsonValue>, ExtractError> {
        if bytes.is_empty() {
            return Ok(None);
        }

        serde_json::from_slice(bytes)
            .map(Some)
            .map_err(|source| ExtractError::MalformedBody {
                status: malformed_body_status(self.mode()),
                source,
            })
    }

    /// Evaluate every rule against `document`, in order, and set the headers
    /// that resolve. Returns the number of headers set.
    pub fn apply_rules(
        &self,
        uri: &Uri,
        headers: &mut HeaderMap,
        document: &JsonValue,
    ) -> Result<usize, ExtractError> {
        let url = uri.to_string();
        let mut applied = 0;

        for rule in self.rules.rules() {
            if !rule.applies_to(&url) {
                trace!(url = %url, header = %rule.header, "URL not matched, skipping rule");
                continue;
            }

            let Some(value) = resolver::resolve(document, &rule.key) else {
                trace!(key = %rule.key, header = %rule.header, "No value found");
                continue;
            };

            let header_value =
                serializer::to_header_value(value).map_err(|source| ExtractError::Serialization {
                    header: rule.header.clone(),
                    source,
                })?;

            debug!(key = %rule.key, header = %rule.header, "Setting header from body");
            headers.insert(rule.header.clone(), header_value);
            applied += 1;
        }

        Ok(applied)
    }
}

/// Status returned for a body that is not valid JSON.
fn malformed_body_status(mode: Mode) -> StatusCode {
    match mode {
        Mode::Simple => StatusCode::BAD_REQUEST,
        Mode::Gated => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Read the whole body, at most `limit` bytes.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, ExtractError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.is::<LengthLimitError>() => Err(ExtractError::BodyTooLarge { limit }),
        Err(err) => Err(ExtractError::BodyRead(axum::Error::new(err))),
    }
}

/// Axum middleware running an [`ExtractionEngine`] before the next handler.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/", post(handler))
///     .layer(axum::middleware::from_fn_with_state(engine, extract_headers));
/// ```
pub async fn extract_headers(
    State(engine): State<Arc<ExtractionEngine>>,
    req: Request,
    next: Next,
) -> Result<Response, ExtractError> {
    let span = tracing::debug_span!(
        "body2header",
        instance = %engine.name,
        method = %req.method(),
        uri = %req.uri()
    );

    let req = match engine.process(req).instrument(span).await {
        Ok(req) => req,
        Err(e) => {
            warn!(instance = %engine.name, status = %e.status(), error = %e, "Rejecting request");
            return Err(e);
        }
    };

    Ok(next.run(req).await)
}

/// Per-request errors.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),

    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Invalid JSON: {source}")]
    MalformedBody {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    #[error("Header {header}: {source}")]
    Serialization {
        header: HeaderName,
        #[source]
        source: SerializeError,
    },
}

impl ExtractError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BodyRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MalformedBody { status, .. } => *status,
            Self::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ExtractError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Engine construction errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),
}
