//! JSON body to request header middleware.
//!
//! Reads an incoming request's JSON body, extracts values according to
//! configured mappings and sets them as request headers before the request
//! reaches the next handler. The body itself is passed on unchanged.
//!
//! Two rule dialects share one engine:
//!
//! - **simple**: every mapping applies, values are found by nested path
//!   (`user.id`, `items[0].sku`)
//! - **gated**: a mapping applies only when the request URL matches its
//!   optional regex, values are top-level keys
//!
//! ## Configuration Example
//!
//! ```yaml
//! mode: simple
//! mappings:
//!   - path: "user.id"
//!     header: "X-User-Id"
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let engine = Arc::new(ExtractionEngine::from_yaml(yaml)?);
//! let app = engine.wrap(Router::new().route("/orders", post(create_order)));
//! ```

pub mod config;
pub mod engine;
pub mod matcher;
pub mod proxy;
pub mod resolver;
pub mod rule;
pub mod serializer;

pub use config::{ExtractConfig, Mapping, Mode};
pub use engine::{extract_headers, EngineError, ExtractError, ExtractionEngine};
pub use rule::{CompiledRule, RuleError, RuleSet};
