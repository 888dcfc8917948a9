//! Rule compilation.
//!
//! Mappings are validated and compiled once, when the engine is built. The
//! resulting [`RuleSet`] is immutable and shared across requests.

use crate::config::{Mapping, Mode};
use crate::matcher::{MatcherError, UrlMatcher};
use crate::resolver::{JsonPath, KeySpec};
use http::HeaderName;
use std::sync::Arc;
use tracing::{debug, warn};

/// A validated, ready-to-evaluate mapping.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// URL gate (always [`UrlMatcher::Any`] in simple mode)
    pub url: UrlMatcher,
    /// Where to find the value
    pub key: KeySpec,
    /// Destination header
    pub header: HeaderName,
}

impl CompiledRule {
    /// Whether this rule applies to a request for `url`.
    pub fn applies_to(&self, url: &str) -> bool {
        self.url.matches(url)
    }
}

/// Ordered, immutable set of compiled rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    mode: Mode,
    rules: Arc<[CompiledRule]>,
}

impl RuleSet {
    /// Compile `mappings` for `mode`, preserving their order.
    ///
    /// In gated mode any invalid mapping fails the whole set.
    pub fn compile(mode: Mode, mappings: &[Mapping]) -> Result<Self, RuleError> {
        let mut rules = Vec::with_capacity(mappings.len());

        for (index, mapping) in mappings.iter().enumerate() {
            if !mapping.enabled {
                debug!(index, header = %mapping.header, "Skipping disabled mapping");
                continue;
            }

            let rule = match mode {
                Mode::Simple => match compile_simple(index, mapping) {
                    Some(rule) => rule,
                    None => continue,
                },
                Mode::Gated => compile_gated(index, mapping)?,
            };

            rules.push(rule);
        }

        Ok(Self {
            mode,
            rules: rules.into(),
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Simple mode takes mappings as-is: one that cannot produce a header is
/// dropped with a warning instead of failing the set.
fn compile_simple(index: usize, mapping: &Mapping) -> Option<CompiledRule> {
    if mapping.header.is_empty() {
        warn!(index, path = %mapping.path, "Mapping has no header, ignoring it");
        return None;
    }

    let Ok(header) = HeaderName::from_bytes(mapping.header.as_bytes()) else {
        warn!(
            index,
            header = %mapping.header,
            "Mapping header is not a valid header name, ignoring it"
        );
        return None;
    };

    Some(CompiledRule {
        url: UrlMatcher::Any,
        key: KeySpec::Path(JsonPath::parse(&mapping.path)),
        header,
    })
}

fn compile_gated(index: usize, mapping: &Mapping) -> Result<CompiledRule, RuleError> {
    if mapping.property.is_empty() {
        return Err(RuleError::EmptyProperty { index });
    }
    if mapping.header.is_empty() {
        return Err(RuleError::EmptyHeader { index });
    }

    let url = UrlMatcher::compile(mapping.url_match.as_deref())
        .map_err(|source| RuleError::InvalidMatch { index, source })?;

    Ok(CompiledRule {
        url,
        key: KeySpec::Property(mapping.property.clone()),
        header: parse_header(index, &mapping.header)?,
    })
}

fn parse_header(index: usize, name: &str) -> Result<HeaderName, RuleError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| RuleError::InvalidHeaderName {
        index,
        name: name.to_string(),
    })
}

/// Errors raised while compiling mappings.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("mapping {index}: property must not be empty")]
    EmptyProperty { index: usize },

    #[error("mapping {index}: header must not be empty")]
    EmptyHeader { index: usize },

    #[error("mapping {index}: {source}")]
    InvalidMatch {
        index: usize,
        #[source]
        source: MatcherError,
    },

    #[error("mapping {index}: invalid header name {name:?}")]
    InvalidHeaderName { index: usize, name: String },
}
