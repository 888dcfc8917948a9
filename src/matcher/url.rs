//! URL gate for gated-mode mappings.

use super::MatcherError;
use regex::Regex;

/// Compiled URL matcher.
#[derive(Debug, Clone)]
pub enum UrlMatcher {
    /// Matches every request
    Any,
    /// Regex pattern match (unanchored, like `Regex::is_match`)
    Regex(Regex),
}

impl UrlMatcher {
    /// Compile an optional pattern. `None` and `""` both compile to [`UrlMatcher::Any`].
    pub fn compile(pattern: Option<&str>) -> Result<Self, MatcherError> {
        match pattern {
            None | Some("") => Ok(Self::Any),
            Some(pattern) => Ok(Self::Regex(Regex::new(pattern)?)),
        }
    }

    /// Check whether `url` passes the gate.
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Regex(regex) => regex.is_match(url),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// The source pattern, if any.
    pub fn pattern(&self) -> Option<&str> {
        match self {
            Self::Any => None,
            Self::Regex(regex) => Some(regex.as_str()),
        }
    }
}
