//! Configuration types for the body-to-header middleware.

use serde::{Deserialize, Serialize};

/// Main configuration for the extraction engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Configuration version
    pub version: String,
    /// Instance name (shows up in logs)
    pub name: String,
    /// Rule dialect
    pub mode: Mode,
    /// Global settings
    pub settings: Settings,
    /// Mappings (evaluated in configuration order)
    pub mappings: Vec<Mapping>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            name: "body2header".to_string(),
            mode: Mode::default(),
            settings: Settings::default(),
            mappings: vec![],
        }
    }
}

/// Rule dialect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Unconditional mappings with nested path lookup.
    #[default]
    Simple,
    /// URL-gated mappings with flat top-level key lookup.
    Gated,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Simple => "simple",
            Mode::Gated => "gated",
        }
    }
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum body size to buffer (bytes)
    pub max_body_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// A single body-to-header mapping.
///
/// Simple mode reads `path`; gated mode reads `property` and the optional
/// `match` pattern. The unused fields are ignored by the compiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mapping {
    /// Nested path expression (simple mode)
    #[serde(default)]
    pub path: String,
    /// Top-level key (gated mode)
    #[serde(default)]
    pub property: String,
    /// URL regex the request must match (gated mode)
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub url_match: Option<String>,
    /// Destination header name
    #[serde(default)]
    pub header: String,
    /// Whether the mapping is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Mapping {
    fn default() -> Self {
        Self {
            path: String::new(),
            property: String::new(),
            url_match: None,
            header: String::new(),
            enabled: true,
        }
    }
}

impl Mapping {
    /// Simple-mode mapping.
    pub fn path(path: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            header: header.into(),
            ..Default::default()
        }
    }

    /// Gated-mode mapping.
    pub fn property(
        url_match: Option<&str>,
        property: impl Into<String>,
        header: impl Into<String>,
    ) -> Self {
        Self {
            property: property.into(),
            url_match: url_match.map(str::to_string),
            header: header.into(),
            ..Default::default()
        }
    }
}
