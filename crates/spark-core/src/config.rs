//! Settings for the diagram override and custom ordering.
//!
//! Settings live in a TOML file:
//!
//! ```toml
//! [diagram]
//! enabled = true
//! extensions = ["svg"]
//! renderer_id = "diagram"
//! max_embed_depth = 8
//!
//! [order]
//! default_rank = 1000
//! text = """
//! Inbox:1
//! Archive:9999
//! """
//! ```

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classify::{DEFAULT_MAX_EMBED_DEPTH, DiagramClassifier};
use crate::fs::{FileSource, RealFileSource};
use crate::order::{CustomOrder, DEFAULT_RANK, Ranking};
use crate::renderer::{DIAGRAM_EXTENSIONS, DIAGRAM_RENDERER_ID, DiagramRenderer, Renderer};

mod builder;
mod schema;


pub use builder::SparkConfigBuilder;
pub use schema::{ConfigWarning, MAX_EMBED_DEPTH_LIMIT, generate_schema};

/// Errors that can occur when building a `SparkConfig`.
///
/// These are hard errors that mean the configuration cannot be used as-is.
/// For soft issues, see [`ConfigWarning`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The diagram renderer id is empty or whitespace.
    EmptyRendererId,
    /// An extension in `diagram.extensions` cannot be used as a dispatch key.
    InvalidExtension {
        /// The extension as written in the configuration.
        extension: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Validation produced warnings that were promoted to errors.
    ValidationFailed(Vec<ConfigWarning>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyRendererId => write!(f, "diagram renderer id is empty"),
            ConfigError::InvalidExtension { extension, reason } => {
                write!(f, "invalid extension '{}': {}", extension, reason)
            }
            ConfigError::ValidationFailed(warnings) => {
                write!(
                    f,
                    "configuration validation failed with {} warning(s)",
                    warnings.len()
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// `[diagram]` section: the extension override and the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DiagramSettings {
    #[schemars(description = "Route diagram extensions to the diagram renderer")]
    pub enabled: bool,

    #[schemars(description = "Extensions redirected to the diagram renderer (without the dot)")]
    pub extensions: Vec<String>,

    #[schemars(description = "Renderer id the extensions are redirected to")]
    pub renderer_id: String,

    /// Number of `<svg content="...">` layers the classifier unwraps.
    #[schemars(description = "How many embedded svg payload layers the classifier unwraps")]
    pub max_embed_depth: usize,
}

impl Default for DiagramSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            extensions: DIAGRAM_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            renderer_id: DIAGRAM_RENDERER_ID.to_string(),
            max_embed_depth: DEFAULT_MAX_EMBED_DEPTH,
        }
    }
}

/// `[order]` section: the custom sibling order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OrderSettings {
    /// Raw `name:rank` lines, kept verbatim.
    #[schemars(description = "One 'name:rank' entry per line; lower ranks sort first")]
    pub text: String,

    #[schemars(description = "Rank of entries not listed in 'text'")]
    pub default_rank: i64,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            text: String::new(),
            default_rank: DEFAULT_RANK,
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SparkConfig {
    #[schemars(description = "Diagram override and classifier settings")]
    diagram: DiagramSettings,

    #[schemars(description = "Custom ordering of navigation tree siblings")]
    order: OrderSettings,
}

impl SparkConfig {
    /// Create a new [`SparkConfigBuilder`].
    pub fn builder() -> SparkConfigBuilder {
        SparkConfigBuilder::new()
    }

    /// Load config from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = RealFileSource.read_text(path.as_ref())?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config or use default, returning any load warning.
    ///
    /// A missing path yields the default config silently. A path that cannot
    /// be read or parsed yields the default config plus a warning describing
    /// the failure, so a typo never silently turns the settings off.
    pub fn load_or_default(path: Option<&Path>) -> (Self, Option<String>) {
        match path {
            Some(p) => match Self::load(p) {
                Ok(config) => (config, None),
                Err(e) => {
                    let warning = format!(
                        "Failed to load config from {}: {}. Using defaults.",
                        p.display(),
                        e
                    );
                    tracing::warn!(path = %p.display(), error = %e, "config load failed");
                    (Self::default(), Some(warning))
                }
            },
            None => (Self::default(), None),
        }
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    #[inline]
    pub fn diagram(&self) -> &DiagramSettings {
        &self.diagram
    }

    #[inline]
    pub fn order(&self) -> &OrderSettings {
        &self.order
    }

    #[inline]
    pub fn order_text(&self) -> &str {
        &self.order.text
    }

    /// Replace the order text, as when the user edits the setting.
    pub fn set_order_text(&mut self, text: impl Into<String>) {
        self.order.text = text.into();
    }

    pub fn set_diagram_enabled(&mut self, enabled: bool) {
        self.diagram.enabled = enabled;
    }

    /// Classifier with the configured unwrapping depth.
    pub fn classifier(&self) -> DiagramClassifier {
        DiagramClassifier::with_max_depth(self.diagram.max_embed_depth)
    }

    /// Wrap `inner` in a diagram decorator using these settings.
    pub fn diagram_renderer<R: Renderer>(&self, inner: R) -> DiagramRenderer<R> {
        DiagramRenderer::new(inner)
            .with_classifier(self.classifier())
            .with_extensions(&self.diagram.extensions)
            .with_id(self.diagram.renderer_id.as_str())
    }

    /// Comparator built from the current order text.
    pub fn custom_order(&self) -> CustomOrder {
        CustomOrder::new(Ranking::parse(&self.order.text), self.order.default_rank)
    }
}
