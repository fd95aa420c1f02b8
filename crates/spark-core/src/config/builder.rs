use super::*;

/// Builder for constructing a [`SparkConfig`] with validation.
///
/// Setters chain through `&mut Self`, with a terminal `build()` that
/// validates and returns `Result<SparkConfig, ConfigError>`.
///
/// **Note:** `build()` and `build_unchecked()` drain the builder's state.
/// A second call produces a default config.
///
/// # Examples
///
/// ```rust
/// use spark_core::config::SparkConfig;
///
/// let config = SparkConfig::builder()
///     .order_text("Inbox:1\nArchive:9999")
///     .max_embed_depth(4)
///     .build()
///     .expect("valid config");
/// assert_eq!(config.diagram().max_embed_depth, 4);
/// assert_eq!(config.custom_order().ranking().get("Inbox"), Some(1));
/// ```
pub struct SparkConfigBuilder {
    diagram_enabled: Option<bool>,
    extensions: Option<Vec<String>>,
    renderer_id: Option<String>,
    max_embed_depth: Option<usize>,
    order_text: Option<String>,
    default_rank: Option<i64>,
}

impl SparkConfigBuilder {
    /// Prefer [`SparkConfig::builder()`] over calling this directly.
    pub(super) fn new() -> Self {
        Self {
            diagram_enabled: None,
            extensions: None,
            renderer_id: None,
            max_embed_depth: None,
            order_text: None,
            default_rank: None,
        }
    }

    /// Turn the diagram override on or off.
    pub fn diagram_enabled(&mut self, enabled: bool) -> &mut Self {
        self.diagram_enabled = Some(enabled);
        self
    }

    /// Set the extensions redirected to the diagram renderer.
    pub fn extensions<I, S>(&mut self, extensions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Set the renderer id the extensions are redirected to.
    pub fn renderer_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.renderer_id = Some(id.into());
        self
    }

    /// Set how many embedded payload layers the classifier unwraps.
    pub fn max_embed_depth(&mut self, depth: usize) -> &mut Self {
        self.max_embed_depth = Some(depth);
        self
    }

    /// Set the raw order configuration text.
    pub fn order_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.order_text = Some(text.into());
        self
    }

    /// Set the rank used for unlisted entries.
    pub fn default_rank(&mut self, rank: i64) -> &mut Self {
        self.default_rank = Some(rank);
        self
    }

    /// Build the `SparkConfig`, applying defaults for unset fields and
    /// running validation.
    ///
    /// Returns `Err(ConfigError)` if:
    /// - The renderer id is blank
    /// - An extension cannot be used as a dispatch key
    /// - `[diagram]` validation produces warnings (promoted to errors)
    pub fn build(&mut self) -> Result<SparkConfig, ConfigError> {
        let config = self.build_inner();
        config.check()?;
        Ok(config)
    }

    /// Build the `SparkConfig` without running any validation.
    pub fn build_unchecked(&mut self) -> SparkConfig {
        self.build_inner()
    }

    fn build_inner(&mut self) -> SparkConfig {
        let defaults = SparkConfig::default();
        SparkConfig {
            diagram: DiagramSettings {
                enabled: self
                    .diagram_enabled
                    .take()
                    .unwrap_or(defaults.diagram.enabled),
                extensions: self.extensions.take().unwrap_or(defaults.diagram.extensions),
                renderer_id: self
                    .renderer_id
                    .take()
                    .unwrap_or(defaults.diagram.renderer_id),
                max_embed_depth: self
                    .max_embed_depth
                    .take()
                    .unwrap_or(defaults.diagram.max_embed_depth),
            },
            order: OrderSettings {
                text: self.order_text.take().unwrap_or(defaults.order.text),
                default_rank: self
                    .default_rank
                    .take()
                    .unwrap_or(defaults.order.default_rank),
            },
        }
    }
}

impl Default for SparkConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SparkConfig {
    /// Hard checks first, then `[diagram]` validation warnings as errors.
    ///
    /// Malformed order lines never fail the check.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.diagram.renderer_id.trim().is_empty() {
            return Err(ConfigError::EmptyRendererId);
        }
        for extension in &self.diagram.extensions {
            if let Some(reason) = super::schema::extension_problem(extension) {
                return Err(ConfigError::InvalidExtension {
                    extension: extension.clone(),
                    reason: reason.to_string(),
                });
            }
        }

        let warnings = self.diagram_warnings();
        if !warnings.is_empty() {
            return Err(ConfigError::ValidationFailed(warnings));
        }
        Ok(())
    }
}
