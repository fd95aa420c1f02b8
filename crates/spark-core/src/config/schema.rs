use super::*;
use crate::dispatch::normalize_extension;

/// Upper bound for `diagram.max_embed_depth` before validation warns.
pub const MAX_EMBED_DEPTH_LIMIT: usize = 64;

impl SparkConfig {
    /// Validate the configuration and return any warnings.
    ///
    /// This performs semantic validation beyond what TOML parsing can check:
    /// - Extensions must be usable as dispatch keys and not repeat
    /// - The renderer id must not be blank
    /// - The embedding depth must stay within [`MAX_EMBED_DEPTH_LIMIT`]
    /// - Order lines that the ranking parser would skip are reported
    ///
    /// Order line warnings are advisory only. [`SparkConfig::check`] ignores
    /// them, since half-edited order text is normal and sorting skips the
    /// lines it cannot use.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = self.diagram_warnings();
        warnings.extend(self.order_warnings());
        warnings
    }

    /// Warnings about the `[diagram]` section.
    pub(super) fn diagram_warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.diagram.enabled && self.diagram.extensions.is_empty() {
            warnings.push(ConfigWarning {
                field: "diagram.extensions".to_string(),
                message: "diagram override is enabled but lists no extensions".to_string(),
                suggestion: Some("Add \"svg\" or set diagram.enabled = false".to_string()),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for extension in &self.diagram.extensions {
            if let Some(reason) = extension_problem(extension) {
                warnings.push(ConfigWarning {
                    field: "diagram.extensions".to_string(),
                    message: format!("extension '{}' {}", extension, reason),
                    suggestion: Some("Use a bare extension such as \"svg\"".to_string()),
                });
                continue;
            }
            if !seen.insert(normalize_extension(extension)) {
                warnings.push(ConfigWarning {
                    field: "diagram.extensions".to_string(),
                    message: format!("extension '{}' is listed more than once", extension),
                    suggestion: None,
                });
            }
        }

        if self.diagram.renderer_id.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "diagram.renderer_id".to_string(),
                message: "renderer id is empty".to_string(),
                suggestion: Some(format!("Use \"{}\"", DIAGRAM_RENDERER_ID)),
            });
        }

        if self.diagram.max_embed_depth > MAX_EMBED_DEPTH_LIMIT {
            warnings.push(ConfigWarning {
                field: "diagram.max_embed_depth".to_string(),
                message: format!(
                    "max_embed_depth {} exceeds the limit of {}",
                    self.diagram.max_embed_depth, MAX_EMBED_DEPTH_LIMIT
                ),
                suggestion: Some(format!("Use {} or less", MAX_EMBED_DEPTH_LIMIT)),
            });
        }

        warnings
    }

    /// Lines of `order.text` that the ranking parser skips.
    fn order_warnings(&self) -> Vec<ConfigWarning> {
        self.order
            .text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty() && !is_rank_line(line))
            .map(|(index, _)| ConfigWarning {
                field: "order.text".to_string(),
                message: format!("line {} is not a 'name:rank' entry and is ignored", index + 1),
                suggestion: Some("Write entries as 'name:rank', e.g. 'Inbox:1'".to_string()),
            })
            .collect()
    }
}

/// Why `extension` cannot be a dispatch key, if it cannot.
pub(super) fn extension_problem(extension: &str) -> Option<&'static str> {
    let normalized = normalize_extension(extension);
    if normalized.is_empty() {
        return Some("is empty");
    }
    if normalized.chars().any(|c| c.is_whitespace()) {
        return Some("contains whitespace");
    }
    if normalized.contains(['/', '\\']) {
        return Some("contains a path separator");
    }
    None
}

fn is_rank_line(line: &str) -> bool {
    let Some((name, rank)) = line.split_once(':') else {
        return false;
    };
    !name.trim().is_empty() && rank.trim().parse::<i64>().is_ok()
}

/// Warning from configuration validation.
///
/// These warnings indicate likely mistakes that do not stop the settings
/// from being used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// The field path that has the issue (e.g., "diagram.extensions")
    pub field: String,
    /// Description of the issue
    pub message: String,
    /// Optional suggestion for how to fix the issue
    pub suggestion: Option<String>,
}

/// Generate a JSON Schema for the SparkConfig type.
///
/// # Example
///
/// ```rust
/// use spark_core::config::generate_schema;
///
/// let schema = generate_schema();
/// let json = serde_json::to_string_pretty(&schema).unwrap();
/// assert!(json.contains("max_embed_depth"));
/// ```
pub fn generate_schema() -> schemars::Schema {
    schemars::schema_for!(SparkConfig)
}
