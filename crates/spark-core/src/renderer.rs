//! Renderers and the diagram decorator.
//!
//! A [`Renderer`] turns file text into what the host shows. Instead of
//! patching the host's renderer for an extension, [`DiagramRenderer`] wraps
//! it: diagram files are rendered as an embed of themselves, everything else
//! is passed through to the wrapped renderer untouched.

use std::path::Path;

use crate::classify::DiagramClassifier;
use crate::dispatch::{RendererId, normalize_extension};

/// Renderer id under which the diagram decorator is registered.
pub const DIAGRAM_RENDERER_ID: &str = "diagram";

/// Renderer id of the pass-through renderer.
pub const NATIVE_RENDERER_ID: &str = "native";

/// Extensions routed to the diagram renderer by default.
pub const DIAGRAM_EXTENSIONS: &[&str] = &["svg"];

/// A file to render, with its text already read by the caller.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub path: &'a Path,
    pub content: &'a str,
}

impl<'a> RenderRequest<'a> {
    pub fn new(path: &'a Path, content: &'a str) -> Self {
        Self { path, content }
    }

    /// Normalized extension of `path`, empty when it has none.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(normalize_extension)
            .unwrap_or_default()
    }
}

/// What a renderer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutput {
    /// View text to display, tagged with the renderer that produced it.
    View { renderer: RendererId, data: String },
    /// Let the host handle the file with its built-in behavior.
    Native,
}

/// Produces a [`RenderOutput`] for a file.
pub trait Renderer: Send + Sync {
    fn render(&self, request: &RenderRequest<'_>) -> RenderOutput;

    /// Whether this renderer wants files with `extension`. Accepts everything
    /// by default.
    fn accepts_extension(&self, _extension: &str) -> bool {
        true
    }

    /// Defaults to the unqualified type name.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// Hands every file back to the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRenderer;

impl Renderer for NativeRenderer {
    fn render(&self, _request: &RenderRequest<'_>) -> RenderOutput {
        RenderOutput::Native
    }

    fn name(&self) -> &str {
        "NativeRenderer"
    }
}

/// Adapts a closure into a [`Renderer`].
pub struct FnRenderer<F> {
    render: F,
}

impl<F> FnRenderer<F>
where
    F: Fn(&RenderRequest<'_>) -> RenderOutput + Send + Sync,
{
    pub fn new(render: F) -> Self {
        Self { render }
    }
}

impl<F> Renderer for FnRenderer<F>
where
    F: Fn(&RenderRequest<'_>) -> RenderOutput + Send + Sync,
{
    fn render(&self, request: &RenderRequest<'_>) -> RenderOutput {
        (self.render)(request)
    }

    fn name(&self) -> &str {
        "FnRenderer"
    }
}

/// Decorator that renders diagram files as embeds and defers everything
/// else to the renderer it wraps.
///
/// ```
/// use std::path::Path;
/// use spark_core::{DiagramRenderer, NativeRenderer, RenderOutput, RenderRequest, Renderer};
///
/// let renderer = DiagramRenderer::new(NativeRenderer);
///
/// let diagram = RenderRequest::new(Path::new("flows/login.svg"), "<mxfile/>");
/// assert_eq!(
///     renderer.render(&diagram),
///     RenderOutput::View {
///         renderer: "diagram".into(),
///         data: "![[flows/login.svg]]".to_string(),
///     }
/// );
///
/// let icon = RenderRequest::new(Path::new("icons/star.svg"), "<svg/>");
/// assert_eq!(renderer.render(&icon), RenderOutput::Native);
/// ```
pub struct DiagramRenderer<R> {
    inner: R,
    classifier: DiagramClassifier,
    extensions: Vec<String>,
    id: RendererId,
}

impl<R: Renderer> DiagramRenderer<R> {
    /// Wrap `inner` with the default classifier and extensions.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            classifier: DiagramClassifier::new(),
            extensions: DIAGRAM_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            id: RendererId::from(DIAGRAM_RENDERER_ID),
        }
    }

    pub fn with_classifier(mut self, classifier: DiagramClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the accepted extensions (normalized on the way in).
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .collect();
        self
    }

    /// Renderer id reported in produced views.
    pub fn with_id(mut self, id: impl Into<RendererId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

impl<R: Renderer> Renderer for DiagramRenderer<R> {
    fn render(&self, request: &RenderRequest<'_>) -> RenderOutput {
        if self.classifier.classify(request.content) {
            return RenderOutput::View {
                renderer: self.id.clone(),
                data: embed_markup(request.path),
            };
        }
        tracing::debug!(
            path = %request.path.display(),
            fallback = self.inner.name(),
            "not a diagram, deferring to wrapped renderer"
        );
        self.inner.render(request)
    }

    fn accepts_extension(&self, extension: &str) -> bool {
        let extension = normalize_extension(extension);
        self.extensions.iter().any(|ext| *ext == extension)
    }

    fn name(&self) -> &str {
        "DiagramRenderer"
    }
}

/// Markdown that embeds the file at `path`, with `/` separators.
pub fn embed_markup(path: &Path) -> String {
    format!("![[{}]]", path.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_view(request: &RenderRequest<'_>) -> RenderOutput {
        RenderOutput::View {
            renderer: RendererId::from("source"),
            data: request.content.to_string(),
        }
    }

    #[test]
    fn test_request_extension_is_normalized() {
        assert_eq!(RenderRequest::new(Path::new("a/B.SVG"), "").extension(), "svg");
        assert_eq!(RenderRequest::new(Path::new("Makefile"), "").extension(), "");
    }

    #[test]
    fn test_native_renderer() {
        let request = RenderRequest::new(Path::new("x.svg"), "<svg/>");
        assert_eq!(NativeRenderer.render(&request), RenderOutput::Native);
        assert_eq!(NativeRenderer.name(), "NativeRenderer");
    }

    #[test]
    fn test_diagram_is_embedded() {
        let renderer = DiagramRenderer::new(NativeRenderer);
        let request = RenderRequest::new(Path::new("vault/arch.svg"), "<mxfile></mxfile>");
        assert_eq!(
            renderer.render(&request),
            RenderOutput::View {
                renderer: RendererId::from(DIAGRAM_RENDERER_ID),
                data: "![[vault/arch.svg]]".to_string(),
            }
        );
    }

    #[test]
    fn test_non_diagram_defers_to_inner() {
        let renderer = DiagramRenderer::new(FnRenderer::new(source_view));
        let request = RenderRequest::new(Path::new("logo.svg"), "<svg><circle/></svg>");
        assert_eq!(
            renderer.render(&request),
            RenderOutput::View {
                renderer: RendererId::from("source"),
                data: "<svg><circle/></svg>".to_string(),
            }
        );
    }

    #[test]
    fn test_malformed_content_defers_to_inner() {
        let renderer = DiagramRenderer::new(NativeRenderer);
        let request = RenderRequest::new(Path::new("broken.svg"), "<svg");
        assert_eq!(renderer.render(&request), RenderOutput::Native);
    }

    #[test]
    fn test_accepts_configured_extensions() {
        let renderer = DiagramRenderer::new(NativeRenderer);
        assert!(renderer.accepts_extension("svg"));
        assert!(renderer.accepts_extension(".SVG"));
        assert!(!renderer.accepts_extension("png"));

        let renderer = renderer.with_extensions(["Drawio", "xml"]);
        assert_eq!(renderer.extensions(), ["drawio", "xml"]);
        assert!(renderer.accepts_extension("drawio"));
        assert!(!renderer.accepts_extension("svg"));
    }

    #[test]
    fn test_custom_id_and_classifier() {
        let renderer = DiagramRenderer::new(NativeRenderer)
            .with_id("drawio")
            .with_classifier(DiagramClassifier::with_max_depth(0));
        let embedded = r#"<svg content="&lt;mxfile/&gt;"/>"#;
        let request = RenderRequest::new(Path::new("a.svg"), embedded);
        assert_eq!(renderer.render(&request), RenderOutput::Native);

        let request = RenderRequest::new(Path::new("a.svg"), "<mxfile/>");
        assert!(matches!(
            renderer.render(&request),
            RenderOutput::View { renderer, .. } if renderer == "drawio"
        ));
    }

    #[test]
    fn test_embed_markup_uses_forward_slashes() {
        assert_eq!(embed_markup(Path::new("a/b.svg")), "![[a/b.svg]]");
        assert_eq!(embed_markup(Path::new(r"a\b.svg")), "![[a/b.svg]]");
    }

    #[test]
    fn test_default_name_is_type_name() {
        struct Plain;
        impl Renderer for Plain {
            fn render(&self, _request: &RenderRequest<'_>) -> RenderOutput {
                RenderOutput::Native
            }
        }
        assert_eq!(Plain.name(), "Plain");
    }
}
