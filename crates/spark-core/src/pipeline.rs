//! Workspace facade: dispatch table, renderers, files and settings wired
//! together.
//!
//! [`Workspace::open`] follows the host's own path for showing a file:
//! resolve the extension, look up the renderer, read the text, render.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use crate::config::SparkConfig;
use crate::dispatch::{DispatchTable, DisposeHandle, RendererId, normalize_extension};
use crate::error::{SparkError, SparkResult};
use crate::fs::FileSource;
use crate::order::{SiblingEntry, sort_children};
use crate::registry::RendererRegistry;
use crate::renderer::{NativeRenderer, RenderOutput, RenderRequest, Renderer};

/// Everything a host needs to open files and sort its navigation tree.
///
/// ```
/// use std::path::Path;
/// use std::sync::Arc;
/// use spark_core::{MemoryFileSource, RenderOutput, Workspace};
///
/// let mut files = MemoryFileSource::new();
/// files.add_file("flow.svg", "<mxfile/>");
/// let workspace = Workspace::new(Arc::new(files));
///
/// let handle = workspace.enable_diagram_override();
/// assert!(matches!(
///     workspace.open(Path::new("flow.svg")).unwrap(),
///     RenderOutput::View { .. }
/// ));
///
/// handle.dispose();
/// assert_eq!(workspace.open(Path::new("flow.svg")).unwrap(), RenderOutput::Native);
/// ```
pub struct Workspace {
    table: DispatchTable,
    registry: RendererRegistry,
    files: Arc<dyn FileSource>,
    config: SparkConfig,
}

impl Workspace {
    /// Workspace with default settings and its own dispatch table.
    pub fn new(files: Arc<dyn FileSource>) -> Self {
        Self::assemble(files, SparkConfig::default())
    }

    /// Workspace with `config`, which must pass [`SparkConfig::check`].
    pub fn with_config(files: Arc<dyn FileSource>, config: SparkConfig) -> SparkResult<Self> {
        config.check()?;
        Ok(Self::assemble(files, config))
    }

    fn assemble(files: Arc<dyn FileSource>, config: SparkConfig) -> Self {
        let diagram: Arc<dyn Renderer> = Arc::new(config.diagram_renderer(NativeRenderer));
        let registry = RendererRegistry::builder()
            .with_defaults()
            .register(config.diagram().renderer_id.as_str(), diagram)
            .build();
        Self {
            table: DispatchTable::new(),
            registry,
            files,
            config,
        }
    }

    /// Use `table` instead of a private one, e.g. [`DispatchTable::global`].
    pub fn with_table(mut self, table: DispatchTable) -> Self {
        self.table = table;
        self
    }

    /// Replace the renderer registry.
    pub fn with_registry(mut self, registry: RendererRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    pub fn registry(&self) -> &RendererRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SparkConfig {
        &self.config
    }

    /// Register a renderer the host binds extensions to.
    pub fn register_renderer(&mut self, id: impl Into<RendererId>, renderer: Arc<dyn Renderer>) {
        self.registry.register(id, renderer);
    }

    /// Store edited order text; the next sort pass picks it up.
    pub fn set_order_text(&mut self, text: impl Into<String>) {
        self.config.set_order_text(text);
    }

    /// Route the configured diagram extensions to the diagram renderer.
    ///
    /// When the override is disabled in settings, nothing is installed and
    /// the returned handle does nothing.
    pub fn enable_diagram_override(&self) -> DisposeHandle {
        let diagram = self.config.diagram();
        if !diagram.enabled {
            tracing::debug!("diagram override disabled in settings");
            return DisposeHandle::noop();
        }
        self.table
            .install(&diagram.extensions, diagram.renderer_id.as_str())
    }

    /// Renderer the table currently resolves for `path`'s extension.
    pub fn resolve_renderer(&self, path: &Path) -> Option<RendererId> {
        self.table.resolve(&extension_of(path))
    }

    /// Render `path` through whatever the dispatch table resolves.
    ///
    /// Unbound extensions, and renderers that decline the extension, yield
    /// [`RenderOutput::Native`] without reading the file. Read failures from
    /// the file source are returned unchanged.
    pub fn open(&self, path: &Path) -> SparkResult<RenderOutput> {
        let extension = extension_of(path);
        let Some(id) = self.table.resolve(&extension) else {
            return Ok(RenderOutput::Native);
        };
        let renderer = self
            .registry
            .get(id.as_str())
            .ok_or_else(|| SparkError::RendererNotFound {
                renderer: id.to_string(),
            })?;
        if !renderer.accepts_extension(&extension) {
            tracing::debug!(
                renderer = %id,
                extension = %extension,
                "renderer declined extension"
            );
            return Ok(RenderOutput::Native);
        }

        let content = self.files.read_text(path)?;
        Ok(renderer.render(&RenderRequest::new(path, &content)))
    }

    /// Order a directory's children for the navigation tree.
    ///
    /// Uses the configured order text when custom order applies and the
    /// host's `native` comparator otherwise.
    pub fn sort_children<E, F>(&self, entries: &mut [E], is_root: bool, native: F)
    where
        E: SiblingEntry,
        F: FnMut(&E, &E) -> Ordering,
    {
        let order = self.config.order();
        sort_children(entries, &order.text, is_root, order.default_rank, native);
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("table", &self.table)
            .field("registry", &self.registry)
            .field("files", &self.files)
            .field("config", &self.config)
            .finish()
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(normalize_extension)
        .unwrap_or_default()
}
