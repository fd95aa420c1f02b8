//! Renderer registry and providers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::dispatch::RendererId;
use crate::renderer::{
    DIAGRAM_RENDERER_ID, DiagramRenderer, NATIVE_RENDERER_ID, NativeRenderer, Renderer,
};

/// A provider of renderers.
///
/// Implement this trait to contribute renderers from outside the crate (a
/// plugin, a host adapter). The built-in renderers are packaged as a
/// `BuiltinProvider` (internal to the crate).
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use spark_core::{NativeRenderer, Renderer, RendererId, RendererProvider, RendererRegistry};
///
/// struct MarkdownProvider;
///
/// impl RendererProvider for MarkdownProvider {
///     fn renderers(&self) -> Vec<(RendererId, Arc<dyn Renderer>)> {
///         let renderer: Arc<dyn Renderer> = Arc::new(NativeRenderer);
///         vec![(RendererId::from("markdown"), renderer)]
///     }
/// }
///
/// let registry = RendererRegistry::builder()
///     .with_defaults()
///     .with_provider(&MarkdownProvider)
///     .build();
/// assert!(registry.contains("markdown"));
/// ```
pub trait RendererProvider: Send + Sync {
    /// Human-readable name for this provider.
    ///
    /// Defaults to the unqualified struct name (e.g., `"BuiltinProvider"`).
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Return the renderers supplied by this provider.
    fn renderers(&self) -> Vec<(RendererId, Arc<dyn Renderer>)>;
}

/// The renderers shipping with spark-core: the pass-through renderer and a
/// diagram decorator around it.
pub(crate) struct BuiltinProvider;

impl RendererProvider for BuiltinProvider {
    fn renderers(&self) -> Vec<(RendererId, Arc<dyn Renderer>)> {
        let native: Arc<dyn Renderer> = Arc::new(NativeRenderer);
        let diagram: Arc<dyn Renderer> = Arc::new(DiagramRenderer::new(NativeRenderer));
        vec![
            (RendererId::from(NATIVE_RENDERER_ID), native),
            (RendererId::from(DIAGRAM_RENDERER_ID), diagram),
        ]
    }
}

/// Registry that maps [`RendererId`] values to renderer instances.
///
/// The dispatch table only stores identifiers; this is where an identifier
/// is turned into something that can render. Registering an id that is
/// already present replaces the earlier renderer.
pub struct RendererRegistry {
    renderers: HashMap<RendererId, Arc<dyn Renderer>>,
}

impl RendererRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in renderers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (id, renderer) in BuiltinProvider.renderers() {
            registry.register(id, renderer);
        }
        registry
    }

    /// Create a [`RendererRegistryBuilder`] for ergonomic construction.
    ///
    /// # Example
    ///
    /// ```
    /// use spark_core::RendererRegistry;
    ///
    /// let registry = RendererRegistry::builder()
    ///     .with_defaults()
    ///     .without_renderer("native")
    ///     .build();
    /// assert!(!registry.contains("native"));
    /// assert!(registry.contains("diagram"));
    /// ```
    pub fn builder() -> RendererRegistryBuilder {
        RendererRegistryBuilder::new()
    }

    /// Register `renderer` under `id`, returning the renderer it replaced.
    pub fn register(
        &mut self,
        id: impl Into<RendererId>,
        renderer: Arc<dyn Renderer>,
    ) -> Option<Arc<dyn Renderer>> {
        let id = id.into();
        tracing::trace!(renderer = %id, kind = renderer.name(), "registering renderer");
        self.renderers.insert(id, renderer)
    }

    /// Remove the renderer registered under `id`.
    pub fn remove(&mut self, id: &str) -> Option<Arc<dyn Renderer>> {
        self.renderers.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Renderer>> {
        self.renderers.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.renderers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<RendererId> {
        let mut ids: Vec<RendererId> = self.renderers.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

/// Builder for constructing a [`RendererRegistry`] with fine-grained control.
///
/// Entries are applied in the order they were added, so a later
/// [`register`](Self::register) for the same id wins over the defaults.
pub struct RendererRegistryBuilder {
    entries: Vec<(RendererId, Arc<dyn Renderer>)>,
    excluded: HashSet<RendererId>,
}

impl RendererRegistryBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            excluded: HashSet::new(),
        }
    }

    /// Add the built-in renderers (equivalent to [`RendererRegistry::with_defaults`]).
    pub fn with_defaults(&mut self) -> &mut Self {
        self.with_provider(&BuiltinProvider)
    }

    /// Add all renderers from a [`RendererProvider`].
    pub fn with_provider(&mut self, provider: &dyn RendererProvider) -> &mut Self {
        let renderers = provider.renderers();
        tracing::debug!(
            provider = provider.name(),
            count = renderers.len(),
            "adding renderer provider"
        );
        self.entries.extend(renderers);
        self
    }

    /// Register a single renderer.
    pub fn register(
        &mut self,
        id: impl Into<RendererId>,
        renderer: Arc<dyn Renderer>,
    ) -> &mut Self {
        self.entries.push((id.into(), renderer));
        self
    }

    /// Leave the renderer with this id out of the built registry.
    pub fn without_renderer(&mut self, id: &str) -> &mut Self {
        self.excluded.insert(RendererId::from(id));
        self
    }

    /// Produce a [`RendererRegistry`] from this builder.
    ///
    /// Drains the exclusion set, so a second `build()` keeps every entry.
    pub fn build(&mut self) -> RendererRegistry {
        let excluded = std::mem::take(&mut self.excluded);
        let mut registry = RendererRegistry::new();
        for (id, renderer) in &self.entries {
            if !excluded.contains(id) {
                registry.register(id.clone(), Arc::clone(renderer));
            }
        }
        registry
    }
}
