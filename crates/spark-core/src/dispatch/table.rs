//! The extension → renderer dispatch table.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;

use super::types::{ChangeKind, DispatchChange, ListenerId, RendererId, normalize_extension};

type Listener = Arc<dyn Fn(&DispatchChange) + Send + Sync>;

static GLOBAL_TABLE: OnceLock<DispatchTable> = OnceLock::new();

/// Identifies the layers pushed by one `install` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LayerId(u64);

#[derive(Debug)]
struct Layer {
    id: LayerId,
    renderer: RendererId,
}

/// Bindings for a single extension.
///
/// `base` is the host's own binding. Override layers stack on top of it; the
/// top-most layer wins.
#[derive(Debug, Default)]
struct Slot {
    base: Option<RendererId>,
    layers: Vec<Layer>,
}

impl Slot {
    fn resolved(&self) -> Option<&RendererId> {
        self.layers
            .last()
            .map(|layer| &layer.renderer)
            .or(self.base.as_ref())
    }

    fn is_vacant(&self) -> bool {
        self.base.is_none() && self.layers.is_empty()
    }
}

#[derive(Default)]
struct TableState {
    slots: HashMap<String, Slot>,
    listeners: Vec<(ListenerId, Listener)>,
    next_layer: u64,
    next_listener: u64,
}

impl TableState {
    fn listeners(&self) -> Vec<Listener> {
        self.listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

/// Maps file extensions to renderer identifiers, with reversible overrides.
///
/// The host registers its own renderers with [`bind`](Self::bind). Plugins
/// redirect extensions with [`install`](Self::install), which returns a
/// [`DisposeHandle`] that undoes exactly that installation.
///
/// # Stacking
///
/// Each extension keeps a stack of override layers above the host binding.
/// Installing pushes a layer; disposing removes that call's layer wherever it
/// sits. Disposing in reverse install order therefore restores every
/// intermediate binding, and once every override of an extension is gone it
/// resolves to the host binding again. A layer disposed out of order leaves
/// the visible binding alone until the layers above it are gone too.
///
/// # Notifications
///
/// Listeners registered with [`subscribe`](Self::subscribe) hear about every
/// change of a resolved binding. They run after the internal lock is
/// released, so a listener may install or dispose overrides itself.
///
/// ```
/// use spark_core::DispatchTable;
///
/// let table = DispatchTable::new();
/// table.bind("svg", "image");
///
/// let handle = table.install(["svg"], "diagram");
/// assert_eq!(table.resolve("SVG").unwrap(), "diagram");
///
/// handle.dispose();
/// assert_eq!(table.resolve("svg").unwrap(), "image");
/// ```
#[derive(Clone, Default)]
pub struct DispatchTable {
    state: Arc<Mutex<TableState>>,
}

impl DispatchTable {
    /// Create an empty, standalone table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table shared by host and plugins.
    pub fn global() -> &'static DispatchTable {
        GLOBAL_TABLE.get_or_init(DispatchTable::new)
    }

    /// Renderer currently handling `extension`, case-insensitively.
    pub fn resolve(&self, extension: &str) -> Option<RendererId> {
        let key = normalize_extension(extension);
        self.state
            .lock()
            .slots
            .get(&key)
            .and_then(Slot::resolved)
            .cloned()
    }

    /// Whether any renderer handles `extension`.
    pub fn is_registered(&self, extension: &str) -> bool {
        self.resolve(extension).is_some()
    }

    /// Whether at least one override layer sits on `extension`.
    pub fn is_overridden(&self, extension: &str) -> bool {
        self.override_depth(extension) > 0
    }

    /// Number of override layers stacked on `extension`.
    pub fn override_depth(&self, extension: &str) -> usize {
        let key = normalize_extension(extension);
        self.state
            .lock()
            .slots
            .get(&key)
            .map_or(0, |slot| slot.layers.len())
    }

    /// Sorted snapshot of every extension that currently resolves.
    pub fn extensions(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut extensions: Vec<String> = state
            .slots
            .iter()
            .filter(|(_, slot)| slot.resolved().is_some())
            .map(|(extension, _)| extension.clone())
            .collect();
        extensions.sort();
        extensions
    }

    /// Set the host's own binding for `extension`.
    ///
    /// Override layers keep shadowing it; it becomes visible once they are
    /// disposed.
    pub fn bind(&self, extension: &str, renderer: impl Into<RendererId>) {
        let key = normalize_extension(extension);
        let renderer = renderer.into();
        let (change, listeners) = {
            let mut state = self.state.lock();
            let slot = state.slots.entry(key.clone()).or_default();
            let previous = slot.resolved().cloned();
            slot.base = Some(renderer);
            let change = changed(key, previous, slot.resolved().cloned(), ChangeKind::Bound);
            (change, state.listeners())
        };
        notify(&listeners, change.as_slice());
    }

    /// Remove the host's own binding for `extension`.
    pub fn unbind(&self, extension: &str) {
        let key = normalize_extension(extension);
        let (change, listeners) = {
            let mut state = self.state.lock();
            let Some(slot) = state.slots.get_mut(&key) else {
                return;
            };
            let previous = slot.resolved().cloned();
            slot.base = None;
            let current = slot.resolved().cloned();
            if slot.is_vacant() {
                state.slots.remove(&key);
            }
            let change = changed(key, previous, current, ChangeKind::Unbound);
            (change, state.listeners())
        };
        notify(&listeners, change.as_slice());
    }

    /// Redirect every extension in `extensions` to `renderer`.
    ///
    /// Extensions are normalized and deduplicated. An empty set installs
    /// nothing and returns a handle whose disposal does nothing.
    #[must_use = "dropping the handle immediately restores the previous bindings"]
    pub fn install<I, S>(&self, extensions: I, renderer: impl Into<RendererId>) -> DisposeHandle
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: BTreeSet<String> = extensions
            .into_iter()
            .map(|extension| normalize_extension(extension.as_ref()))
            .collect();
        if keys.is_empty() {
            return DisposeHandle::noop();
        }
        let renderer = renderer.into();

        let (layer, changes, listeners) = {
            let mut state = self.state.lock();
            let layer = LayerId(state.next_layer);
            state.next_layer += 1;

            let mut changes = Vec::new();
            for key in &keys {
                let slot = state.slots.entry(key.clone()).or_default();
                let previous = slot.resolved().cloned();
                slot.layers.push(Layer {
                    id: layer,
                    renderer: renderer.clone(),
                });
                changes.extend(changed(
                    key.clone(),
                    previous,
                    Some(renderer.clone()),
                    ChangeKind::Installed,
                ));
            }
            (layer, changes, state.listeners())
        };

        tracing::debug!(
            renderer = %renderer,
            extensions = ?keys,
            layer = layer.0,
            "installed renderer override"
        );
        notify(&listeners, &changes);

        DisposeHandle {
            state: Arc::downgrade(&self.state),
            layer: Some(layer),
            extensions: keys.into_iter().collect(),
        }
    }

    /// Register a listener for binding changes.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&DispatchChange) + Send + Sync + 'static,
    {
        let mut state = self.state.lock();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut state = self.state.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(existing, _)| *existing != id);
        state.listeners.len() != before
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DispatchTable")
            .field("slots", &state.slots)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

/// Undoes one [`DispatchTable::install`] call.
///
/// Disposal is idempotent and also happens on drop. If the table itself is
/// gone, disposal does nothing.
#[must_use = "dropping the handle immediately restores the previous bindings"]
pub struct DisposeHandle {
    state: Weak<Mutex<TableState>>,
    layer: Option<LayerId>,
    extensions: Vec<String>,
}

impl DisposeHandle {
    /// A handle that owns nothing.
    pub fn noop() -> Self {
        Self {
            state: Weak::new(),
            layer: None,
            extensions: Vec::new(),
        }
    }

    /// Extensions this handle overrides, normalized and sorted.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_disposed(&self) -> bool {
        self.layer.is_none()
    }

    /// Restore the bindings this handle changed. Consumes the handle.
    pub fn dispose(mut self) {
        self.release();
    }

    /// Restore the bindings in place; later calls do nothing.
    pub fn release(&mut self) {
        let Some(layer) = self.layer.take() else {
            return;
        };
        let Some(state) = self.state.upgrade() else {
            return;
        };

        let (changes, listeners) = {
            let mut state = state.lock();
            let mut changes = Vec::new();
            for key in &self.extensions {
                let Some(slot) = state.slots.get_mut(key) else {
                    continue;
                };
                let previous = slot.resolved().cloned();
                slot.layers.retain(|existing| existing.id != layer);
                let current = slot.resolved().cloned();
                if slot.is_vacant() {
                    state.slots.remove(key);
                }
                changes.extend(changed(key.clone(), previous, current, ChangeKind::Restored));
            }
            (changes, state.listeners())
        };

        tracing::debug!(
            extensions = ?self.extensions,
            layer = layer.0,
            "restored renderer bindings"
        );
        notify(&listeners, &changes);
    }
}

impl Drop for DisposeHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for DisposeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposeHandle")
            .field("extensions", &self.extensions)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A change record, only when the resolved binding actually moved.
fn changed(
    extension: String,
    previous: Option<RendererId>,
    current: Option<RendererId>,
    kind: ChangeKind,
) -> Option<DispatchChange> {
    (previous != current).then(|| DispatchChange {
        extension,
        previous,
        current,
        kind,
    })
}

fn notify(listeners: &[Listener], changes: &[DispatchChange]) {
    for change in changes {
        for listener in listeners {
            listener(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(table: &DispatchTable) -> Arc<Mutex<Vec<DispatchChange>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        table.subscribe(move |change| sink.lock().push(change.clone()));
        seen
    }

    #[test]
    fn test_resolve_unbound_is_none() {
        let table = DispatchTable::new();
        assert_eq!(table.resolve("svg"), None);
        assert!(!table.is_registered("svg"));
    }

    #[test]
    fn test_bind_and_resolve_case_insensitive() {
        let table = DispatchTable::new();
        table.bind("SVG", "image");
        assert_eq!(table.resolve("svg").unwrap(), "image");
        assert_eq!(table.resolve(".Svg").unwrap(), "image");
    }

    #[test]
    fn test_install_and_dispose_restores_previous() {
        let table = DispatchTable::new();
        table.bind("svg", "image");

        let handle = table.install(["svg"], "diagram");
        assert_eq!(table.resolve("svg").unwrap(), "diagram");
        assert!(table.is_overridden("svg"));

        handle.dispose();
        assert_eq!(table.resolve("svg").unwrap(), "image");
        assert!(!table.is_overridden("svg"));
    }

    #[test]
    fn test_install_on_unbound_restores_to_unbound() {
        let table = DispatchTable::new();
        let handle = table.install(["x"], "R");
        assert_eq!(table.resolve("x").unwrap(), "R");
        handle.dispose();
        assert_eq!(table.resolve("x"), None);
        assert!(table.extensions().is_empty());
    }

    #[test]
    fn test_drop_disposes() {
        let table = DispatchTable::new();
        table.bind("svg", "image");
        {
            let _handle = table.install(["svg"], "diagram");
            assert_eq!(table.resolve("svg").unwrap(), "diagram");
        }
        assert_eq!(table.resolve("svg").unwrap(), "image");
    }

    #[test]
    fn test_release_is_idempotent() {
        let table = DispatchTable::new();
        table.bind("svg", "image");
        let mut handle = table.install(["svg"], "diagram");
        handle.release();
        assert!(handle.is_disposed());

        let later = table.install(["svg"], "other");
        handle.release();
        assert_eq!(table.resolve("svg").unwrap(), "other");
        later.dispose();
        assert_eq!(table.resolve("svg").unwrap(), "image");
    }

    #[test]
    fn test_empty_install_is_noop() {
        let table = DispatchTable::new();
        let seen = recording(&table);
        let handle = table.install(Vec::<String>::new(), "diagram");
        assert!(handle.is_disposed());
        assert!(handle.extensions().is_empty());
        handle.dispose();
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_install_normalizes_and_dedups() {
        let table = DispatchTable::new();
        let handle = table.install(["SVG", ".svg", "Drawio"], "diagram");
        assert_eq!(handle.extensions(), ["drawio", "svg"]);
        assert_eq!(table.override_depth("svg"), 1);
        handle.dispose();
    }

    #[test]
    fn test_reverse_order_disposal_restores_each_step() {
        let table = DispatchTable::new();
        table.bind("svg", "image");

        let first = table.install(["svg", "png"], "A");
        let second = table.install(["svg", "pdf"], "B");
        assert_eq!(table.resolve("svg").unwrap(), "B");
        assert_eq!(table.resolve("png").unwrap(), "A");
        assert_eq!(table.resolve("pdf").unwrap(), "B");

        second.dispose();
        assert_eq!(table.resolve("svg").unwrap(), "A");
        assert_eq!(table.resolve("pdf"), None);

        first.dispose();
        assert_eq!(table.resolve("svg").unwrap(), "image");
        assert_eq!(table.resolve("png"), None);
    }

    #[test]
    fn test_out_of_order_disposal_keeps_top_layer() {
        let table = DispatchTable::new();
        table.bind("svg", "image");

        let first = table.install(["svg"], "A");
        let second = table.install(["svg"], "B");

        first.dispose();
        assert_eq!(table.resolve("svg").unwrap(), "B");
        assert_eq!(table.override_depth("svg"), 1);

        second.dispose();
        assert_eq!(table.resolve("svg").unwrap(), "image");
    }

    #[test]
    fn test_bind_under_override_is_shadowed() {
        let table = DispatchTable::new();
        let handle = table.install(["svg"], "diagram");
        table.bind("svg", "image");
        assert_eq!(table.resolve("svg").unwrap(), "diagram");
        handle.dispose();
        assert_eq!(table.resolve("svg").unwrap(), "image");
    }

    #[test]
    fn test_unbind() {
        let table = DispatchTable::new();
        table.bind("md", "markdown");
        table.unbind("MD");
        assert_eq!(table.resolve("md"), None);
        table.unbind("never-bound");
    }

    #[test]
    fn test_extensions_snapshot_is_sorted() {
        let table = DispatchTable::new();
        table.bind("md", "markdown");
        table.bind("canvas", "canvas");
        let _handle = table.install(["svg"], "diagram");
        assert_eq!(table.extensions(), ["canvas", "md", "svg"]);
    }

    #[test]
    fn test_listeners_hear_install_and_restore() {
        let table = DispatchTable::new();
        table.bind("svg", "image");
        let seen = recording(&table);

        let handle = table.install(["svg"], "diagram");
        handle.dispose();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].kind, ChangeKind::Installed);
        assert_eq!(seen[0].previous.as_ref().unwrap(), "image");
        assert_eq!(seen[0].current.as_ref().unwrap(), "diagram");
        assert_eq!(seen[1].kind, ChangeKind::Restored);
        assert_eq!(seen[1].previous.as_ref().unwrap(), "diagram");
        assert_eq!(seen[1].current.as_ref().unwrap(), "image");
    }

    #[test]
    fn test_no_event_when_binding_does_not_move() {
        let table = DispatchTable::new();
        table.bind("svg", "diagram");
        let seen = recording(&table);

        let handle = table.install(["svg"], "diagram");
        handle.dispose();
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let table = DispatchTable::new();
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let id = table.subscribe(move |_| *sink.lock() += 1);

        table.bind("a", "x");
        assert!(table.unsubscribe(id));
        assert!(!table.unsubscribe(id));
        table.bind("a", "y");
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn test_listener_may_reenter_table() {
        let table = DispatchTable::new();
        let inner = table.clone();
        let pending: Arc<Mutex<Vec<DisposeHandle>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&pending);
        table.subscribe(move |change| {
            if change.extension == "svg" && change.kind == ChangeKind::Installed {
                sink.lock().push(inner.install(["png"], "follow"));
            }
        });

        let handle = table.install(["svg"], "diagram");
        assert_eq!(table.resolve("png").unwrap(), "follow");

        handle.dispose();
        pending.lock().clear();
        assert_eq!(table.resolve("png"), None);
    }

    #[test]
    fn test_older_handle_disposed_during_newer_install() {
        let table = DispatchTable::new();
        table.bind("svg", "image");
        let older: Arc<Mutex<Option<DisposeHandle>>> =
            Arc::new(Mutex::new(Some(table.install(["svg"], "A"))));
        let slot = Arc::clone(&older);
        table.subscribe(move |change| {
            let is_b = change.current.as_ref().is_some_and(|id| id == "B");
            if change.kind == ChangeKind::Installed && is_b {
                if let Some(handle) = slot.lock().take() {
                    handle.dispose();
                }
            }
        });

        let newer = table.install(["svg"], "B");
        assert!(older.lock().is_none());
        assert_eq!(table.resolve("svg").unwrap(), "B");
        assert_eq!(table.override_depth("svg"), 1);

        newer.dispose();
        assert_eq!(table.resolve("svg").unwrap(), "image");
        assert_eq!(table.override_depth("svg"), 0);
    }

    #[test]
    fn test_handle_outliving_table_is_harmless() {
        let handle = {
            let table = DispatchTable::new();
            table.install(["svg"], "diagram")
        };
        handle.dispose();
    }

    #[test]
    fn test_global_is_shared() {
        let a = DispatchTable::global();
        let b = DispatchTable::global();
        assert!(Arc::ptr_eq(&a.state, &b.state));
    }
}
