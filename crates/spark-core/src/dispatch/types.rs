//! Value types shared by the dispatch table and its listeners.

use std::borrow::Borrow;
use std::fmt;

/// Name of the view or handler a host uses to display a file.
///
/// The enum-free string form mirrors how hosts key their view registries;
/// any string is a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RendererId(String);

impl RendererId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RendererId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RendererId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&RendererId> for RendererId {
    fn from(id: &RendererId) -> Self {
        id.clone()
    }
}

impl Borrow<str> for RendererId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for RendererId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RendererId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Canonical key for an extension: lowercase, without a leading dot.
///
/// ```
/// use spark_core::dispatch::normalize_extension;
///
/// assert_eq!(normalize_extension(".SVG"), "svg");
/// assert_eq!(normalize_extension("Md"), "md");
/// ```
pub fn normalize_extension(extension: &str) -> String {
    extension
        .strip_prefix('.')
        .unwrap_or(extension)
        .to_lowercase()
}

/// What caused a [`DispatchChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// An override layer was installed on top.
    Installed,
    /// An override layer was disposed and the one beneath became visible.
    Restored,
    /// The host bound its own renderer underneath the overrides.
    Bound,
    /// The host removed its own renderer.
    Unbound,
}

/// Notification that the renderer resolved for an extension changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchChange {
    pub extension: String,
    pub previous: Option<RendererId>,
    pub current: Option<RendererId>,
    pub kind: ChangeKind,
}

/// Handle returned by [`DispatchTable::subscribe`](super::DispatchTable::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);
