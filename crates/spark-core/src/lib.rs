//! # spark-core
//!
//! Core of a document-workspace extension that:
//! - Redirects file extensions to other renderers, reversibly
//!   ([`DispatchTable`], [`DisposeHandle`])
//! - Recognizes diagram documents by content, including diagrams embedded in
//!   `<svg content="...">` exports ([`DiagramClassifier`])
//! - Orders navigation tree siblings by a user-edited `name:rank` list
//!   ([`CustomOrder`])
//!
//! The [`Workspace`] facade wires these to a [`FileSource`] and a
//! [`RendererRegistry`].

pub mod classify;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fs;
pub mod order;
pub mod parsers;
pub mod pipeline;
pub mod registry;
pub mod renderer;

pub use classify::{DEFAULT_MAX_EMBED_DEPTH, DiagramClassifier, classify_diagram};
pub use config::{ConfigError, ConfigWarning, SparkConfig, SparkConfigBuilder};
pub use dispatch::{ChangeKind, DispatchChange, DispatchTable, DisposeHandle, ListenerId, RendererId};
pub use error::{SparkError, SparkResult};
pub use fs::{FileSource, MemoryFileSource, RealFileSource};
pub use order::{
    CustomOrder, DEFAULT_RANK, NamedEntry, Ranking, SiblingEntry, build_ranking, compare,
    custom_order_applies, sort_children, sort_entries,
};
pub use pipeline::Workspace;
pub use registry::{RendererProvider, RendererRegistry, RendererRegistryBuilder};
pub use renderer::{
    DIAGRAM_EXTENSIONS, DIAGRAM_RENDERER_ID, DiagramRenderer, FnRenderer, NATIVE_RENDERER_ID,
    NativeRenderer, RenderOutput, RenderRequest, Renderer,
};
