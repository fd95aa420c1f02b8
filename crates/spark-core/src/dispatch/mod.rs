//! Reversible extension → renderer dispatch.
//!
//! This module provides:
//!
//! - [`DispatchTable`] -- the extension map, with stacked overrides
//! - [`DisposeHandle`] -- undoes one override installation
//! - [`DispatchChange`] -- what listeners receive when a binding moves
//!
//! Overrides never replace the host's own binding; they sit above it and
//! are removed again when their handle is disposed.

mod table;
mod types;

pub use table::{DispatchTable, DisposeHandle};
pub use types::{ChangeKind, DispatchChange, ListenerId, RendererId, normalize_extension};
