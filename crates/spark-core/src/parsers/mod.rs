//! Parsers for untrusted document and configuration text

pub mod markup;

pub use markup::{MarkupError, RootElement, parse_root};
