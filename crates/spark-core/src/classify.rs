//! Diagram content sniffing.
//!
//! Some files (most commonly `.svg` exports) may or may not carry an editable
//! diagram. [`DiagramClassifier`] looks at the document text and answers that
//! question without rendering anything:
//!
//! 1. Malformed markup is never a diagram.
//! 2. A root element named `mxfile`, `mxgraph` or `mxgraphmodel` (any case)
//!    is a diagram.
//! 3. An `svg` root carrying a `content` attribute is unwrapped: the
//!    attribute text is classified as if it were the whole document.
//!
//! Unwrapping stops after [`DEFAULT_MAX_EMBED_DEPTH`] levels; anything nested
//! deeper is treated as "not a diagram".

use std::borrow::Cow;

use crate::parsers::markup::parse_root;

/// Root tags recognized as native diagram documents (compared lowercase).
pub const DIAGRAM_ROOT_TAGS: &[&str] = &["mxfile", "mxgraph", "mxgraphmodel"];

/// Vector-image container that may embed a diagram.
pub const VECTOR_CONTAINER_TAG: &str = "svg";

/// Attribute of the container holding the embedded document.
pub const EMBEDDED_PAYLOAD_ATTRIBUTE: &str = "content";

/// Default bound on nested `svg` → payload unwrapping.
pub const DEFAULT_MAX_EMBED_DEPTH: usize = 8;

/// Decides whether document text is a diagram.
///
/// Stateless apart from the depth bound; every call inspects the content it
/// is given, so results are never stale when a file changes on disk.
///
/// ```
/// use spark_core::DiagramClassifier;
///
/// let classifier = DiagramClassifier::new();
/// assert!(classifier.classify("<mxfile></mxfile>"));
/// assert!(!classifier.classify("<svg></svg>"));
/// assert!(!classifier.classify("not xml at all"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagramClassifier {
    max_depth: usize,
}

impl DiagramClassifier {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_EMBED_DEPTH)
    }

    /// Classifier that unwraps at most `max_depth` embedded payloads.
    ///
    /// A bound of zero only accepts documents whose own root is a diagram.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Classify `content`. Never fails; anything unrecognized is `false`.
    pub fn classify(&self, content: &str) -> bool {
        let mut current: Cow<'_, str> = Cow::Borrowed(content);

        for level in 0..=self.max_depth {
            let root = match parse_root(&current) {
                Ok(root) => root,
                Err(e) => {
                    tracing::trace!(level, error = %e, "content is not well-formed markup");
                    return false;
                }
            };

            let tag = root.name.to_lowercase();
            if DIAGRAM_ROOT_TAGS.contains(&tag.as_str()) {
                return true;
            }
            if tag != VECTOR_CONTAINER_TAG {
                return false;
            }

            let Some(payload) = root.attribute(EMBEDDED_PAYLOAD_ATTRIBUTE) else {
                return false;
            };
            if level == self.max_depth {
                tracing::debug!(
                    max_depth = self.max_depth,
                    "embedded diagram payload nested too deeply"
                );
                return false;
            }
            match decode_payload(payload) {
                Some(next) => current = Cow::Owned(next),
                None => return false,
            }
        }

        false
    }
}

impl Default for DiagramClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify with the default depth bound.
pub fn classify_diagram(content: &str) -> bool {
    DiagramClassifier::new().classify(content)
}

/// Turn an attribute payload into document text.
///
/// Entity references were already resolved by the markup parser. Payloads
/// that are still percent-encoded (`%3Cmxfile%3E...`) get one more decoding
/// pass; invalid UTF-8 after decoding yields `None`.
fn decode_payload(payload: &str) -> Option<String> {
    let trimmed = payload.trim_start();
    let percent_encoded = trimmed
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("%3C"));
    if !percent_encoded {
        return Some(payload.to_string());
    }
    match urlencoding::decode(trimmed) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(e) => {
            tracing::trace!(error = %e, "percent-encoded payload is not UTF-8");
            None
        }
    }
}
