use serde::{Deserialize, Serialize};
use std::fmt;

/// The default public namespace. Flat link names omit it.
pub const DEFAULT_NAMESPACE: &str = "library";

/// Registry host directory name that some store layouts surface as a
/// namespace segment; displayed under its canonical short name instead.
const REGISTRY_HOST: &str = "registry.ollama.ai";
const REGISTRY_DISPLAY: &str = "ollama";

/// Map a raw namespace path segment to its display form.
pub fn normalize_namespace(namespace: &str) -> String {
    namespace.replace(REGISTRY_HOST, REGISTRY_DISPLAY)
}

/// A named model version: the three path segments under the manifest root.
///
/// Immutable once constructed; the namespace is normalized at construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    pub namespace: String,
    pub model: String,
    pub tag: String,
}

impl ManifestEntry {
    pub fn new(
        namespace: impl AsRef<str>,
        model: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            namespace: normalize_namespace(namespace.as_ref()),
            model: model.into(),
            tag: tag.into(),
        }
    }

    /// True for the canonical public namespace, whose flat link names drop
    /// the namespace prefix.
    pub fn is_default_namespace(&self) -> bool {
        self.namespace == DEFAULT_NAMESPACE
    }
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.namespace, self.model, self.tag)
    }
}
