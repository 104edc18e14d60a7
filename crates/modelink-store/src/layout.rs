use modelink_schema::Digest;
use std::path::{Path, PathBuf};

/// Registry host directory under `manifests/` in the default store layout.
const DEFAULT_REGISTRY: &str = "registry.ollama.ai";

/// Directory layout of a content-addressed model store.
///
/// Read-only from modelink's point of view: nothing here creates or mutates
/// store directories.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root of the namespace/model/tag manifest tree.
    #[inline]
    pub fn manifests_dir(&self) -> PathBuf {
        self.root.join("manifests").join(DEFAULT_REGISTRY)
    }

    #[inline]
    pub fn blobs_dir(&self) -> PathBuf {
        self.root.join("blobs")
    }

    /// Path of the blob a digest resolves to, using the platform's digest
    /// separator for the file name.
    pub fn blob_path(&self, digest: &Digest, separator: char) -> PathBuf {
        self.blobs_dir().join(digest.blob_file_name(separator))
    }
}
