//! Model store layout and manifest tree traversal for modelink.
//!
//! The model store is an external, read-only input: a `manifests/` tree of
//! namespace/model/tag documents and a flat `blobs/` directory of
//! content-addressed files. This crate knows where those live
//! (`StoreLayout`) and how to enumerate manifest leaves (`walk_manifests`).
//! Blob bytes are never opened, only referenced by path.

pub mod layout;
pub mod walker;

pub use layout::StoreLayout;
pub use walker::{walk_manifests, ManifestRecord};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest root does not exist: {0}")]
    ManifestRootMissing(PathBuf),
}
