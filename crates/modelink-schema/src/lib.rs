//! Digest validation, manifest parsing, and entry types for modelink.
//!
//! This crate defines the schema layer: content digest parsing and
//! well-formedness checks (`Digest`, `is_valid_hash`), JSON manifest
//! decoding (`ModelManifest`, `LayerDescriptor`), and the namespace/model/tag
//! triple derived from a manifest's location (`ManifestEntry`).

pub mod digest;
pub mod entry;
pub mod manifest;

pub use digest::{is_valid_hash, Digest, DigestError};
pub use entry::{normalize_namespace, ManifestEntry, DEFAULT_NAMESPACE};
pub use manifest::{
    parse_manifest_file, parse_manifest_str, LayerDescriptor, ManifestError, ModelManifest,
    MODEL_MEDIA_TYPE,
};
