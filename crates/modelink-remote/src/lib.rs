//! External identity registry client, identity cache, and resolver.
//!
//! This crate gives content digests a human-readable name: it queries a
//! registry's search endpoint for candidate repositories, scans their file
//! trees for an entry whose content hash matches the digest, and remembers
//! outcomes in a JSON cache file so a digest is looked up over the network
//! at most once. The registry is consumed read-only through the
//! [`IdentityRegistry`] trait; the whole crate is optional from the engine's
//! point of view (plain digest-based naming needs none of it).

pub mod cache;
pub mod config;
pub mod hub;
pub mod resolver;

pub use cache::{IdentityCache, IdentityRecord, CACHE_FILE_NAME};
pub use config::RegistryConfig;
pub use hub::HubClient;
pub use resolver::Resolver;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("registry I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("identity cache is corrupt: {0}")]
    CacheCorrupt(String),
    #[error("registry config error: {0}")]
    Config(String),
}

/// Summary of a candidate repository returned by the registry's search
/// endpoint, ranked by descending popularity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSummary {
    pub id: String,
    pub author: Option<String>,
    pub likes: u64,
    pub downloads: u64,
}

/// One entry of a repository file tree. `content_hash` is present only for
/// content-addressed files; other entries can never match a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub content_hash: Option<String>,
}

/// Read-only contract against the external identity registry.
///
/// A trait seam so the resolver can be exercised against an in-process
/// double that counts calls.
pub trait IdentityRegistry {
    /// Search repositories matching a query, ranked by descending popularity.
    fn search(&self, query: &str) -> Result<Vec<RepoSummary>, RemoteError>;

    /// List the file tree of a repository.
    fn list_tree(&self, repo_id: &str) -> Result<Vec<TreeEntry>, RemoteError>;
}
