//! Link planning, reconciliation, and sync orchestration for modelink.
//!
//! The [`Engine`] drives a full run: walk the manifest tree, parse each
//! manifest, validate layer digests, optionally resolve identities against
//! the external registry, plan one link per model layer, then reconcile the
//! target directory to exactly match the planned state. Everything is
//! single-threaded and sequential; the identity cache is the only shared
//! mutable resource and is persisted once at the end of a run.

pub mod engine;
pub mod lock;
pub mod planner;
pub mod platform;
pub mod reconciler;

pub use engine::{Engine, SyncOptions, SyncReport};
pub use lock::TargetLock;
pub use planner::{plan_link, LinkMode, LinkPlan};
pub use platform::{LinkKind, PlatformPolicy};
pub use reconciler::{clean, recreate, CleanReport, LinkReport};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] modelink_store::StoreError),
    #[error(transparent)]
    Remote(#[from] modelink_remote::RemoteError),
    #[error("failed to lock target directory: {0}")]
    LockFailed(String),
}
