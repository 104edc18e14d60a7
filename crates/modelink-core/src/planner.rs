use crate::platform::PlatformPolicy;
use crate::LinkKind;
use modelink_remote::IdentityRecord;
use modelink_schema::{Digest, ManifestEntry};
use modelink_store::StoreLayout;
use std::path::{Path, PathBuf};

/// File extension for flat model links.
const LINK_EXTENSION: &str = "gguf";

/// Destination naming scheme for the target tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Flat digest-derived names, no registry involved.
    Plain,
    /// Flat names, preferring `{author}-{filename}` when an identity
    /// resolved.
    IdentityFlat,
    /// `{repo_id}/{filename}` directories grouped by resolved identity.
    IdentityTree,
}

/// A single planned link: where it points and what kind of link to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPlan {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: LinkKind,
}

/// Compute the link plan for one resolved model layer.
///
/// The source is always `{blobs}/{digest}` with the platform's digest
/// separator. The destination depends on the mode and on whether an identity
/// was resolved; unresolved entries in identity modes fall back to names
/// synthesized from the manifest entry.
pub fn plan_link(
    entry: &ManifestEntry,
    digest: &Digest,
    identity: Option<&IdentityRecord>,
    mode: LinkMode,
    layout: &StoreLayout,
    target_root: &Path,
    policy: PlatformPolicy,
) -> LinkPlan {
    let source = layout.blob_path(digest, policy.digest_separator);
    let resolved = identity.filter(|record| record.is_resolved());

    let destination = match (mode, resolved) {
        (LinkMode::Plain, _) | (LinkMode::IdentityFlat, None) => target_root.join(flat_name(entry)),
        (LinkMode::IdentityFlat, Some(record)) => match (&record.author, &record.filename) {
            (Some(author), Some(filename)) => target_root.join(format!("{author}-{filename}")),
            _ => target_root.join(flat_name(entry)),
        },
        (LinkMode::IdentityTree, Some(record)) => {
            match (&record.repo_id, &record.filename) {
                (Some(repo_id), Some(filename)) => target_root.join(repo_id).join(filename),
                _ => synthesized_tree_path(target_root, entry),
            }
        }
        (LinkMode::IdentityTree, None) => synthesized_tree_path(target_root, entry),
    };

    LinkPlan {
        source,
        destination,
        kind: policy.link_kind,
    }
}

/// `{model}-{tag}.gguf` in the default public namespace, prefixed with the
/// namespace everywhere else.
fn flat_name(entry: &ManifestEntry) -> String {
    if entry.is_default_namespace() {
        format!("{}-{}.{LINK_EXTENSION}", entry.model, entry.tag)
    } else {
        format!(
            "{}-{}-{}.{LINK_EXTENSION}",
            entry.namespace, entry.model, entry.tag
        )
    }
}

/// Tree-mode fallback when no identity resolved: a `{namespace}/{model}`
/// group directory holding one file per tag.
fn synthesized_tree_path(target_root: &Path, entry: &ManifestEntry) -> PathBuf {
    target_root
        .join(&entry.namespace)
        .join(&entry.model)
        .join(format!("{}.{LINK_EXTENSION}", entry.tag))
}
